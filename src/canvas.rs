//! Paints the blueprint and its room overlay, and routes pointer input to selection, editing
//! and pan/zoom.

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Sense, Stroke, Ui};

use crate::editor::{handles, hit_target, Editor};
use crate::flow::WizardController;
use crate::geometry::{Point, TextAnchor};
use crate::mapper::Size;
use crate::overlay::{build_scene, LabelKind, OverlayScene, ShapePrimitive};
use crate::preview::PreviewCache;
use crate::room::RoomId;

const HANDLE_RADIUS: f32 = 5.0;
const HANDLE_TOLERANCE: f32 = 9.0;

#[derive(Default)]
pub struct CanvasState {
    pub editor: Editor,
    pub edit_mode: bool,
}

fn to_pos(origin: Pos2, p: Point) -> Pos2 {
    egui::pos2(origin.x + p.x, origin.y + p.y)
}

fn align(anchor: TextAnchor) -> Align2 {
    match anchor {
        TextAnchor::Start => Align2::LEFT_CENTER,
        TextAnchor::Middle => Align2::CENTER_CENTER,
        TextAnchor::End => Align2::RIGHT_CENTER,
    }
}

/// Largest rect with the reference aspect ratio that fits `available`, centred horizontally.
fn fit(available: egui::Rect, reference: Size) -> egui::Rect {
    let scale = (available.width() / reference.width).min(available.height() / reference.height);
    let size = egui::vec2(reference.width * scale, reference.height * scale);
    egui::Rect::from_min_size(
        egui::pos2(available.center().x - size.x / 2.0, available.top()),
        size,
    )
}

fn paint_scene(painter: &egui::Painter, origin: Pos2, scene: &OverlayScene) {
    for item in &scene.shapes {
        let stroke = Stroke::new(item.stroke_width.max(0.5), item.stroke);
        match &item.shape {
            ShapePrimitive::Rect { min, max } => {
                let rect = egui::Rect::from_two_pos(to_pos(origin, *min), to_pos(origin, *max));
                painter.rect(rect, 0.0, item.fill, stroke);
            }
            ShapePrimitive::Circle { center, radius } => {
                painter.circle(to_pos(origin, *center), *radius, item.fill, stroke);
            }
            ShapePrimitive::Polygon { points } => {
                let points = points.iter().map(|p| to_pos(origin, *p)).collect();
                // egui tessellates fills as convex; concave outlines still stroke correctly.
                painter.add(egui::Shape::convex_polygon(points, item.fill, stroke));
            }
        }
    }
    for label in &scene.labels {
        let color = match label.kind {
            LabelKind::Name => Color32::from_rgb(17, 24, 39),
            LabelKind::Area => Color32::from_rgb(55, 65, 81),
            LabelKind::Wall => Color32::from_rgb(185, 28, 28),
        };
        painter.text(
            to_pos(origin, label.pos),
            align(label.anchor),
            &label.text,
            FontId::proportional(label.size.max(7.0)),
            color,
        );
    }
}

/// Shows the canvas. Returns the newly selected room when the selection changed here.
pub fn show(
    ui: &mut Ui,
    wizard: &mut WizardController,
    preview: &PreviewCache,
    state: &mut CanvasState,
) -> Option<Option<RoomId>> {
    let desired = egui::vec2(ui.available_width(), ui.available_height().max(240.0));
    let (resp, painter) = ui.allocate_painter(desired, Sense::click_and_drag());
    let painter = painter.with_clip_rect(resp.rect);
    painter.rect_filled(resp.rect, 10.0, Color32::from_rgba_unmultiplied(255, 255, 255, 16));

    let reference = wizard.mapper().reference();
    let frame = fit(resp.rect.shrink(8.0), reference);
    wizard.set_display_size(Size::new(frame.width(), frame.height()));
    let origin = frame.min;
    let mapper = *wizard.mapper();
    let view = *wizard.view();

    let scene = build_scene(
        wizard.registry(),
        &mapper,
        &view,
        wizard.highlight(),
        &wizard.config().overlay,
    );
    let image_rect = egui::Rect::from_two_pos(
        to_pos(origin, mapper.to_screen(Point::new(0.0, 0.0), &view)),
        to_pos(origin, mapper.to_screen(Point::new(reference.width, reference.height), &view)),
    );
    match preview.texture() {
        Some(texture) => {
            let tint = if scene.desaturate_image {
                Color32::from_gray(150)
            } else {
                Color32::WHITE
            };
            painter.image(
                texture.id(),
                image_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                tint,
            );
        }
        None => {
            painter.rect_filled(image_rect, 0.0, Color32::from_gray(245));
            let message = preview.error().unwrap_or("Preview unavailable");
            painter.text(
                image_rect.center(),
                Align2::CENTER_CENTER,
                message,
                FontId::proportional(14.0),
                Color32::from_gray(90),
            );
        }
    }
    paint_scene(&painter, origin, &scene);

    if state.edit_mode {
        if let Some(room) = wizard.registry().selected_room() {
            for (_, p) in handles(room) {
                let at = to_pos(origin, mapper.to_screen(p, &view));
                painter.circle(at, HANDLE_RADIUS, Color32::WHITE, Stroke::new(1.5, Color32::from_rgb(37, 99, 235)));
            }
        }
    }

    let before = wizard.registry().selected();
    let to_reference = |pos: Pos2| mapper.to_reference(Point::new(pos.x - origin.x, pos.y - origin.y), &view);
    let tolerance = HANDLE_TOLERANCE / mapper.length_to_display(view.scale).max(f32::EPSILON);

    if resp.drag_started() {
        if let Some(pos) = resp.interact_pointer_pos() {
            let target = state
                .edit_mode
                .then(|| hit_target(wizard.registry(), to_reference(pos), tolerance))
                .flatten();
            if let Some(target) = target {
                wizard.record_edit();
                state
                    .editor
                    .pointer_down(target, to_reference(pos), wizard.registry_mut());
            }
        }
    }
    if resp.dragged() {
        if state.editor.is_dragging() {
            if let Some(pos) = resp.interact_pointer_pos() {
                state.editor.pointer_move(to_reference(pos), wizard.registry_mut());
            }
        } else {
            let delta = resp.drag_delta();
            wizard.pan_by_screen(delta.x, delta.y);
        }
    }
    if resp.drag_stopped() {
        state.editor.pointer_up();
    }

    if resp.clicked() {
        if let Some(pos) = resp.interact_pointer_pos() {
            match wizard.registry().hit_test(to_reference(pos)) {
                Some(id) if state.edit_mode => wizard.registry_mut().select(Some(id)),
                Some(id) => wizard.registry_mut().toggle_select(id),
                None => wizard.registry_mut().select(None),
            }
        }
    }

    if resp.hovered() {
        let scroll = ui.input(|i| i.raw_scroll_delta.y);
        if scroll > 0.0 {
            wizard.zoom_in();
        } else if scroll < 0.0 {
            wizard.zoom_out();
        }
    }

    let after = wizard.registry().selected();
    (after != before).then_some(after)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_keeps_aspect_ratio() {
        let available = egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(1000.0, 400.0));
        let rect = fit(available, Size::new(1024.0, 1024.0));
        assert_eq!(rect.width(), 400.0);
        assert_eq!(rect.height(), 400.0);
        assert_eq!(rect.center().x, 500.0);
    }

    #[test]
    fn anchors_map_to_alignment() {
        assert_eq!(align(TextAnchor::Start), Align2::LEFT_CENTER);
        assert_eq!(align(TextAnchor::End), Align2::RIGHT_CENTER);
    }
}
