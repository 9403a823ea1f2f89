//! Builds the drawable overlay for the registry. Painting happens in `canvas`; this module
//! only decides what goes where, so it can be checked without a UI context.

use egui::Color32;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::geometry::{centroid, wall_label_anchor, Geometry, Point, TextAnchor};
use crate::mapper::{CoordinateMapper, ViewTransform};
use crate::registry::RoomRegistry;
use crate::room::{RoomId, SpaceCategory};

pub fn category_color(category: SpaceCategory) -> Color32 {
    match category {
        SpaceCategory::PfsaSpace => Color32::from_rgb(59, 130, 246),
        SpaceCategory::NonQualifiedSpace => Color32::from_rgb(16, 185, 129),
        SpaceCategory::CommonSpace => Color32::from_rgb(245, 158, 11),
        SpaceCategory::SharedSpace => Color32::from_rgb(139, 92, 246),
        SpaceCategory::Unknown => Color32::from_rgb(156, 163, 175),
    }
}

fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

/// `10000.0` → `"10,000"`.
pub fn format_thousands(value: f32) -> String {
    let n = value.round() as i64;
    let digits = n.unsigned_abs().to_string();
    let grouped = digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(String::from_utf8_lossy)
        .join(",");
    if n < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// User-tunable paint settings. Stroke widths are fractions of the reference width.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayPaint {
    pub fill_opacity: f32,
    pub selected_fill_opacity: f32,
    pub dimmed_fill_opacity: f32,
    pub stroke_ratio: f32,
    pub selected_stroke_ratio: f32,
}

impl Default for OverlayPaint {
    fn default() -> Self {
        Self {
            fill_opacity: 0.5,
            selected_fill_opacity: 0.8,
            dimmed_fill_opacity: 0.1,
            stroke_ratio: 0.001,
            selected_stroke_ratio: 0.005,
        }
    }
}

impl OverlayPaint {
    pub fn opacities_valid(&self) -> bool {
        [
            self.fill_opacity,
            self.selected_fill_opacity,
            self.dimmed_fill_opacity,
        ]
        .iter()
        .all(|o| (0.0..=1.0).contains(o))
            && self.stroke_ratio >= 0.0
            && self.selected_stroke_ratio >= 0.0
    }
}

/// Sizes derived from the reference width, expressed in reference units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayStyle {
    pub room_font: f32,
    pub wall_font: f32,
    pub label_offset: f32,
    pub stroke: f32,
    pub selected_stroke: f32,
    pub fill_opacity: f32,
    pub selected_fill_opacity: f32,
    pub dimmed_fill_opacity: f32,
}

impl OverlayStyle {
    pub fn new(width: f32, paint: &OverlayPaint) -> Self {
        Self {
            room_font: width * 0.018,
            wall_font: width * 0.012,
            label_offset: width * 0.01,
            stroke: width * paint.stroke_ratio,
            selected_stroke: width * paint.selected_stroke_ratio,
            fill_opacity: paint.fill_opacity,
            selected_fill_opacity: paint.selected_fill_opacity,
            dimmed_fill_opacity: paint.dimmed_fill_opacity,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ShapePrimitive {
    Rect { min: Point, max: Point },
    Circle { center: Point, radius: f32 },
    Polygon { points: Vec<Point> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ShapeItem {
    pub room: RoomId,
    pub shape: ShapePrimitive,
    pub fill: Color32,
    pub stroke: Color32,
    pub stroke_width: f32,
    pub selected: bool,
    pub dimmed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelKind {
    Name,
    Area,
    Wall,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabelItem {
    pub room: RoomId,
    pub kind: LabelKind,
    pub pos: Point,
    pub text: String,
    pub size: f32,
    pub anchor: TextAnchor,
}

/// Screen-local primitives (relative to the image's top-left corner).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayScene {
    pub shapes: Vec<ShapeItem>,
    pub labels: Vec<LabelItem>,
    pub desaturate_image: bool,
    pub skipped: usize,
}

pub fn build_scene(
    registry: &RoomRegistry,
    mapper: &CoordinateMapper,
    view: &ViewTransform,
    highlight: Option<SpaceCategory>,
    paint: &OverlayPaint,
) -> OverlayScene {
    let style = OverlayStyle::new(mapper.reference().width, paint);
    let zoom = mapper.length_to_display(view.scale);
    let screen = |p: Point| mapper.to_screen(p, view);
    let selected = registry.selected();

    let mut scene = OverlayScene {
        desaturate_image: highlight.is_some(),
        ..OverlayScene::default()
    };

    for room in registry.rooms() {
        if !room.geometry.is_renderable() {
            tracing::warn!(room = %room.id, name = %room.name, "skipping room with unusable geometry");
            scene.skipped += 1;
            continue;
        }

        let is_selected = selected == Some(room.id);
        let in_filter = highlight.map_or(true, |cat| cat == room.category);
        let opacity = match (in_filter, is_selected) {
            (false, _) => style.dimmed_fill_opacity,
            (true, true) => style.selected_fill_opacity,
            (true, false) => style.fill_opacity,
        };
        let stroke = if is_selected {
            Color32::WHITE
        } else if in_filter {
            Color32::from_rgb(0x33, 0x33, 0x33)
        } else {
            Color32::from_rgb(0x99, 0x99, 0x99)
        };
        let stroke_width = if is_selected {
            style.selected_stroke
        } else {
            style.stroke
        } * zoom;

        let shape = match &room.geometry {
            Geometry::Rect { x, y, w, h } => ShapePrimitive::Rect {
                min: screen(Point::new(*x, *y)),
                max: screen(Point::new(x + w, y + h)),
            },
            Geometry::Circle { cx, cy, r } => ShapePrimitive::Circle {
                center: screen(Point::new(*cx, *cy)),
                radius: r * zoom,
            },
            Geometry::Polygon { points } => ShapePrimitive::Polygon {
                points: points.iter().map(|p| screen(*p)).collect(),
            },
        };

        scene.shapes.push(ShapeItem {
            room: room.id,
            shape,
            fill: with_opacity(category_color(room.category), opacity),
            stroke,
            stroke_width,
            selected: is_selected,
            dimmed: !in_filter,
        });

        if !in_filter {
            continue;
        }

        let center = centroid(&room.geometry);
        scene.labels.push(LabelItem {
            room: room.id,
            kind: LabelKind::Name,
            pos: screen(center.offset(0.0, -style.room_font * 0.8)),
            text: room.name.clone(),
            size: style.room_font * zoom,
            anchor: TextAnchor::Middle,
        });
        if let Some(area) = room.calculated_area {
            scene.labels.push(LabelItem {
                room: room.id,
                kind: LabelKind::Area,
                pos: screen(center.offset(0.0, style.room_font * 0.5)),
                text: format!("{} ft²", format_thousands(area)),
                size: style.room_font * 0.8 * zoom,
                anchor: TextAnchor::Middle,
            });
        }
        for wall in &room.walls {
            let Some(anchor) = wall_label_anchor(room, wall, style.label_offset) else {
                continue;
            };
            scene.labels.push(LabelItem {
                room: room.id,
                kind: LabelKind::Wall,
                pos: screen(Point::new(anchor.x, anchor.y)),
                text: format!("{}'", wall.length),
                size: style.wall_font * zoom,
                anchor: anchor.anchor,
            });
        }
    }

    scene
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::{Coords, RoomRecord, Wall};

    fn registry() -> RoomRegistry {
        let office = RoomRecord {
            name: Some("Office".to_string()),
            category: Some("PFSA Space".to_string()),
            shape_type: Some("rect".to_string()),
            coords: Some(Coords {
                x: Some(100.0),
                y: Some(100.0),
                w: Some(200.0),
                h: Some(100.0),
                ..Coords::default()
            }),
            walls: vec![
                Wall {
                    sequence_order: 1,
                    length: 40.0,
                    unit: "ft".to_string(),
                },
                Wall {
                    sequence_order: 2,
                    length: 20.0,
                    unit: "ft".to_string(),
                },
            ],
            calculated_area: Some(1200.0),
            ..RoomRecord::default()
        };
        let lounge = RoomRecord {
            name: Some("Lounge".to_string()),
            category: Some("Common Space".to_string()),
            shape_type: Some("circle".to_string()),
            coords: Some(Coords {
                cx: Some(600.0),
                cy: Some(600.0),
                r: Some(50.0),
                ..Coords::default()
            }),
            ..RoomRecord::default()
        };
        RoomRegistry::from_records(vec![office, lounge], 4.5)
    }

    #[test]
    fn every_room_gets_shape_and_labels() {
        let reg = registry();
        let scene = build_scene(
            &reg,
            &CoordinateMapper::default(),
            &ViewTransform::default(),
            None,
            &OverlayPaint::default(),
        );
        assert_eq!(scene.shapes.len(), 2);
        assert!(!scene.desaturate_image);
        let office_labels: Vec<_> = scene
            .labels
            .iter()
            .filter(|l| l.room == reg.rooms()[0].id)
            .map(|l| (l.kind, l.text.as_str()))
            .collect();
        assert_eq!(
            office_labels,
            vec![
                (LabelKind::Name, "Office"),
                (LabelKind::Area, "1,200 ft²"),
                (LabelKind::Wall, "40'"),
                (LabelKind::Wall, "20'"),
            ]
        );
        // lounge has no area
        assert!(!scene
            .labels
            .iter()
            .any(|l| l.room == reg.rooms()[1].id && l.kind == LabelKind::Area));
    }

    #[test]
    fn highlight_dims_and_hides_labels_outside_category() {
        let reg = registry();
        let scene = build_scene(
            &reg,
            &CoordinateMapper::default(),
            &ViewTransform::default(),
            Some(SpaceCategory::CommonSpace),
            &OverlayPaint::default(),
        );
        assert!(scene.desaturate_image);
        let office = &scene.shapes[0];
        assert!(office.dimmed);
        assert_eq!(office.fill.a(), 26);
        assert!(scene.labels.iter().all(|l| l.room == reg.rooms()[1].id));
    }

    #[test]
    fn selection_raises_opacity_and_stroke() {
        let mut reg = registry();
        let id = reg.rooms()[1].id;
        reg.select(Some(id));
        let scene = build_scene(
            &reg,
            &CoordinateMapper::default(),
            &ViewTransform::default(),
            None,
            &OverlayPaint::default(),
        );
        let lounge = &scene.shapes[1];
        assert!(lounge.selected);
        assert_eq!(lounge.stroke, Color32::WHITE);
        assert_eq!(lounge.fill.a(), 204);
        assert!(lounge.stroke_width > scene.shapes[0].stroke_width);
    }

    #[test]
    fn paint_settings_drive_fill_and_stroke() {
        let reg = registry();
        let paint = OverlayPaint {
            fill_opacity: 1.0,
            stroke_ratio: 0.0,
            ..OverlayPaint::default()
        };
        let scene = build_scene(
            &reg,
            &CoordinateMapper::default(),
            &ViewTransform::default(),
            None,
            &paint,
        );
        assert_eq!(scene.shapes[0].fill.a(), 255);
        assert_eq!(scene.shapes[0].stroke_width, 0.0);
        assert!(paint.opacities_valid());
        assert!(!OverlayPaint {
            dimmed_fill_opacity: 1.5,
            ..OverlayPaint::default()
        }
        .opacities_valid());
    }

    #[test]
    fn view_transform_moves_shapes_not_geometry() {
        let reg = registry();
        let view = ViewTransform {
            x: 10.0,
            y: 0.0,
            scale: 2.0,
        };
        let scene = build_scene(
            &reg,
            &CoordinateMapper::default(),
            &view,
            None,
            &OverlayPaint::default(),
        );
        assert_eq!(
            scene.shapes[0].shape,
            ShapePrimitive::Rect {
                min: Point::new(210.0, 200.0),
                max: Point::new(610.0, 400.0)
            }
        );
        assert!(matches!(
            reg.rooms()[0].geometry,
            Geometry::Rect { x, .. } if x == 100.0
        ));
    }

    #[test]
    fn unknown_category_is_grey() {
        assert_eq!(
            category_color(SpaceCategory::Unknown),
            Color32::from_rgb(156, 163, 175)
        );
    }

    #[test]
    fn thousands_separator() {
        assert_eq!(format_thousands(10000.0), "10,000");
        assert_eq!(format_thousands(314.2), "314");
        assert_eq!(format_thousands(1234567.0), "1,234,567");
    }
}
