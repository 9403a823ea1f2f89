//! Reference space ↔ displayed image ↔ screen, plus the interactive pan/zoom state.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::registry::RoomRegistry;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(1024.0, 1024.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomLimits {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min: 0.5,
            max: 5.0,
            step: 1.2,
        }
    }
}

/// Pan (in reference units) and zoom applied on top of the reference→display mapping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn zoom_in(&mut self, limits: ZoomLimits) {
        self.scale = (self.scale * limits.step).min(limits.max);
    }

    pub fn zoom_out(&mut self, limits: ZoomLimits) {
        self.scale = (self.scale / limits.step).max(limits.min);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateMapper {
    reference: Size,
    display: Size,
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self::new(Size::default())
    }
}

impl CoordinateMapper {
    pub fn new(reference: Size) -> Self {
        Self {
            reference,
            display: reference,
        }
    }

    pub fn reference(&self) -> Size {
        self.reference
    }

    pub fn display(&self) -> Size {
        self.display
    }

    /// Metadata sent with a detection result overrides the default reference space.
    pub fn set_reference(&mut self, reference: Size) {
        if reference.is_valid() {
            self.reference = reference;
        }
    }

    pub fn set_display(&mut self, display: Size) {
        if display.is_valid() {
            self.display = display;
        }
    }

    fn ratio(&self) -> (f32, f32) {
        (
            self.display.width / self.reference.width,
            self.display.height / self.reference.height,
        )
    }

    pub fn to_display(&self, p: Point) -> Point {
        let (rx, ry) = self.ratio();
        Point::new(p.x * rx, p.y * ry)
    }

    /// Reference length → display length (uses the horizontal ratio).
    pub fn length_to_display(&self, len: f32) -> f32 {
        len * self.ratio().0
    }

    /// Reference point → position relative to the image's on-screen origin.
    pub fn to_screen(&self, p: Point, view: &ViewTransform) -> Point {
        let viewed = Point::new(p.x * view.scale + view.x, p.y * view.scale + view.y);
        self.to_display(viewed)
    }

    /// Inverse of [`Self::to_screen`], used for hit-testing and drag math.
    pub fn to_reference(&self, screen: Point, view: &ViewTransform) -> Point {
        let (rx, ry) = self.ratio();
        let viewed = Point::new(screen.x / rx, screen.y / ry);
        Point::new(
            (viewed.x - view.x) / view.scale,
            (viewed.y - view.y) / view.scale,
        )
    }

    /// Screen-space drag delta → reference-space pan delta.
    pub fn screen_delta_to_pan(&self, dx: f32, dy: f32) -> (f32, f32) {
        let (rx, ry) = self.ratio();
        (dx / rx, dy / ry)
    }

    /// Adopts a freshly decoded image as the coordinate space. Rooms placed against the old
    /// reference are rescaled once per load; later calls for the same load are no-ops.
    pub fn adopt_image(&mut self, natural: Size, registry: &mut RoomRegistry) -> bool {
        if !natural.is_valid() || registry.is_rescaled() {
            return false;
        }
        let sx = natural.width / self.reference.width;
        let sy = natural.height / self.reference.height;
        let applied = registry.rescale_once(sx, sy);
        self.reference = natural;
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Geometry, ShapeKind};

    #[test]
    fn to_display_scales_by_width_ratio() {
        let mut mapper = CoordinateMapper::new(Size::new(1024.0, 1024.0));
        mapper.set_display(Size::new(512.0, 512.0));
        assert_eq!(mapper.to_display(Point::new(100.0, 300.0)), Point::new(50.0, 150.0));
    }

    #[test]
    fn to_reference_inverts_view_transform() {
        let mut mapper = CoordinateMapper::new(Size::new(1000.0, 1000.0));
        mapper.set_display(Size::new(500.0, 500.0));
        let view = ViewTransform {
            x: 20.0,
            y: -10.0,
            scale: 2.0,
        };
        let p = Point::new(123.0, 456.0);
        let screen = mapper.to_screen(p, &view);
        let back = mapper.to_reference(screen, &view);
        assert!((back.x - p.x).abs() < 1e-3);
        assert!((back.y - p.y).abs() < 1e-3);
    }

    #[test]
    fn zoom_is_bounded() {
        let limits = ZoomLimits::default();
        let mut view = ViewTransform::default();
        for _ in 0..20 {
            view.zoom_in(limits);
        }
        assert_eq!(view.scale, 5.0);
        for _ in 0..40 {
            view.zoom_out(limits);
        }
        assert_eq!(view.scale, 0.5);
        view.pan_by(3.0, 4.0);
        view.reset();
        assert!(view.is_identity());
    }

    #[test]
    fn adopt_image_rescales_once() {
        let mut registry = RoomRegistry::default();
        let id = registry.add(ShapeKind::Rect).id;
        let mut mapper = CoordinateMapper::new(Size::new(1024.0, 1024.0));

        assert!(mapper.adopt_image(Size::new(2048.0, 2048.0), &mut registry));
        assert!(!mapper.adopt_image(Size::new(2048.0, 2048.0), &mut registry));
        assert_eq!(mapper.reference(), Size::new(2048.0, 2048.0));
        assert!(matches!(
            registry.get(id).map(|r| &r.geometry),
            Some(Geometry::Rect { x, w, .. }) if *x == 400.0 && *w == 200.0
        ));
    }
}
