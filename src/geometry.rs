//! Room shapes in reference space and the pure helpers the overlay and editor share.

use serde::{Deserialize, Serialize};

use crate::room::{Room, Wall};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f32; 2]> for Point {
    fn from(value: [f32; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[strum(to_string = "Rectangle")]
    Rect,
    #[strum(to_string = "Circle")]
    Circle,
    #[strum(to_string = "Polygon")]
    Polygon,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum Geometry {
    Rect { x: f32, y: f32, w: f32, h: f32 },
    Circle { cx: f32, cy: f32, r: f32 },
    Polygon { points: Vec<Point> },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WallLabel {
    pub x: f32,
    pub y: f32,
    pub anchor: TextAnchor,
}

impl Geometry {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Geometry::Rect { .. } => ShapeKind::Rect,
            Geometry::Circle { .. } => ShapeKind::Circle,
            Geometry::Polygon { .. } => ShapeKind::Polygon,
        }
    }

    /// Finite coordinates, positive extents and at least three polygon vertices.
    pub fn is_renderable(&self) -> bool {
        match self {
            Geometry::Rect { x, y, w, h } => {
                [x, y, w, h].iter().all(|v| v.is_finite()) && *w > 0.0 && *h > 0.0
            }
            Geometry::Circle { cx, cy, r } => {
                [cx, cy, r].iter().all(|v| v.is_finite()) && *r > 0.0
            }
            Geometry::Polygon { points } => {
                points.len() >= 3 && points.iter().all(|p| p.is_finite())
            }
        }
    }

    pub fn bounding_box(&self) -> Bounds {
        match self {
            Geometry::Rect { x, y, w, h } => Bounds {
                min: Point::new(*x, *y),
                max: Point::new(x + w, y + h),
            },
            Geometry::Circle { cx, cy, r } => Bounds {
                min: Point::new(cx - r, cy - r),
                max: Point::new(cx + r, cy + r),
            },
            Geometry::Polygon { points } => {
                let mut min = Point::new(f32::INFINITY, f32::INFINITY);
                let mut max = Point::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
                for p in points {
                    min.x = min.x.min(p.x);
                    min.y = min.y.min(p.y);
                    max.x = max.x.max(p.x);
                    max.y = max.y.max(p.y);
                }
                if points.is_empty() {
                    min = Point::default();
                    max = Point::default();
                }
                Bounds { min, max }
            }
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        match self {
            Geometry::Rect { x, y, w, h } => {
                p.x >= *x && p.x <= x + w && p.y >= *y && p.y <= y + h
            }
            Geometry::Circle { cx, cy, r } => Point::new(*cx, *cy).distance(p) <= *r,
            Geometry::Polygon { points } => point_in_polygon(p, points),
        }
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        match self {
            Geometry::Rect { x, y, .. } => {
                *x += dx;
                *y += dy;
            }
            Geometry::Circle { cx, cy, .. } => {
                *cx += dx;
                *cy += dy;
            }
            Geometry::Polygon { points } => {
                for p in points.iter_mut() {
                    *p = p.offset(dx, dy);
                }
            }
        }
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        match self {
            Geometry::Rect { x, y, w, h } => {
                *x *= sx;
                *y *= sy;
                *w *= sx;
                *h *= sy;
            }
            Geometry::Circle { cx, cy, r } => {
                *cx *= sx;
                *cy *= sy;
                *r *= sx;
            }
            Geometry::Polygon { points } => {
                for p in points.iter_mut() {
                    p.x *= sx;
                    p.y *= sy;
                }
            }
        }
    }
}

/// Label anchor for a room. Polygons use the plain vertex mean, not the area centroid.
pub fn centroid(geometry: &Geometry) -> Point {
    match geometry {
        Geometry::Rect { x, y, w, h } => Point::new(x + w / 2.0, y + h / 2.0),
        Geometry::Circle { cx, cy, .. } => Point::new(*cx, *cy),
        Geometry::Polygon { points } => {
            if points.is_empty() {
                return Point::default();
            }
            let n = points.len() as f32;
            let (sx, sy) = points
                .iter()
                .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
            Point::new(sx / n, sy / n)
        }
    }
}

/// Where the length label of `wall` goes. `None` means the caller skips the label.
pub fn wall_label_anchor(room: &Room, wall: &Wall, label_offset: f32) -> Option<WallLabel> {
    if room.walls.is_empty() || wall.sequence_order == 0 {
        return None;
    }
    let index = (wall.sequence_order - 1) as usize;

    match &room.geometry {
        Geometry::Rect { x, y, w, h } => {
            let cx = x + w / 2.0;
            let cy = y + h / 2.0;
            let label = match index % 4 {
                0 => WallLabel {
                    x: cx,
                    y: y - label_offset,
                    anchor: TextAnchor::Middle,
                },
                1 => WallLabel {
                    x: x + w + label_offset,
                    y: cy,
                    anchor: TextAnchor::Start,
                },
                2 => WallLabel {
                    x: cx,
                    y: y + h + label_offset * 1.5,
                    anchor: TextAnchor::Middle,
                },
                _ => WallLabel {
                    x: x - label_offset,
                    y: cy,
                    anchor: TextAnchor::End,
                },
            };
            Some(label)
        }
        Geometry::Polygon { points } => {
            if points.len() < 2 {
                return None;
            }
            let i = index % points.len();
            let p1 = points[i];
            let p2 = points[(i + 1) % points.len()];
            let mid = Point::new((p1.x + p2.x) / 2.0, (p1.y + p2.y) / 2.0);
            let dx = p2.x - p1.x;
            let dy = p2.y - p1.y;
            let length = (dx * dx + dy * dy).sqrt();
            if length <= f32::EPSILON {
                return Some(WallLabel {
                    x: mid.x,
                    y: mid.y,
                    anchor: TextAnchor::Middle,
                });
            }
            Some(WallLabel {
                x: mid.x - (dy / length) * label_offset,
                y: mid.y + (dx / length) * label_offset,
                anchor: TextAnchor::Middle,
            })
        }
        Geometry::Circle { .. } => None,
    }
}

fn point_in_polygon(p: Point, points: &[Point]) -> bool {
    if points.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (a, b) = (points[i], points[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::{Room, RoomId, SpaceCategory, Wall};

    fn room_with(geometry: Geometry, walls: Vec<Wall>) -> Room {
        Room {
            id: RoomId(1),
            name: "Office".to_string(),
            category: SpaceCategory::PfsaSpace,
            room_type: None,
            geometry,
            walls,
            calculated_area: None,
            dimensions: String::new(),
        }
    }

    fn wall(order: u32) -> Wall {
        Wall {
            sequence_order: order,
            length: 12.0,
            unit: "ft".to_string(),
        }
    }

    #[test]
    fn centroid_of_square_rect() {
        let square = Geometry::Rect {
            x: 0.0,
            y: 0.0,
            w: 10.0,
            h: 10.0,
        };
        assert_eq!(centroid(&square), Point::new(5.0, 5.0));
    }

    #[test]
    fn centroid_of_circle_is_center() {
        let circle = Geometry::Circle {
            cx: 40.0,
            cy: -3.0,
            r: 9.0,
        };
        assert_eq!(centroid(&circle), Point::new(40.0, -3.0));
    }

    #[test]
    fn centroid_of_polygon_is_vertex_mean() {
        let poly = Geometry::Polygon {
            points: vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0),
                Point::new(0.0, 5.0),
            ],
        };
        assert_eq!(centroid(&poly), Point::new(4.0, 5.0));
    }

    #[test]
    fn rect_first_wall_is_top_center() {
        for (x, y, w, h) in [(0.0, 0.0, 10.0, 10.0), (300.0, 120.0, 55.0, 400.0)] {
            let room = room_with(Geometry::Rect { x, y, w, h }, vec![wall(1)]);
            let label = wall_label_anchor(&room, &room.walls[0], 10.24).expect("label");
            assert_eq!(label.x, x + w / 2.0);
            assert_eq!(label.y, y - 10.24);
            assert_eq!(label.anchor, TextAnchor::Middle);
        }
    }

    #[test]
    fn rect_walls_wrap_every_four() {
        let room = room_with(
            Geometry::Rect {
                x: 0.0,
                y: 0.0,
                w: 20.0,
                h: 10.0,
            },
            vec![wall(1), wall(2), wall(3), wall(4), wall(5)],
        );
        let right = wall_label_anchor(&room, &room.walls[1], 2.0).expect("right");
        assert_eq!((right.x, right.y, right.anchor), (22.0, 5.0, TextAnchor::Start));
        let bottom = wall_label_anchor(&room, &room.walls[2], 2.0).expect("bottom");
        assert_eq!(bottom.y, 13.0);
        let left = wall_label_anchor(&room, &room.walls[3], 2.0).expect("left");
        assert_eq!(left.anchor, TextAnchor::End);
        let wrapped = wall_label_anchor(&room, &room.walls[4], 2.0).expect("wrapped");
        assert_eq!(wrapped.y, -2.0);
    }

    #[test]
    fn polygon_wall_label_is_offset_along_normal() {
        let room = room_with(
            Geometry::Polygon {
                points: vec![
                    Point::new(0.0, 0.0),
                    Point::new(10.0, 0.0),
                    Point::new(10.0, 10.0),
                ],
            },
            vec![wall(1)],
        );
        let label = wall_label_anchor(&room, &room.walls[0], 2.0).expect("label");
        assert_eq!((label.x, label.y), (5.0, 2.0));
    }

    #[test]
    fn degenerate_polygon_edge_returns_midpoint() {
        let room = room_with(
            Geometry::Polygon {
                points: vec![
                    Point::new(4.0, 4.0),
                    Point::new(4.0, 4.0),
                    Point::new(10.0, 10.0),
                ],
            },
            vec![wall(1)],
        );
        let label = wall_label_anchor(&room, &room.walls[0], 2.0).expect("label");
        assert_eq!((label.x, label.y), (4.0, 4.0));
    }

    #[test]
    fn missing_walls_yield_no_label() {
        let room = room_with(
            Geometry::Rect {
                x: 0.0,
                y: 0.0,
                w: 1.0,
                h: 1.0,
            },
            vec![],
        );
        assert!(wall_label_anchor(&room, &wall(1), 2.0).is_none());

        let circle = room_with(
            Geometry::Circle {
                cx: 0.0,
                cy: 0.0,
                r: 1.0,
            },
            vec![wall(1)],
        );
        assert!(wall_label_anchor(&circle, &circle.walls[0], 2.0).is_none());
    }

    #[test]
    fn polygon_hit_test_uses_even_odd_rule() {
        let tri = Geometry::Polygon {
            points: vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(0.0, 10.0),
            ],
        };
        assert!(tri.contains(Point::new(2.0, 2.0)));
        assert!(!tri.contains(Point::new(9.0, 9.0)));
    }

    #[test]
    fn short_polygon_is_not_renderable() {
        let line = Geometry::Polygon {
            points: vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)],
        };
        assert!(!line.is_renderable());
        let nan_rect = Geometry::Rect {
            x: f32::NAN,
            y: 0.0,
            w: 1.0,
            h: 1.0,
        };
        assert!(!nan_rect.is_renderable());
    }
}
