//! Direct manipulation of room geometry: move, resize and vertex drags.

use crate::geometry::{Geometry, Point};
use crate::registry::{GeometryEdit, RoomRegistry};
use crate::room::{Room, RoomId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeKind {
    RectCorner,
    CircleRadius,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handle {
    Resize(ResizeKind),
    Vertex(usize),
}

/// What a pointer-down landed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragTarget {
    Body(RoomId),
    Handle(RoomId, Handle),
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Moving {
        room: RoomId,
        last: Point,
    },
    Resizing {
        room: RoomId,
        kind: ResizeKind,
        last: Point,
    },
    VertexDragging {
        room: RoomId,
        index: usize,
    },
}

pub fn handles(room: &Room) -> Vec<(Handle, Point)> {
    match &room.geometry {
        Geometry::Rect { x, y, w, h } => {
            vec![(Handle::Resize(ResizeKind::RectCorner), Point::new(x + w, y + h))]
        }
        Geometry::Circle { cx, cy, r } => {
            vec![(Handle::Resize(ResizeKind::CircleRadius), Point::new(cx + r, *cy))]
        }
        Geometry::Polygon { points } => points
            .iter()
            .enumerate()
            .map(|(i, p)| (Handle::Vertex(i), *p))
            .collect(),
    }
}

/// Handles of the selected room win over bodies; bodies are tested topmost-first.
pub fn hit_target(registry: &RoomRegistry, pos: Point, tolerance: f32) -> Option<DragTarget> {
    if let Some(room) = registry.selected_room() {
        let handle = handles(room)
            .into_iter()
            .find(|(_, p)| p.distance(pos) <= tolerance);
        if let Some((handle, _)) = handle {
            return Some(DragTarget::Handle(room.id, handle));
        }
    }
    registry.hit_test(pos).map(DragTarget::Body)
}

#[derive(Clone, Debug, Default)]
pub struct Editor {
    gesture: Gesture,
}

impl Editor {
    pub fn gesture(&self) -> Gesture {
        self.gesture
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture != Gesture::Idle
    }

    pub fn pointer_down(&mut self, target: DragTarget, pos: Point, registry: &mut RoomRegistry) {
        let (room, gesture) = match target {
            DragTarget::Body(room) => (room, Gesture::Moving { room, last: pos }),
            DragTarget::Handle(room, Handle::Resize(kind)) => {
                (room, Gesture::Resizing { room, kind, last: pos })
            }
            DragTarget::Handle(room, Handle::Vertex(index)) => {
                (room, Gesture::VertexDragging { room, index })
            }
        };
        registry.select(Some(room));
        self.gesture = gesture;
    }

    /// Move and rect-resize apply the delta since the previous event; radius and vertex
    /// drags follow the pointer absolutely.
    pub fn pointer_move(&mut self, pos: Point, registry: &mut RoomRegistry) {
        match &mut self.gesture {
            Gesture::Idle => {}
            Gesture::Moving { room, last } => {
                let (dx, dy) = (pos.x - last.x, pos.y - last.y);
                registry.update_geometry(*room, GeometryEdit::Translate { dx, dy });
                *last = pos;
            }
            Gesture::Resizing {
                room,
                kind: ResizeKind::RectCorner,
                last,
            } => {
                let (dw, dh) = (pos.x - last.x, pos.y - last.y);
                registry.update_geometry(*room, GeometryEdit::ResizeRect { dw, dh });
                *last = pos;
            }
            Gesture::Resizing {
                room,
                kind: ResizeKind::CircleRadius,
                ..
            } => registry.update_geometry(*room, GeometryEdit::SetRadiusTo(pos)),
            Gesture::VertexDragging { room, index } => registry.update_geometry(
                *room,
                GeometryEdit::MoveVertex {
                    index: *index,
                    to: pos,
                },
            ),
        }
    }

    pub fn pointer_up(&mut self) {
        self.gesture = Gesture::Idle;
    }
}
