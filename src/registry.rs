use std::collections::BTreeSet;

use strum::IntoEnumIterator;

use crate::geometry::{Geometry, Point, ShapeKind};
use crate::room::{Room, RoomId, RoomRecord, SpaceCategory};

const SPAWN: Point = Point::new(200.0, 200.0);
const MIN_RECT_SIDE: f32 = 10.0;
const MIN_RADIUS: f32 = 5.0;

/// A geometry change requested by the editor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GeometryEdit {
    Translate { dx: f32, dy: f32 },
    ResizeRect { dw: f32, dh: f32 },
    SetRadiusTo(Point),
    MoveVertex { index: usize, to: Point },
}

/// Rooms for one analysis session plus the shared selection.
#[derive(Clone, Debug)]
pub struct RoomRegistry {
    rooms: Vec<Room>,
    next_id: u64,
    selected: Option<RoomId>,
    px_per_foot: f32,
    rescaled: bool,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(4.5)
    }
}

impl RoomRegistry {
    pub fn new(px_per_foot: f32) -> Self {
        Self {
            rooms: vec![],
            next_id: 1,
            selected: None,
            px_per_foot,
            rescaled: false,
        }
    }

    /// Builds a registry from detector records. Records without usable geometry are logged and skipped.
    pub fn from_records(records: Vec<RoomRecord>, px_per_foot: f32) -> Self {
        let mut registry = Self::new(px_per_foot);
        let mut taken = BTreeSet::new();
        let wanted: Vec<Option<u64>> = records
            .iter()
            .map(|r| r.id.as_ref().and_then(|id| id.as_number()))
            .collect();
        let max_wanted = wanted.iter().flatten().copied().max().unwrap_or(0);
        registry.next_id = max_wanted + 1;

        for (record, wanted_id) in records.into_iter().zip(wanted) {
            let id = match wanted_id {
                Some(n) if taken.insert(n) => RoomId(n),
                _ => registry.allocate_id(),
            };
            match record.into_room(id, px_per_foot) {
                Ok(room) => registry.rooms.push(room),
                Err(err) => tracing::warn!(%err, "skipping detected room"),
            }
        }
        registry
    }

    fn allocate_id(&mut self) -> RoomId {
        let id = RoomId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn get(&self, id: RoomId) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    fn get_mut(&mut self, id: RoomId) -> Option<&mut Room> {
        self.rooms.iter_mut().find(|r| r.id == id)
    }

    pub fn px_per_foot(&self) -> f32 {
        self.px_per_foot
    }

    pub fn set_px_per_foot(&mut self, px_per_foot: f32) {
        if px_per_foot <= 0.0 || !px_per_foot.is_finite() {
            return;
        }
        self.px_per_foot = px_per_foot;
        for room in &mut self.rooms {
            room.refresh_dimensions(px_per_foot);
        }
    }

    pub fn add(&mut self, kind: ShapeKind) -> &Room {
        let geometry = match kind {
            ShapeKind::Rect => Geometry::Rect {
                x: SPAWN.x,
                y: SPAWN.y,
                w: 100.0,
                h: 100.0,
            },
            ShapeKind::Circle => Geometry::Circle {
                cx: SPAWN.x + 50.0,
                cy: SPAWN.y + 50.0,
                r: 50.0,
            },
            ShapeKind::Polygon => Geometry::Polygon {
                points: vec![
                    SPAWN.offset(0.0, 100.0),
                    SPAWN.offset(50.0, 0.0),
                    SPAWN.offset(100.0, 100.0),
                ],
            },
        };
        let id = self.allocate_id();
        let mut room = Room {
            id,
            name: "New Room".to_string(),
            category: SpaceCategory::Unknown,
            room_type: None,
            geometry,
            walls: vec![],
            calculated_area: None,
            dimensions: String::new(),
        };
        room.refresh_dimensions(self.px_per_foot);
        self.rooms.push(room);
        self.selected = Some(id);
        tracing::debug!(%id, %kind, "room added");
        &self.rooms[self.rooms.len() - 1]
    }

    pub fn remove(&mut self, id: RoomId) {
        let before = self.rooms.len();
        self.rooms.retain(|r| r.id != id);
        if self.rooms.len() == before {
            return;
        }
        if self.selected == Some(id) {
            self.selected = None;
        }
        tracing::debug!(%id, "room removed");
    }

    pub fn update_type(&mut self, id: RoomId, category: SpaceCategory) {
        if let Some(room) = self.get_mut(id) {
            room.category = category;
        }
    }

    pub fn update_label(&mut self, id: RoomId, label: &str) {
        if let Some(room) = self.get_mut(id) {
            room.name = label.to_string();
        }
    }

    pub fn update_geometry(&mut self, id: RoomId, edit: GeometryEdit) {
        let ppf = self.px_per_foot;
        let Some(room) = self.get_mut(id) else {
            return;
        };
        match (edit, &mut room.geometry) {
            (GeometryEdit::Translate { dx, dy }, geometry) => geometry.translate(dx, dy),
            (GeometryEdit::ResizeRect { dw, dh }, Geometry::Rect { w, h, .. }) => {
                *w = (*w + dw).max(MIN_RECT_SIDE);
                *h = (*h + dh).max(MIN_RECT_SIDE);
            }
            (GeometryEdit::SetRadiusTo(to), Geometry::Circle { cx, cy, r }) => {
                *r = Point::new(*cx, *cy).distance(to).max(MIN_RADIUS);
            }
            (GeometryEdit::MoveVertex { index, to }, Geometry::Polygon { points }) => {
                if let Some(p) = points.get_mut(index) {
                    *p = to;
                }
            }
            (edit, geometry) => {
                tracing::debug!(?edit, kind = %geometry.kind(), "edit does not apply to shape");
                return;
            }
        }
        room.refresh_dimensions(ppf);
    }

    /// Taxonomy-ordered groups; every room lands in exactly one group, insertion order kept.
    pub fn group_by_category(&self) -> Vec<(SpaceCategory, Vec<&Room>)> {
        let mut groups: Vec<(SpaceCategory, Vec<&Room>)> =
            SpaceCategory::iter().map(|cat| (cat, vec![])).collect();
        // Unrecognised labels were already folded into Unknown when the record was parsed.
        for room in &self.rooms {
            if let Some((_, bucket)) = groups.iter_mut().find(|(cat, _)| *cat == room.category) {
                bucket.push(room);
            }
        }
        groups
    }

    pub fn category_area(&self, category: SpaceCategory) -> f32 {
        self.rooms
            .iter()
            .filter(|r| r.category == category)
            .filter_map(|r| r.calculated_area)
            .sum()
    }

    pub fn selected(&self) -> Option<RoomId> {
        self.selected
    }

    pub fn selected_room(&self) -> Option<&Room> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn select(&mut self, id: Option<RoomId>) {
        self.selected = id.filter(|id| self.get(*id).is_some());
    }

    /// Clicking the selected room again clears the selection.
    pub fn toggle_select(&mut self, id: RoomId) {
        if self.selected == Some(id) {
            self.selected = None;
        } else {
            self.select(Some(id));
        }
    }

    /// Topmost room under `p` (later rooms draw on top).
    pub fn hit_test(&self, p: Point) -> Option<RoomId> {
        self.rooms
            .iter()
            .rev()
            .find(|r| r.geometry.is_renderable() && r.geometry.contains(p))
            .map(|r| r.id)
    }

    /// Scales every geometry once per image load. Returns whether anything was applied.
    pub fn rescale_once(&mut self, sx: f32, sy: f32) -> bool {
        if self.rescaled {
            return false;
        }
        self.rescaled = true;
        for room in &mut self.rooms {
            room.geometry.scale(sx, sy);
            room.refresh_dimensions(self.px_per_foot);
        }
        tracing::info!(sx, sy, rooms = self.rooms.len(), "rescaled room geometry");
        true
    }

    pub fn is_rescaled(&self) -> bool {
        self.rescaled
    }

    /// Called when a new image is loaded so the next rescale applies.
    pub fn rearm_rescale(&mut self) {
        self.rescaled = false;
    }

    pub fn snapshot(&self) -> Vec<Room> {
        self.rooms.clone()
    }

    pub fn restore(&mut self, rooms: Vec<Room>) {
        self.rooms = rooms;
        let max_id = self.rooms.iter().map(|r| r.id.0).max().unwrap_or(0);
        self.next_id = self.next_id.max(max_id + 1);
        if self
            .selected
            .is_some_and(|selected| self.get(selected).is_none())
        {
            self.selected = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_record(name: &str, category: Option<&str>) -> RoomRecord {
        RoomRecord {
            name: Some(name.to_string()),
            category: category.map(str::to_string),
            shape_type: Some("rect".to_string()),
            coords: Some(crate::room::Coords {
                x: Some(0.0),
                y: Some(0.0),
                w: Some(10.0),
                h: Some(10.0),
                ..Default::default()
            }),
            ..RoomRecord::default()
        }
    }

    #[test]
    fn groups_keep_every_room_and_order() {
        let registry = RoomRegistry::from_records(
            vec![
                rect_record("r0", Some("PFSA Space")),
                rect_record("r1", Some("Common Space")),
                rect_record("r2", None),
                rect_record("r3", Some("PFSA Space")),
                rect_record("r4", Some("Boiler Room")),
            ],
            4.5,
        );
        let groups = registry.group_by_category();
        let names = |cat: SpaceCategory| -> Vec<String> {
            groups
                .iter()
                .find(|(c, _)| *c == cat)
                .map(|(_, rooms)| rooms.iter().map(|r| r.name.clone()).collect())
                .unwrap_or_default()
        };
        assert_eq!(names(SpaceCategory::PfsaSpace), vec!["r0", "r3"]);
        assert_eq!(names(SpaceCategory::CommonSpace), vec!["r1"]);
        assert_eq!(names(SpaceCategory::Unknown), vec!["r2", "r4"]);
        let total: usize = groups.iter().map(|(_, rooms)| rooms.len()).sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn duplicate_and_missing_ids_get_fresh_ones() {
        let mut a = rect_record("a", None);
        a.id = Some(crate::room::RawId::Num(7));
        let mut b = rect_record("b", None);
        b.id = Some(crate::room::RawId::Text("7".to_string()));
        let c = rect_record("c", None);
        let registry = RoomRegistry::from_records(vec![a, b, c], 4.5);
        let ids: Vec<u64> = registry.rooms().iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![7, 8, 9]);
    }

    #[test]
    fn malformed_records_are_skipped() {
        let broken = RoomRecord {
            name: Some("broken".to_string()),
            shape_type: Some("polygon".to_string()),
            points: Some(vec![[0.0, 0.0]]),
            ..RoomRecord::default()
        };
        let registry = RoomRegistry::from_records(vec![broken, rect_record("ok", None)], 4.5);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.rooms()[0].name, "ok");
    }

    #[test]
    fn rescale_applies_only_once_per_image() {
        let mut registry = RoomRegistry::from_records(vec![rect_record("r", None)], 4.5);
        assert!(registry.rescale_once(2.0, 2.0));
        assert!(!registry.rescale_once(2.0, 2.0));
        assert_eq!(
            registry.rooms()[0].geometry,
            Geometry::Rect {
                x: 0.0,
                y: 0.0,
                w: 20.0,
                h: 20.0
            }
        );
        registry.rearm_rescale();
        assert!(registry.rescale_once(0.5, 0.5));
    }

    #[test]
    fn add_and_remove_manage_selection() {
        let mut registry = RoomRegistry::default();
        let id = registry.add(ShapeKind::Rect).id;
        assert_eq!(registry.selected(), Some(id));
        assert_eq!(registry.get(id).map(|r| r.dimensions.as_str()), Some("22ft x 22ft"));
        let other = registry.add(ShapeKind::Polygon).id;
        assert_ne!(id, other);
        registry.remove(other);
        assert_eq!(registry.selected(), None);
        registry.remove(RoomId(999));
        assert_eq!(registry.len(), 1);
        let third = registry.add(ShapeKind::Circle).id;
        assert!(third.0 > other.0);
    }

    #[test]
    fn toggle_select_clears_on_second_click() {
        let mut registry = RoomRegistry::default();
        let id = registry.add(ShapeKind::Rect).id;
        registry.select(None);
        registry.toggle_select(id);
        assert_eq!(registry.selected(), Some(id));
        registry.toggle_select(id);
        assert_eq!(registry.selected(), None);
    }

    #[test]
    fn resize_rect_is_clamped() {
        let mut registry = RoomRegistry::default();
        let id = registry.add(ShapeKind::Rect).id;
        registry.update_geometry(id, GeometryEdit::ResizeRect { dw: -500.0, dh: 8.0 });
        assert!(matches!(
            registry.get(id).map(|r| &r.geometry),
            Some(Geometry::Rect { w, h, .. }) if *w == 10.0 && *h == 108.0
        ));
    }

    #[test]
    fn circle_radius_cannot_collapse() {
        let mut registry = RoomRegistry::default();
        let id = registry.add(ShapeKind::Circle).id;
        let Some(Geometry::Circle { cx, cy, .. }) = registry.get(id).map(|r| r.geometry.clone())
        else {
            panic!("expected a circle");
        };
        registry.update_geometry(id, GeometryEdit::SetRadiusTo(Point::new(cx, cy)));
        let room = registry.get(id).expect("room");
        assert!(matches!(room.geometry, Geometry::Circle { r, .. } if r == 5.0));
        assert!(room.geometry.is_renderable());
        assert_eq!(registry.hit_test(Point::new(cx, cy)), Some(id));
    }

    #[test]
    fn label_and_type_updates_are_immediate() {
        let mut registry = RoomRegistry::from_records(vec![rect_record("r", None)], 4.5);
        let id = registry.rooms()[0].id;
        registry.update_type(id, SpaceCategory::SharedSpace);
        registry.update_label(id, "Lounge 1");
        let room = registry.get(id).expect("room");
        assert_eq!(room.category, SpaceCategory::SharedSpace);
        assert_eq!(room.name, "Lounge 1");
    }
}
