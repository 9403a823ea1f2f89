use serde::{Deserialize, Deserializer, Serialize};
use strum::{EnumIter, IntoEnumIterator};

use crate::error::GeometryError;
use crate::geometry::{Geometry, Point};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoomId(pub u64);

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// PFSA space-use taxonomy. Anything the detector reports outside it is `Unknown`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumIter,
)]
#[serde(from = "String", into = "String")]
pub enum SpaceCategory {
    PfsaSpace,
    NonQualifiedSpace,
    CommonSpace,
    SharedSpace,
    Unknown,
}

impl SpaceCategory {
    pub fn label(self) -> &'static str {
        match self {
            SpaceCategory::PfsaSpace => "PFSA Space",
            SpaceCategory::NonQualifiedSpace => "Non Qualified Space",
            SpaceCategory::CommonSpace => "Common Space",
            SpaceCategory::SharedSpace => "Shared Space",
            SpaceCategory::Unknown => "Unknown",
        }
    }

    pub fn from_label(value: &str) -> Self {
        let normalized: String = value
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        Self::iter()
            .find(|cat| {
                cat.label()
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .collect::<String>()
                    .to_ascii_lowercase()
                    == normalized
            })
            .unwrap_or(SpaceCategory::Unknown)
    }
}

impl std::fmt::Display for SpaceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for SpaceCategory {
    fn from(value: String) -> Self {
        Self::from_label(&value)
    }
}

impl From<SpaceCategory> for String {
    fn from(value: SpaceCategory) -> Self {
        value.label().to_string()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Wall {
    pub sequence_order: u32,
    pub length: f32,
    #[serde(default = "default_unit")]
    pub unit: String,
}

fn default_unit() -> String {
    "ft".to_string()
}

#[derive(Clone, Debug, PartialEq)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub category: SpaceCategory,
    pub room_type: Option<String>,
    pub geometry: Geometry,
    pub walls: Vec<Wall>,
    pub calculated_area: Option<f32>,
    pub dimensions: String,
}

impl Room {
    pub fn refresh_dimensions(&mut self, px_per_foot: f32) {
        self.dimensions = dimension_text(&self.geometry, px_per_foot);
    }

    pub fn to_record(&self) -> RoomRecord {
        let (shape, coords, points) = match &self.geometry {
            Geometry::Rect { x, y, w, h } => (
                "rect",
                Some(Coords {
                    x: Some(*x),
                    y: Some(*y),
                    w: Some(*w),
                    h: Some(*h),
                    ..Coords::default()
                }),
                None,
            ),
            Geometry::Circle { cx, cy, r } => (
                "circle",
                Some(Coords {
                    cx: Some(*cx),
                    cy: Some(*cy),
                    r: Some(*r),
                    ..Coords::default()
                }),
                None,
            ),
            Geometry::Polygon { points } => (
                "polygon",
                None,
                Some(points.iter().map(|p| [p.x, p.y]).collect()),
            ),
        };
        RoomRecord {
            id: Some(RawId::Num(self.id.0)),
            name: Some(self.name.clone()),
            category: Some(self.category.label().to_string()),
            room_type: self.room_type.clone(),
            shape_type: Some(shape.to_string()),
            coords,
            points,
            walls: self.walls.clone(),
            calculated_area: self.calculated_area,
            dimensions: Some(self.dimensions.clone()).filter(|d| !d.is_empty()),
        }
    }
}

/// Human-readable size in feet under the current calibration.
pub fn dimension_text(geometry: &Geometry, px_per_foot: f32) -> String {
    let ppf = if px_per_foot > 0.0 { px_per_foot } else { 1.0 };
    let ft = |v: f32| (v / ppf).round() as i64;
    match geometry {
        Geometry::Rect { w, h, .. } => format!("{}ft x {}ft", ft(*w), ft(*h)),
        Geometry::Circle { r, .. } => format!("{}ft Dia", ft(r * 2.0)),
        Geometry::Polygon { .. } => {
            let bounds = geometry.bounding_box();
            format!(
                "{}ft x {}ft (Irreg)",
                ft(bounds.width()),
                ft(bounds.height())
            )
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Num(u64),
    Float(f64),
    Text(String),
}

impl RawId {
    pub fn as_number(&self) -> Option<u64> {
        match self {
            RawId::Num(n) => Some(*n),
            RawId::Float(f) if *f >= 0.0 && f.fract() == 0.0 => Some(*f as u64),
            RawId::Float(_) => None,
            RawId::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// `null` reads as the default, same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decodes a `rooms` array one entry at a time, dropping entries that do not fit `RoomRecord`.
pub fn lenient_records<'de, D>(deserializer: D) -> Result<Vec<RoomRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Vec<serde_json::Value> = null_as_default(deserializer)?;
    Ok(values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<RoomRecord>(value) {
            Ok(record) => Some(record),
            Err(source) => {
                let err = GeometryError::Malformed { index, source };
                tracing::warn!(%err, "skipping detected room");
                None
            }
        })
        .collect())
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cx: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cy: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<f32>,
}

/// A room as the detection service sends it and as rooms are posted back for reporting.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RawId>,
    #[serde(default, alias = "label", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub room_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coords: Option<Coords>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<[f32; 2]>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub walls: Vec<Wall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculated_area: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<String>,
}

const SHAPE_WORDS: [&str; 3] = ["rect", "circle", "polygon"];

impl RoomRecord {
    fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.id.as_ref().map(|id| format!("{id:?}")))
            .unwrap_or_else(|| "<unnamed>".to_string())
    }

    /// The detector sometimes reports the shape in `type`; only non-shape words are a room type.
    pub fn architectural_type(&self) -> Option<String> {
        self.room_type
            .clone()
            .filter(|t| !SHAPE_WORDS.contains(&t.to_ascii_lowercase().as_str()))
    }

    pub fn resolve_geometry(&self) -> Result<Geometry, GeometryError> {
        let hint = self
            .shape_type
            .clone()
            .or_else(|| self.room_type.clone())
            .map(|s| s.to_ascii_lowercase());
        let coords = self.coords.clone().unwrap_or_default();

        let rect = || match (coords.x, coords.y, coords.w, coords.h) {
            (Some(x), Some(y), Some(w), Some(h)) => Some(Geometry::Rect { x, y, w, h }),
            _ => None,
        };
        let circle = || match (coords.cx, coords.cy, coords.r) {
            (Some(cx), Some(cy), Some(r)) => Some(Geometry::Circle { cx, cy, r }),
            _ => None,
        };
        let polygon = || {
            self.points.as_ref().map(|pts| Geometry::Polygon {
                points: pts.iter().copied().map(Point::from).collect(),
            })
        };

        let geometry = match hint.as_deref() {
            Some("rect") => rect(),
            Some("circle") => circle(),
            Some("polygon") => polygon(),
            _ => None,
        }
        .or_else(rect)
        .or_else(polygon)
        .or_else(circle)
        .ok_or_else(|| GeometryError::Missing {
            room: self.display_name(),
            detail: format!("shape hint {hint:?}"),
        })?;

        if !geometry.is_renderable() {
            return Err(GeometryError::Invalid {
                room: self.display_name(),
                detail: format!("{geometry:?}"),
            });
        }
        Ok(geometry)
    }

    pub fn into_room(self, id: RoomId, px_per_foot: f32) -> Result<Room, GeometryError> {
        let geometry = self.resolve_geometry()?;
        let room_type = self.architectural_type();
        let mut walls = self.walls;
        walls.sort_by_key(|w| w.sequence_order);
        let mut room = Room {
            id,
            name: self.name.unwrap_or_else(|| format!("Room {}", id.0)),
            category: self
                .category
                .as_deref()
                .map(SpaceCategory::from_label)
                .unwrap_or(SpaceCategory::Unknown),
            room_type,
            geometry,
            walls,
            calculated_area: self.calculated_area,
            dimensions: String::new(),
        };
        room.refresh_dimensions(px_per_foot);
        Ok(room)
    }
}
