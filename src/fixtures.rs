//! Built-in data used when running offline: sample floor plans, detection results and a report.

use std::collections::BTreeMap;
use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};
use once_cell::sync::Lazy;

use crate::geometry::{Geometry, Point};
use crate::mapper::Size;
use crate::overlay::format_thousands;
use crate::report::{CategoryResult, CategoryStatus, CheckItem, CheckStatus, ComplianceReport};
use crate::room::{Coords, RawId, Room, RoomRecord, SpaceCategory, Wall};
use crate::service::{AnalysisPayload, CategorySummary, StagedFile};

const PX_PER_FOOT: f32 = 4.5;
const SAMPLE_SIZE: u32 = 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    CommunityCenter,
    DetentionCenter,
}

pub struct SampleBlueprint {
    pub name: &'static str,
    pub layout: Layout,
    pub png: Vec<u8>,
}

impl SampleBlueprint {
    pub fn file_name(&self) -> String {
        format!("{}.png", self.name)
    }

    pub fn staged(&self) -> StagedFile {
        StagedFile::new(self.file_name(), self.png.clone())
    }
}

pub static SAMPLES: Lazy<Vec<SampleBlueprint>> = Lazy::new(|| {
    [
        ("Community Center", Layout::CommunityCenter),
        ("Detention Center", Layout::DetentionCenter),
    ]
    .into_iter()
    .map(|(name, layout)| SampleBlueprint {
        name,
        layout,
        png: render_plan(&layout_records(layout)),
    })
    .collect()
});

fn walls_for(geometry: &Geometry) -> Vec<Wall> {
    let lengths: Vec<f32> = match geometry {
        Geometry::Rect { w, h, .. } => vec![*w, *h, *w, *h],
        Geometry::Polygon { points } => points
            .iter()
            .zip(points.iter().cycle().skip(1))
            .map(|(a, b)| a.distance(*b))
            .collect(),
        Geometry::Circle { .. } => vec![],
    };
    lengths
        .into_iter()
        .enumerate()
        .map(|(i, len)| Wall {
            sequence_order: i as u32 + 1,
            length: (len / PX_PER_FOOT).round(),
            unit: "ft".to_string(),
        })
        .collect()
}

fn area_sq_ft(geometry: &Geometry) -> f32 {
    let px = match geometry {
        Geometry::Rect { w, h, .. } => w * h,
        Geometry::Circle { r, .. } => std::f32::consts::PI * r * r,
        Geometry::Polygon { points } => {
            let twice: f32 = points
                .iter()
                .zip(points.iter().cycle().skip(1))
                .map(|(a, b)| a.x * b.y - b.x * a.y)
                .sum();
            twice.abs() / 2.0
        }
    };
    (px / (PX_PER_FOOT * PX_PER_FOOT)).round()
}

fn record(id: u64, name: &str, category: SpaceCategory, kind: &str, geometry: Geometry) -> RoomRecord {
    let walls = walls_for(&geometry);
    let calculated_area = Some(area_sq_ft(&geometry));
    let (shape_type, coords, points) = match geometry {
        Geometry::Rect { x, y, w, h } => (
            "rect",
            Some(Coords {
                x: Some(x),
                y: Some(y),
                w: Some(w),
                h: Some(h),
                ..Coords::default()
            }),
            None,
        ),
        Geometry::Circle { cx, cy, r } => (
            "circle",
            Some(Coords {
                cx: Some(cx),
                cy: Some(cy),
                r: Some(r),
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
        id: Some(RawId::Num(id)),
        name: Some(name.to_string()),
        category: Some(category.label().to_string()),
        room_type: Some(kind.to_string()),
        shape_type: Some(shape_type.to_string()),
        coords,
        points,
        walls,
        calculated_area,
        dimensions: None,
    }
}

fn rect(x: f32, y: f32, w: f32, h: f32) -> Geometry {
    Geometry::Rect { x, y, w, h }
}

fn layout_records(layout: Layout) -> Vec<RoomRecord> {
    use SpaceCategory::*;
    match layout {
        Layout::CommunityCenter => vec![
            record(1, "Admin Office", PfsaSpace, "office", rect(60.0, 60.0, 300.0, 200.0)),
            record(2, "Classroom", PfsaSpace, "classroom", rect(380.0, 60.0, 400.0, 160.0)),
            record(3, "Lobby", CommonSpace, "lobby", rect(60.0, 280.0, 200.0, 180.0)),
            record(
                4,
                "Lounge",
                CommonSpace,
                "lounge",
                Geometry::Circle {
                    cx: 380.0,
                    cy: 420.0,
                    r: 90.0,
                },
            ),
            record(5, "Gymnasium", SharedSpace, "gym", rect(520.0, 250.0, 450.0, 560.0)),
            record(
                6,
                "Storage",
                NonQualifiedSpace,
                "storage",
                Geometry::Polygon {
                    points: vec![
                        Point::new(60.0, 500.0),
                        Point::new(300.0, 500.0),
                        Point::new(300.0, 700.0),
                        Point::new(60.0, 800.0),
                    ],
                },
            ),
        ],
        Layout::DetentionCenter => vec![
            record(1, "Intake", PfsaSpace, "intake", rect(80.0, 80.0, 260.0, 180.0)),
            record(2, "Cell Block A", PfsaSpace, "cells", rect(380.0, 80.0, 560.0, 220.0)),
            record(3, "Visitation", SharedSpace, "visitation", rect(80.0, 300.0, 260.0, 200.0)),
            record(4, "Dayroom", CommonSpace, "dayroom", rect(380.0, 340.0, 360.0, 260.0)),
            record(
                5,
                "Guard Station",
                NonQualifiedSpace,
                "security",
                Geometry::Circle {
                    cx: 850.0,
                    cy: 470.0,
                    r: 80.0,
                },
            ),
            record(
                6,
                "Mechanical",
                NonQualifiedSpace,
                "mechanical",
                Geometry::Polygon {
                    points: vec![
                        Point::new(80.0, 560.0),
                        Point::new(340.0, 560.0),
                        Point::new(340.0, 900.0),
                    ],
                },
            ),
            record(7, "Yard", SharedSpace, "recreation", rect(380.0, 640.0, 560.0, 280.0)),
        ],
    }
}

/// Draws room outlines onto a paper-white canvas.
fn render_plan(records: &[RoomRecord]) -> Vec<u8> {
    let mut canvas = RgbImage::from_pixel(SAMPLE_SIZE, SAMPLE_SIZE, Rgb([250, 250, 246]));
    let ink = Rgb([40, 44, 52]);
    for geometry in records.iter().filter_map(|r| r.resolve_geometry().ok()) {
        match geometry {
            Geometry::Rect { x, y, w, h } => {
                let corners = [
                    Point::new(x, y),
                    Point::new(x + w, y),
                    Point::new(x + w, y + h),
                    Point::new(x, y + h),
                ];
                draw_outline(&mut canvas, &corners, ink);
            }
            Geometry::Polygon { points } => draw_outline(&mut canvas, &points, ink),
            Geometry::Circle { cx, cy, r } => {
                let steps = 180;
                let ring: Vec<Point> = (0..steps)
                    .map(|i| {
                        let t = i as f32 / steps as f32 * std::f32::consts::TAU;
                        Point::new(cx + r * t.cos(), cy + r * t.sin())
                    })
                    .collect();
                draw_outline(&mut canvas, &ring, ink);
            }
        }
    }
    let mut out = Cursor::new(Vec::new());
    if let Err(err) = canvas.write_to(&mut out, ImageFormat::Png) {
        tracing::error!(%err, "sample blueprint encode failed");
    }
    out.into_inner()
}

fn draw_outline(canvas: &mut RgbImage, points: &[Point], ink: Rgb<u8>) {
    for (a, b) in points.iter().zip(points.iter().cycle().skip(1)) {
        let steps = a.distance(*b).ceil().max(1.0) as u32;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let (x, y) = (a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t);
            for (ox, oy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                let (px, py) = (x as i64 + ox, y as i64 + oy);
                if px >= 0 && py >= 0 && (px as u32) < canvas.width() && (py as u32) < canvas.height() {
                    canvas.put_pixel(px as u32, py as u32, ink);
                }
            }
        }
    }
}

fn summarize(records: &[RoomRecord]) -> CategorySummary {
    let mut totals: BTreeMap<String, f32> = BTreeMap::new();
    for record in records {
        let category = record
            .category
            .clone()
            .unwrap_or_else(|| SpaceCategory::Unknown.label().to_string());
        *totals.entry(category).or_default() += record.calculated_area.unwrap_or(0.0);
    }
    CategorySummary {
        totals_sq_ft: totals,
    }
}

/// Detection result for a staged file; sample names pick their own layout.
pub fn analysis_for(file_name: &str) -> AnalysisPayload {
    let layout = if file_name.to_ascii_lowercase().contains("detention") {
        Layout::DetentionCenter
    } else {
        Layout::CommunityCenter
    };
    let rooms = layout_records(layout);
    AnalysisPayload {
        category_summary: Some(summarize(&rooms)),
        rooms,
        image_metadata: Some(Size::new(SAMPLE_SIZE as f32, SAMPLE_SIZE as f32)),
    }
}

fn base_report(file_name: &str) -> serde_json::Value {
    serde_json::json!({
        "summary": { "compliant": 8, "violations": 3, "warnings": 2, "totalChecks": 13 },
        "blueprint": {
            "name": file_name,
            "uploadDate": chrono::Local::now().format("%m/%d/%Y").to_string(),
            "facilityType": "Administrative Office",
            "totalArea": "2,400 sq ft"
        },
        "results": [
            {
                "category": "Space Requirements",
                "status": "compliant",
                "items": [
                    {
                        "id": 1,
                        "check": "Office Space Square Footage",
                        "status": "pass",
                        "finding": "Office spaces range from 150-200 sq ft, exceeding minimum requirement of 100 sq ft per occupant",
                        "blueprint": "Room 101, 102, 103 measured at 150, 175, 200 sq ft respectively",
                        "policy": "25 CFR 900.70(a) - Adequate space for program administration",
                        "citation": "Indian Affairs Manual Part 80, Chapter 7, Section 1.7.B.2"
                    },
                    {
                        "id": 2,
                        "check": "Common Area Allocation",
                        "status": "pass",
                        "finding": "Common areas total 400 sq ft, meeting guideline of 15-20% of total space",
                        "blueprint": "Break room: 200 sq ft, Conference room: 200 sq ft",
                        "policy": "General facility standards for administrative offices",
                        "citation": "Building Code Section 310.1"
                    }
                ]
            },
            {
                "category": "Accessibility & Egress",
                "status": "violation",
                "items": [
                    {
                        "id": 3,
                        "check": "Exit Door Width",
                        "status": "fail",
                        "finding": "Exit door in Room 104 measures 30 inches wide, below ADA minimum requirement",
                        "blueprint": "Room 104 exit door marked as 30\" on blueprint",
                        "policy": "ADA Standards require minimum 32 inches clear width for doorways",
                        "citation": "ADA Standards Section 404.2.3",
                        "recommendation": "Widen door opening to minimum 32 inches or replace with compliant door frame"
                    },
                    {
                        "id": 4,
                        "check": "Main Corridor Width",
                        "status": "pass",
                        "finding": "Main corridor width of 48 inches exceeds minimum requirement",
                        "blueprint": "Main corridor marked as 48\" throughout",
                        "policy": "Minimum 44 inches for accessible routes",
                        "citation": "ADA Standards Section 403.5.1"
                    },
                    {
                        "id": 5,
                        "check": "Bathroom Accessibility",
                        "status": "fail",
                        "finding": "Bathroom door opens inward, blocking required clear floor space for wheelchair maneuvering",
                        "blueprint": "Bathroom layout shows door swing conflicts with 60\" turning diameter",
                        "policy": "Accessible bathrooms must provide 60-inch diameter turning space",
                        "citation": "ADA Standards Section 603.2.1",
                        "recommendation": "Reverse door swing to open outward or use sliding door"
                    }
                ]
            },
            {
                "category": "Fire Safety & Equipment",
                "status": "warning",
                "items": [
                    {
                        "id": 6,
                        "check": "Fire Extinguisher Placement",
                        "status": "pass",
                        "finding": "Fire extinguishers placed every 75 feet, meeting maximum travel distance requirement",
                        "blueprint": "4 fire extinguishers marked on plan at strategic locations",
                        "policy": "Maximum 75 feet travel distance to extinguisher",
                        "citation": "NFPA 10 Section 6.1"
                    },
                    {
                        "id": 7,
                        "check": "Emergency Exit Signage",
                        "status": "warning",
                        "finding": "Exit signs shown on blueprint but specifications not provided",
                        "blueprint": "Exit signs indicated but illumination details missing",
                        "policy": "Exit signs must be illuminated and meet visibility requirements",
                        "citation": "IBC Section 1013",
                        "recommendation": "Verify exit signs are illuminated and meet photometric requirements"
                    }
                ]
            },
            {
                "category": "105(l) Lease Compliance",
                "status": "compliant",
                "items": [
                    {
                        "id": 8,
                        "check": "Program Space Allocation",
                        "status": "pass",
                        "finding": "Facility layout supports identified PFSAs with appropriate space allocation",
                        "blueprint": "Administrative offices, meeting spaces, and support areas clearly designated",
                        "policy": "Facility must support programs, functions, services, or activities (PFSAs) under funding agreement",
                        "citation": "Indian Affairs Manual Part 80, Chapter 7, Section 1.6.A"
                    },
                    {
                        "id": 9,
                        "check": "Facility Use Documentation",
                        "status": "pass",
                        "finding": "Blueprint clearly identifies administrative program spaces matching funding agreement",
                        "blueprint": "Spaces labeled for tribal governance, social services, and administration",
                        "policy": "105(l) lease must support PFSAs contained in approved funding agreement",
                        "citation": "25 U.S.C. § 5324(l)"
                    }
                ]
            }
        ]
    })
}

/// Fixed report plus a classification section that reflects the submitted rooms.
pub fn report_for(file_name: &str, rooms: &[Room]) -> Result<ComplianceReport, serde_json::Error> {
    let mut report: ComplianceReport = serde_json::from_value(base_report(file_name))?;
    if rooms.is_empty() {
        return Ok(report);
    }

    let next_id = report
        .results
        .iter()
        .flat_map(|c| &c.items)
        .filter_map(|item| item.id.as_u64())
        .max()
        .unwrap_or(0)
        + 1;

    let items: Vec<CheckItem> = rooms
        .iter()
        .enumerate()
        .map(|(i, room)| {
            let area = room
                .calculated_area
                .map(|a| format!("{} sq ft", format_thousands(a)))
                .unwrap_or_else(|| "area not measured".to_string());
            let classified = room.category != SpaceCategory::Unknown;
            CheckItem {
                id: serde_json::json!(next_id + i as u64),
                check: room.name.clone(),
                status: if classified {
                    CheckStatus::Pass
                } else {
                    CheckStatus::Warning
                },
                finding: format!("Classified as {} ({area})", room.category),
                blueprint: room.dimensions.clone(),
                policy: "Each space must be assigned a use category for lease cost allocation".to_string(),
                citation: "Indian Affairs Manual Part 80, Chapter 7, Section 1.7.B.2".to_string(),
                recommendation: (!classified)
                    .then(|| "Assign a space category before submitting the lease proposal".to_string()),
            }
        })
        .collect();

    let passed = items.iter().filter(|i| i.status == CheckStatus::Pass).count() as u32;
    let warned = items.len() as u32 - passed;
    report.summary.compliant += passed;
    report.summary.warnings += warned;
    report.summary.total_checks += items.len() as u32;

    let total_area: f32 = rooms.iter().filter_map(|r| r.calculated_area).sum();
    if total_area > 0.0 {
        report.blueprint.total_area = format!("{} sq ft", format_thousands(total_area));
    }

    report.results.push(CategoryResult {
        category: "Space Classification".to_string(),
        status: if warned > 0 {
            CategoryStatus::Warning
        } else {
            CategoryStatus::Compliant
        },
        items,
    });
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RoomRegistry;

    #[test]
    fn layouts_build_full_registries() {
        for layout in [Layout::CommunityCenter, Layout::DetentionCenter] {
            let records = layout_records(layout);
            let count = records.len();
            let registry = RoomRegistry::from_records(records, PX_PER_FOOT);
            assert_eq!(registry.len(), count);
        }
    }

    #[test]
    fn samples_decode_at_reference_size() {
        let sample = &SAMPLES[0];
        let decoded = image::load_from_memory(&sample.png).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (SAMPLE_SIZE, SAMPLE_SIZE));
        assert_eq!(sample.file_name(), "Community Center.png");
    }

    #[test]
    fn analysis_picks_layout_by_name() {
        let detention = analysis_for("Detention Center.png");
        assert!(detention.rooms.iter().any(|r| r.name.as_deref() == Some("Cell Block A")));
        let other = analysis_for("upload.pdf");
        assert!(other.rooms.iter().any(|r| r.name.as_deref() == Some("Gymnasium")));
        let totals = other.category_summary.expect("summary").totals_sq_ft;
        assert!(totals.get("PFSA Space").copied().unwrap_or(0.0) > 0.0);
    }

    #[test]
    fn report_reflects_room_categories() {
        let mut registry = RoomRegistry::from_records(layout_records(Layout::CommunityCenter), PX_PER_FOOT);
        let lobby = registry.rooms()[2].id;
        registry.update_type(lobby, SpaceCategory::Unknown);

        let report = report_for("plan.png", registry.rooms()).expect("report");
        assert_eq!(report.summary.total_checks, 13 + 6);
        assert_eq!(report.summary.compliant, 8 + 5);
        assert_eq!(report.summary.warnings, 2 + 1);
        let section = report.results.last().expect("section");
        assert_eq!(section.category, "Space Classification");
        assert_eq!(section.status, CategoryStatus::Warning);
        assert!(section.items[2].finding.starts_with("Classified as Unknown"));
        assert_eq!(section.items[0].id, serde_json::json!(10));
    }

    #[test]
    fn report_without_rooms_is_the_base_report() {
        let report = report_for("plan.png", &[]).expect("report");
        assert_eq!(report.score(), Some(62));
        assert_eq!(report.results.len(), 4);
    }
}
