//! Boundary to the validation, detection and report endpoints.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::{multipart, Client};
use serde::Deserialize;

use crate::error::ServiceError;
use crate::fixtures;
use crate::mapper::Size;
use crate::report::{parse_report_payload, ComplianceReport};
use crate::room::{Room, RoomRecord};

pub const ACCEPTED_EXTENSIONS: [&str; 4] = ["pdf", "png", "jpg", "jpeg"];

/// A blueprint held in memory between upload and report generation.
#[derive(Clone, Debug, PartialEq)]
pub struct StagedFile {
    pub name: String,
    pub bytes: Arc<Vec<u8>>,
}

impl StagedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes: Arc::new(bytes),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ServiceError> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "blueprint".to_string());
        Ok(Self::new(name, bytes))
    }

    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }

    pub fn is_pdf(&self) -> bool {
        self.extension().as_deref() == Some("pdf")
    }

    pub fn size_mb(&self) -> f32 {
        self.bytes.len() as f32 / (1024.0 * 1024.0)
    }

    pub fn mime(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("pdf") => "application/pdf",
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            _ => "application/octet-stream",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct CategorySummary {
    #[serde(default)]
    pub totals_sq_ft: BTreeMap<String, f32>,
}

/// Detection result: rooms in reference coordinates plus optional sizing metadata.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct AnalysisPayload {
    #[serde(default, deserialize_with = "crate::room::lenient_records")]
    pub rooms: Vec<RoomRecord>,
    #[serde(default, alias = "imageMetadata")]
    pub image_metadata: Option<Size>,
    #[serde(default)]
    pub category_summary: Option<CategorySummary>,
}

pub trait BlueprintService: Send + Sync {
    fn validate(&self, file: &StagedFile) -> Result<bool, ServiceError>;

    fn analyze(&self, file: &StagedFile) -> Result<AnalysisPayload, ServiceError>;

    /// `Ok(None)` when the service answered but produced no report.
    fn generate_report(
        &self,
        file: &StagedFile,
        rooms: &[Room],
    ) -> Result<Option<ComplianceReport>, ServiceError>;
}

#[derive(Deserialize)]
struct ValidateResponse {
    #[serde(default)]
    result: bool,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

pub struct HttpService {
    base_url: String,
    client: Client,
}

impl HttpService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn file_part(file: &StagedFile) -> Result<multipart::Part, ServiceError> {
        Ok(multipart::Part::bytes(file.bytes.as_ref().clone())
            .file_name(file.name.clone())
            .mime_str(file.mime())?)
    }

    fn post(&self, endpoint: &str, form: multipart::Form) -> Result<serde_json::Value, ServiceError> {
        let url = format!("{}/{endpoint}", self.base_url);
        tracing::debug!(%url, "posting blueprint");
        let resp = self.client.post(&url).multipart(form).send()?;
        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.message.or(b.error))
                .unwrap_or_else(|| {
                    format!(
                        "{endpoint} failed: {}",
                        status.canonical_reason().unwrap_or("unknown status")
                    )
                });
            return Err(ServiceError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

impl BlueprintService for HttpService {
    fn validate(&self, file: &StagedFile) -> Result<bool, ServiceError> {
        let form = multipart::Form::new().part("file", Self::file_part(file)?);
        let value = self.post("validate", form)?;
        Ok(serde_json::from_value::<ValidateResponse>(value)?.result)
    }

    fn analyze(&self, file: &StagedFile) -> Result<AnalysisPayload, ServiceError> {
        let form = multipart::Form::new().part("file", Self::file_part(file)?);
        Ok(serde_json::from_value(self.post("analyze", form)?)?)
    }

    fn generate_report(
        &self,
        file: &StagedFile,
        rooms: &[Room],
    ) -> Result<Option<ComplianceReport>, ServiceError> {
        let records: Vec<RoomRecord> = rooms.iter().map(Room::to_record).collect();
        let form = multipart::Form::new()
            .part("file", Self::file_part(file)?)
            .text("rooms", serde_json::to_string(&records)?);
        Ok(parse_report_payload(self.post("generate-report", form)?)?)
    }
}

/// Offline stand-in that answers from the built-in fixtures.
#[derive(Clone, Debug, Default)]
pub struct FixtureService {
    pub reject_validation: bool,
    pub fail_analysis: bool,
    pub empty_report: bool,
}

impl BlueprintService for FixtureService {
    fn validate(&self, file: &StagedFile) -> Result<bool, ServiceError> {
        tracing::debug!(name = %file.name, "fixture validate");
        Ok(!self.reject_validation)
    }

    fn analyze(&self, file: &StagedFile) -> Result<AnalysisPayload, ServiceError> {
        if self.fail_analysis {
            return Err(ServiceError::Status {
                status: 500,
                message: "Room detection failed".to_string(),
            });
        }
        Ok(fixtures::analysis_for(&file.name))
    }

    fn generate_report(
        &self,
        file: &StagedFile,
        rooms: &[Room],
    ) -> Result<Option<ComplianceReport>, ServiceError> {
        if self.empty_report {
            return Ok(parse_report_payload(serde_json::json!({ "report": null }))?);
        }
        Ok(Some(fixtures::report_for(&file.name, rooms)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_file_metadata() {
        let file = StagedFile::new("Plan.JPG", vec![0; 2 * 1024 * 1024]);
        assert_eq!(file.extension().as_deref(), Some("jpg"));
        assert_eq!(file.mime(), "image/jpeg");
        assert!((file.size_mb() - 2.0).abs() < 1e-6);
        assert!(!file.is_pdf());
    }

    #[test]
    fn analysis_payload_accepts_both_metadata_spellings() {
        let camel: AnalysisPayload = serde_json::from_str(
            r#"{"rooms": [], "imageMetadata": {"width": 2000, "height": 1500}}"#,
        )
        .expect("camel");
        let snake: AnalysisPayload = serde_json::from_str(
            r#"{"rooms": [], "image_metadata": {"width": 2000, "height": 1500},
                "category_summary": {"totals_sq_ft": {"PFSA Space": 1200}}}"#,
        )
        .expect("snake");
        assert_eq!(camel.image_metadata, Some(Size::new(2000.0, 1500.0)));
        assert_eq!(camel.image_metadata, snake.image_metadata);
        assert_eq!(
            snake
                .category_summary
                .and_then(|s| s.totals_sq_ft.get("PFSA Space").copied()),
            Some(1200.0)
        );
    }

    #[test]
    fn fixture_service_switches() {
        let file = StagedFile::new("plan.png", vec![1, 2, 3]);
        let ok = FixtureService::default();
        assert!(ok.validate(&file).expect("validate"));
        assert!(!ok.analyze(&file).expect("analyze").rooms.is_empty());

        let failing = FixtureService {
            reject_validation: true,
            fail_analysis: true,
            empty_report: true,
        };
        assert!(!failing.validate(&file).expect("validate"));
        assert!(matches!(
            failing.analyze(&file),
            Err(ServiceError::Status { status: 500, .. })
        ));
        assert!(failing.generate_report(&file, &[]).expect("report").is_none());
    }

    #[test]
    fn malformed_room_records_are_skipped_not_fatal() {
        let payload: AnalysisPayload = serde_json::from_str(
            r#"{"rooms": [
                {"id": 1, "name": "Office", "category": "PFSA Space",
                 "coords": {"x": 10, "y": 10, "w": 90, "h": 90}},
                {"id": 2, "name": "Bent", "shape_type": "polygon",
                 "points": [[0, 0], [10, 0, 3], [10, 10]]},
                {"id": {"nested": true}, "name": "Odd"},
                "not a room"
            ]}"#,
        )
        .expect("payload still decodes");
        assert_eq!(payload.rooms.len(), 1);

        let registry = crate::registry::RoomRegistry::from_records(payload.rooms, 4.5);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.rooms()[0].name, "Office");
    }

    #[test]
    fn null_rooms_is_an_empty_detection() {
        let payload: AnalysisPayload = serde_json::from_str(r#"{"rooms": null}"#).expect("payload");
        assert!(payload.rooms.is_empty());
    }
}
