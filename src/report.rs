//! Compliance report model as returned by the report service, and its presentation state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub compliant: u32,
    pub violations: u32,
    pub warnings: u32,
    pub total_checks: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub upload_date: String,
    #[serde(default)]
    pub facility_type: String,
    #[serde(default)]
    pub total_area: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
    Warning,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryStatus {
    Compliant,
    Violation,
    Warning,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckItem {
    pub id: serde_json::Value,
    pub check: String,
    pub status: CheckStatus,
    #[serde(default)]
    pub finding: String,
    #[serde(default)]
    pub blueprint: String,
    #[serde(default)]
    pub policy: String,
    #[serde(default)]
    pub citation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub category: String,
    pub status: CategoryStatus,
    #[serde(default)]
    pub items: Vec<CheckItem>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub summary: ReportSummary,
    #[serde(default)]
    pub blueprint: BlueprintInfo,
    #[serde(default)]
    pub results: Vec<CategoryResult>,
}

impl ComplianceReport {
    /// Percentage of compliant checks; `None` when no checks ran.
    pub fn score(&self) -> Option<u32> {
        let total = self.summary.total_checks;
        if total == 0 {
            return None;
        }
        Some((100.0 * self.summary.compliant as f64 / total as f64).round() as u32)
    }

    pub fn is_compliant(&self, threshold: u32) -> bool {
        self.score().is_some_and(|score| score >= threshold)
    }

    pub fn score_label(&self) -> String {
        self.score()
            .map(|s| format!("{s}%"))
            .unwrap_or_else(|| "N/A".to_string())
    }
}

/// Accepts `{ "report": {...} }` or a bare report. Null, false or a missing report is `None`.
pub fn parse_report_payload(value: serde_json::Value) -> Result<Option<ComplianceReport>, serde_json::Error> {
    let inner = match value {
        serde_json::Value::Object(mut map) if map.contains_key("report") => {
            map.remove("report").unwrap_or(serde_json::Value::Null)
        }
        other => other,
    };
    match inner {
        serde_json::Value::Null | serde_json::Value::Bool(false) => Ok(None),
        serde_json::Value::Object(ref map) if map.is_empty() => Ok(None),
        other => serde_json::from_value(other).map(Some),
    }
}

/// Which report categories are expanded. The first one starts open.
#[derive(Clone, Debug, Default)]
pub struct ReportView {
    expanded: BTreeSet<String>,
}

impl ReportView {
    pub fn for_report(report: &ComplianceReport) -> Self {
        let mut view = Self::default();
        if let Some(first) = report.results.first() {
            view.expanded.insert(first.category.clone());
        }
        view
    }

    pub fn is_expanded(&self, category: &str) -> bool {
        self.expanded.contains(category)
    }

    pub fn toggle(&mut self, category: &str) {
        if !self.expanded.remove(category) {
            self.expanded.insert(category.to_string());
        }
    }
}
