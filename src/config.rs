use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::mapper::{Size, ZoomLimits};
use crate::overlay::OverlayPaint;

pub const API_URL_ENV: &str = "BLUEPRINT_API_URL";
pub const USE_FIXTURES_ENV: &str = "BLUEPRINT_USE_FIXTURES";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub use_fixtures: bool,
    pub reference_size: Size,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub zoom_step: f32,
    pub px_per_foot: f32,
    pub progress_interval_ms: u64,
    pub progress_step: u8,
    pub progress_stall: u8,
    pub advance_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub pass_threshold: u32,
    pub max_upload_mb: f32,
    pub overlay: OverlayPaint,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://ocelot-compliance-app-api.vercel.app/api".to_string(),
            use_fixtures: false,
            reference_size: Size::default(),
            min_zoom: 0.5,
            max_zoom: 5.0,
            zoom_step: 1.2,
            px_per_foot: 4.5,
            progress_interval_ms: 400,
            progress_step: 10,
            progress_stall: 90,
            advance_delay_ms: 500,
            request_timeout_secs: 120,
            pass_threshold: 80,
            max_upload_mb: 10.0,
            overlay: OverlayPaint::default(),
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "ocelot", "blueprint-studio")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Reads `path` if it exists, otherwise starts from defaults. Environment overrides win.
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) if path.exists() => {
                let text = std::fs::read_to_string(path)?;
                serde_json::from_str::<AppConfig>(&text)?
            }
            _ => AppConfig::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::default_path().as_deref())
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(flag) = lookup(USE_FIXTURES_ENV) {
            self.use_fixtures = matches!(flag.trim(), "1" | "true" | "yes" | "on");
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.reference_size.is_valid() {
            return Err(ConfigError::Invalid("reference_size must be positive".to_string()));
        }
        if !(self.min_zoom > 0.0 && self.min_zoom <= 1.0 && self.max_zoom >= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "zoom range {}..{} must include 1.0",
                self.min_zoom, self.max_zoom
            )));
        }
        if self.zoom_step <= 1.0 {
            return Err(ConfigError::Invalid("zoom_step must be > 1".to_string()));
        }
        if self.px_per_foot <= 0.0 {
            return Err(ConfigError::Invalid("px_per_foot must be positive".to_string()));
        }
        if self.progress_stall >= 100 || self.progress_step == 0 {
            return Err(ConfigError::Invalid(
                "progress_stall must be < 100 and progress_step > 0".to_string(),
            ));
        }
        if !self.overlay.opacities_valid() {
            return Err(ConfigError::Invalid(
                "overlay opacities must be within 0..=1 and stroke ratios non-negative"
                    .to_string(),
            ));
        }
        Ok(())
    }

    pub fn zoom_limits(&self) -> ZoomLimits {
        ZoomLimits {
            min: self.min_zoom,
            max: self.max_zoom,
            step: self.zoom_step,
        }
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms.max(1))
    }

    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = AppConfig::load_from(Some(&dir.path().join("absent.json"))).expect("load");
        assert_eq!(config.px_per_foot, 4.5);
        assert_eq!(config.zoom_limits(), ZoomLimits::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"px_per_foot": 6.0, "max_zoom": 8.0}"#).expect("write");
        let config = AppConfig::load_from(Some(&path)).expect("load");
        assert_eq!(config.px_per_foot, 6.0);
        assert_eq!(config.max_zoom, 8.0);
        assert_eq!(config.progress_stall, 90);
    }

    #[test]
    fn overlay_paint_is_configurable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"overlay": {"fill_opacity": 0.3}}"#).expect("write");
        let config = AppConfig::load_from(Some(&path)).expect("load");
        assert_eq!(config.overlay.fill_opacity, 0.3);
        assert_eq!(config.overlay.selected_fill_opacity, 0.8);

        std::fs::write(&path, r#"{"overlay": {"dimmed_fill_opacity": 2.0}}"#).expect("write");
        assert!(matches!(
            AppConfig::load_from(Some(&path)),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"progress_stall": 100}"#).expect("write");
        assert!(matches!(
            AppConfig::load_from(Some(&path)),
            Err(ConfigError::Invalid(_))
        ));
        std::fs::write(&path, "not json").expect("write");
        assert!(matches!(
            AppConfig::load_from(Some(&path)),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config.apply_env(|key| match key {
            API_URL_ENV => Some("http://localhost:3000/api/".to_string()),
            USE_FIXTURES_ENV => Some("true".to_string()),
            _ => None,
        });
        assert_eq!(config.api_base_url, "http://localhost:3000/api");
        assert!(config.use_fixtures);
    }
}
