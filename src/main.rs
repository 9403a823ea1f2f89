use std::sync::Arc;

use anyhow::Context;
use blueprint_studio::service::{BlueprintService, FixtureService, HttpService};
use blueprint_studio::{AppConfig, BlueprintApp};
use eframe::{egui, NativeOptions};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load().context("loading configuration")?;
    let service: Arc<dyn BlueprintService> = if config.use_fixtures {
        tracing::info!("using built-in fixtures instead of the compliance API");
        Arc::new(FixtureService::default())
    } else {
        tracing::info!(url = %config.api_base_url, "using compliance API");
        Arc::new(
            HttpService::new(&config.api_base_url, config.request_timeout())
                .context("building HTTP client")?,
        )
    };

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_resizable(true)
            .with_inner_size([1440.0, 900.0])
            .with_min_inner_size([960.0, 640.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Blueprint Compliance Studio",
        options,
        Box::new(move |cc| Ok(Box::new(BlueprintApp::new(cc, config, service)))),
    )
    .map_err(|err| anyhow::anyhow!("window failed: {err}"))
}
