use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::{
    egui::{self, Color32},
    App, CreationContext, Frame,
};

use crate::canvas::CanvasState;
use crate::config::AppConfig;
use crate::flow::{WizardController, WizardStep};
use crate::preview::PreviewCache;
use crate::runner::JobRunner;
use crate::service::BlueprintService;

const ACCENT: Color32 = Color32::from_rgb(59, 130, 246);

pub struct BlueprintApp {
    pub(crate) wizard: WizardController,
    pub(crate) runner: JobRunner,
    pub(crate) preview: PreviewCache,
    pub(crate) canvas: CanvasState,
    pub(crate) status: String,
    pub(crate) scroll_to_selected: bool,
}

impl BlueprintApp {
    pub fn new(cc: &CreationContext<'_>, config: AppConfig, service: Arc<dyn BlueprintService>) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);
        Self::with_service(config, service)
    }

    pub fn with_service(config: AppConfig, service: Arc<dyn BlueprintService>) -> Self {
        Self {
            wizard: WizardController::new(config),
            runner: JobRunner::new(service),
            preview: PreviewCache::default(),
            canvas: CanvasState::default(),
            status: "Ready".to_string(),
            scroll_to_selected: false,
        }
    }

    pub(crate) fn accent(&self) -> Color32 {
        ACCENT
    }

    /// Sends queued jobs to workers and applies whatever has come back.
    fn pump_jobs(&mut self) {
        for (ticket, job) in self.wizard.take_jobs() {
            self.runner.dispatch(ticket, job);
        }
        while let Some((ticket, outcome)) = self.runner.try_recv() {
            let step = self.wizard.step();
            if self.wizard.resolve(ticket, outcome, Instant::now()) && self.wizard.step() != step {
                self.status = format!("{} → {}", step, self.wizard.step());
            }
        }
        // resolving may have queued the next call
        for (ticket, job) in self.wizard.take_jobs() {
            self.runner.dispatch(ticket, job);
        }
    }

    fn apply_style(&self, ctx: &egui::Context) {
        let accent = self.accent();
        let mut style = (*ctx.style()).clone();
        style.spacing.item_spacing = egui::vec2(6.0, 6.0);
        style.visuals.window_fill = Color32::from_rgb(18, 23, 34);
        style.visuals.panel_fill = Color32::from_rgb(18, 23, 34);
        style.visuals.widgets.noninteractive.bg_fill =
            Color32::from_rgba_unmultiplied(255, 255, 255, 10);
        style.visuals.override_text_color = Some(Color32::from_rgb(226, 233, 242));
        style.visuals.extreme_bg_color = Color32::from_rgb(9, 12, 20);
        style.visuals.widgets.inactive.bg_fill = Color32::from_rgba_unmultiplied(28, 36, 49, 230);
        style.visuals.widgets.hovered.bg_fill =
            Color32::from_rgba_unmultiplied(accent.r(), accent.g(), accent.b(), 120);
        style.visuals.widgets.active.bg_fill = accent;
        style.visuals.selection.bg_fill =
            Color32::from_rgba_unmultiplied(accent.r(), accent.g(), accent.b(), 128);
        ctx.set_style(style);
    }
}

impl App for BlueprintApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.apply_style(ctx);
        self.pump_jobs();
        let now = Instant::now();
        let pending = self.wizard.tick(now);

        self.preview.sync(ctx, self.wizard.file());
        if self.wizard.step() == WizardStep::Review {
            if let Some(natural) = self.preview.natural_size() {
                self.wizard.image_loaded(natural);
            }
        }

        self.render(ctx);

        if self.runner.in_flight() > 0 || self.wizard.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(50));
        } else if pending {
            let wait = self
                .wizard
                .next_deadline()
                .map(|at| at.saturating_duration_since(now))
                .unwrap_or(Duration::from_millis(50));
            ctx.request_repaint_after(wait);
        }
    }
}
