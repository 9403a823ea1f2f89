//! The upload → attestation → analysis → review → report wizard.
//!
//! All state lives here and is mutated only on the UI thread. Service calls leave through an
//! outbox of ticketed [`Job`]s and come back through [`WizardController::resolve`]; a ticket
//! from an earlier session is ignored, which is how a reset cancels work already in flight.

use std::time::{Duration, Instant};

use itertools::Itertools;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{FlowError, ServiceError};
use crate::history::EditHistory;
use crate::mapper::{CoordinateMapper, Size, ViewTransform, ZoomLimits};
use crate::registry::RoomRegistry;
use crate::report::{ComplianceReport, ReportView};
use crate::room::{Room, SpaceCategory};
use crate::service::{
    AnalysisPayload, BlueprintService, CategorySummary, StagedFile, ACCEPTED_EXTENSIONS,
};

const VALIDATION_REJECTED: &str =
    "Blueprint validation failed. Please ensure the file is a valid facility blueprint.";
const EMPTY_REPORT: &str = "Report generation returned no report. Please try again.";

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, strum::Display, strum::EnumIter, strum::AsRefStr,
)]
pub enum WizardStep {
    Upload,
    Attestation,
    #[strum(serialize = "Analysis")]
    Analyzing,
    Review,
    Report,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum JobKind {
    #[strum(serialize = "validate")]
    Validate,
    #[strum(serialize = "analyze")]
    Analyze,
    #[strum(serialize = "generate-report")]
    GenerateReport,
}

/// Identifies which session and which request a result belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket {
    pub generation: u64,
    pub kind: JobKind,
}

#[derive(Clone, Debug)]
pub enum Job {
    Validate(StagedFile),
    Analyze(StagedFile),
    GenerateReport(StagedFile, Vec<Room>),
}

impl Job {
    pub fn kind(&self) -> JobKind {
        match self {
            Job::Validate(_) => JobKind::Validate,
            Job::Analyze(_) => JobKind::Analyze,
            Job::GenerateReport(..) => JobKind::GenerateReport,
        }
    }

    /// Blocking; call from a worker thread or a test.
    pub fn run(&self, service: &dyn BlueprintService) -> JobOutcome {
        match self {
            Job::Validate(file) => JobOutcome::Validated(service.validate(file)),
            Job::Analyze(file) => JobOutcome::Analyzed(service.analyze(file)),
            Job::GenerateReport(file, rooms) => {
                JobOutcome::Reported(service.generate_report(file, rooms))
            }
        }
    }
}

#[derive(Debug)]
pub enum JobOutcome {
    Validated(Result<bool, ServiceError>),
    Analyzed(Result<AnalysisPayload, ServiceError>),
    Reported(Result<Option<ComplianceReport>, ServiceError>),
}

impl JobOutcome {
    pub fn failed(kind: JobKind, err: ServiceError) -> Self {
        match kind {
            JobKind::Validate => JobOutcome::Validated(Err(err)),
            JobKind::Analyze => JobOutcome::Analyzed(Err(err)),
            JobKind::GenerateReport => JobOutcome::Reported(Err(err)),
        }
    }

    fn kind(&self) -> JobKind {
        match self {
            JobOutcome::Validated(_) => JobKind::Validate,
            JobOutcome::Analyzed(_) => JobKind::Analyze,
            JobOutcome::Reported(_) => JobKind::GenerateReport,
        }
    }
}

/// Cosmetic progress while detection runs: climbs in steps and stalls short of done.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProgressTicker {
    value: u8,
    next_at: Instant,
    interval: Duration,
    step: u8,
    stall: u8,
}

impl ProgressTicker {
    pub fn start(now: Instant, interval: Duration, step: u8, stall: u8) -> Self {
        Self {
            value: 0,
            next_at: now + interval,
            interval,
            step,
            stall,
        }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        let before = self.value;
        while now >= self.next_at {
            self.next_at += self.interval;
            if self.value >= self.stall {
                continue;
            }
            self.value = self.value.saturating_add(self.step).min(self.stall);
        }
        self.value != before
    }

    pub fn next_at(&self) -> Instant {
        self.next_at
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReportStatus {
    Generating,
    Failed,
    Complete(Box<ComplianceReport>),
}

/// Rejects files the service would refuse before any request is made.
pub fn check_upload(file: &StagedFile, max_mb: f32) -> Result<(), FlowError> {
    let ext = file.extension().unwrap_or_default();
    if !ACCEPTED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(FlowError::Validation(format!(
            "Unsupported file type \"{}\". Upload a PDF, PNG or JPG blueprint.",
            file.name
        )));
    }
    if file.bytes.is_empty() {
        return Err(FlowError::Validation(format!("{} is empty.", file.name)));
    }
    if file.size_mb() > max_mb {
        return Err(FlowError::Validation(format!(
            "{} is {:.2} MB; the limit is {max_mb} MB.",
            file.name,
            file.size_mb()
        )));
    }
    Ok(())
}

pub struct WizardController {
    config: AppConfig,
    session_id: Uuid,
    generation: u64,
    step: WizardStep,
    file: Option<StagedFile>,
    attest_title: bool,
    attest_operation: bool,
    validating: bool,
    progress: u8,
    ticker: Option<ProgressTicker>,
    advance_at: Option<Instant>,
    awaiting: Option<JobKind>,
    outbox: Vec<(Ticket, Job)>,
    registry: RoomRegistry,
    history: EditHistory,
    mapper: CoordinateMapper,
    view: ViewTransform,
    highlight: Option<SpaceCategory>,
    category_summary: Option<CategorySummary>,
    report: Option<ReportStatus>,
    report_view: ReportView,
    validation_error: Option<FlowError>,
    analysis_error: Option<FlowError>,
    generation_error: Option<FlowError>,
}

impl WizardController {
    pub fn new(config: AppConfig) -> Self {
        let session_id = Uuid::new_v4();
        tracing::info!(session = %session_id, "wizard session started");
        Self {
            session_id,
            generation: 0,
            step: WizardStep::Upload,
            file: None,
            attest_title: false,
            attest_operation: false,
            validating: false,
            progress: 0,
            ticker: None,
            advance_at: None,
            awaiting: None,
            outbox: vec![],
            registry: RoomRegistry::new(config.px_per_foot),
            history: EditHistory::default(),
            mapper: CoordinateMapper::new(config.reference_size),
            view: ViewTransform::default(),
            highlight: None,
            category_summary: None,
            report: None,
            report_view: ReportView::default(),
            validation_error: None,
            analysis_error: None,
            generation_error: None,
            config,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn file(&self) -> Option<&StagedFile> {
        self.file.as_ref()
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn is_validating(&self) -> bool {
        self.validating
    }

    pub fn is_busy(&self) -> bool {
        self.awaiting.is_some()
    }

    pub fn attestation(&self) -> (bool, bool) {
        (self.attest_title, self.attest_operation)
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut RoomRegistry {
        &mut self.registry
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn zoom_limits(&self) -> ZoomLimits {
        self.config.zoom_limits()
    }

    pub fn zoom_in(&mut self) {
        self.view.zoom_in(self.config.zoom_limits());
    }

    pub fn zoom_out(&mut self) {
        self.view.zoom_out(self.config.zoom_limits());
    }

    pub fn reset_view(&mut self) {
        self.view.reset();
    }

    /// Pans by a drag measured in screen pixels.
    pub fn pan_by_screen(&mut self, dx: f32, dy: f32) {
        let (px, py) = self.mapper.screen_delta_to_pan(dx, dy);
        self.view.pan_by(px, py);
    }

    pub fn set_display_size(&mut self, display: Size) {
        self.mapper.set_display(display);
    }

    /// Called once the blueprint preview has been decoded.
    pub fn image_loaded(&mut self, natural: Size) {
        if self.mapper.adopt_image(natural, &mut self.registry) {
            tracing::info!(
                session = %self.session_id,
                width = natural.width,
                height = natural.height,
                "adopted blueprint image as reference space"
            );
        }
    }

    pub fn highlight(&self) -> Option<SpaceCategory> {
        self.highlight
    }

    /// Selecting the active category again clears the filter.
    pub fn toggle_highlight(&mut self, category: SpaceCategory) {
        self.highlight = match self.highlight {
            Some(current) if current == category => None,
            _ => Some(category),
        };
    }

    pub fn category_summary(&self) -> Option<&CategorySummary> {
        self.category_summary.as_ref()
    }

    /// Service-reported total for a category, or the sum of room areas when none was sent.
    pub fn category_total(&self, category: SpaceCategory) -> f32 {
        let reported = self.category_summary.as_ref().and_then(|summary| {
            summary
                .totals_sq_ft
                .iter()
                .filter(|(label, _)| SpaceCategory::from_label(label) == category)
                .map(|(_, total)| *total)
                .reduce(|a, b| a + b)
        });
        reported.unwrap_or_else(|| self.registry.category_area(category))
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    /// Snapshot the rooms before a user edit so it can be undone.
    pub fn record_edit(&mut self) {
        self.history.push(self.registry.snapshot());
    }

    pub fn undo(&mut self) {
        if let Some(rooms) = self.history.undo(self.registry.snapshot()) {
            self.registry.restore(rooms);
        }
    }

    pub fn redo(&mut self) {
        if let Some(rooms) = self.history.redo(self.registry.snapshot()) {
            self.registry.restore(rooms);
        }
    }

    pub fn set_px_per_foot(&mut self, px_per_foot: f32) {
        self.registry.set_px_per_foot(px_per_foot);
    }

    pub fn report_status(&self) -> Option<&ReportStatus> {
        self.report.as_ref()
    }

    pub fn report(&self) -> Option<&ComplianceReport> {
        match &self.report {
            Some(ReportStatus::Complete(report)) => Some(report),
            _ => None,
        }
    }

    pub fn report_view(&self) -> &ReportView {
        &self.report_view
    }

    pub fn toggle_report_category(&mut self, category: &str) {
        self.report_view.toggle(category);
    }

    pub fn stage_file(&mut self, file: StagedFile) -> Result<(), FlowError> {
        if self.step != WizardStep::Upload {
            tracing::debug!(step = %self.step, "ignoring upload outside the upload step");
            return Ok(());
        }
        if let Err(err) = check_upload(&file, self.config.max_upload_mb) {
            tracing::warn!(session = %self.session_id, name = %file.name, %err, "upload rejected");
            self.validation_error = Some(err.clone());
            return Err(err);
        }
        tracing::info!(
            session = %self.session_id,
            name = %file.name,
            size_mb = file.size_mb(),
            "blueprint staged"
        );
        self.validation_error = None;
        self.analysis_error = None;
        self.generation_error = None;
        self.attest_title = false;
        self.attest_operation = false;
        self.file = Some(file);
        self.step = WizardStep::Attestation;
        Ok(())
    }

    /// Sends the file kept after a failed analysis back through attestation.
    pub fn retry_staged(&mut self) -> bool {
        if self.step != WizardStep::Upload || self.file.is_none() {
            return false;
        }
        tracing::info!(session = %self.session_id, "retrying staged blueprint");
        self.analysis_error = None;
        self.attest_title = false;
        self.attest_operation = false;
        self.step = WizardStep::Attestation;
        true
    }

    pub fn set_attestation(&mut self, title: bool, operation: bool) {
        self.attest_title = title;
        self.attest_operation = operation;
    }

    pub fn can_submit_attestation(&self) -> bool {
        self.step == WizardStep::Attestation
            && self.attest_title
            && self.attest_operation
            && !self.validating
            && self.file.is_some()
    }

    pub fn submit_attestation(&mut self) {
        if !self.can_submit_attestation() {
            return;
        }
        let Some(file) = self.file.clone() else {
            return;
        };
        self.validation_error = None;
        self.validating = true;
        self.issue(Job::Validate(file));
    }

    pub fn generate_report(&mut self) {
        if self.step != WizardStep::Review || self.awaiting.is_some() {
            return;
        }
        let Some(file) = self.file.clone() else {
            return;
        };
        let rooms = self.registry.snapshot();
        tracing::info!(session = %self.session_id, rooms = rooms.len(), "requesting report");
        self.generation_error = None;
        self.report = Some(ReportStatus::Generating);
        self.step = WizardStep::Report;
        self.issue(Job::GenerateReport(file, rooms));
    }

    /// Returns from a failed or finished report to the editable review.
    pub fn back_to_review(&mut self) {
        if self.step != WizardStep::Report || self.awaiting.is_some() {
            return;
        }
        self.report = None;
        self.step = WizardStep::Review;
    }

    pub fn reset(&mut self) {
        let config = self.config.clone();
        let generation = self.generation + 1;
        *self = Self::new(config);
        self.generation = generation;
    }

    fn issue(&mut self, job: Job) {
        let ticket = Ticket {
            generation: self.generation,
            kind: job.kind(),
        };
        tracing::info!(session = %self.session_id, kind = %ticket.kind, "job issued");
        self.awaiting = Some(ticket.kind);
        self.outbox.push((ticket, job));
    }

    pub fn take_jobs(&mut self) -> Vec<(Ticket, Job)> {
        std::mem::take(&mut self.outbox)
    }

    /// Applies a finished job. Returns false when the result was stale and ignored.
    pub fn resolve(&mut self, ticket: Ticket, outcome: JobOutcome, now: Instant) -> bool {
        if ticket.generation != self.generation
            || self.awaiting != Some(ticket.kind)
            || outcome.kind() != ticket.kind
        {
            tracing::warn!(
                session = %self.session_id,
                kind = %ticket.kind,
                generation = ticket.generation,
                current = self.generation,
                "discarding stale result"
            );
            return false;
        }
        self.awaiting = None;

        match outcome {
            JobOutcome::Validated(result) => self.on_validated(result, now),
            JobOutcome::Analyzed(result) => self.on_analyzed(result, now),
            JobOutcome::Reported(result) => self.on_reported(result),
        }
        true
    }

    fn on_validated(&mut self, result: Result<bool, ServiceError>, now: Instant) {
        self.validating = false;
        match result {
            Ok(true) => {
                tracing::info!(session = %self.session_id, "blueprint validated");
                let Some(file) = self.file.clone() else {
                    return;
                };
                self.step = WizardStep::Analyzing;
                self.progress = 0;
                self.ticker = Some(ProgressTicker::start(
                    now,
                    self.config.progress_interval(),
                    self.config.progress_step,
                    self.config.progress_stall,
                ));
                self.issue(Job::Analyze(file));
            }
            Ok(false) => {
                tracing::warn!(session = %self.session_id, "blueprint rejected by validator");
                self.validation_error = Some(FlowError::Validation(VALIDATION_REJECTED.to_string()));
            }
            Err(err) => {
                tracing::error!(session = %self.session_id, %err, "validation request failed");
                self.validation_error =
                    Some(FlowError::Validation(format!("Validation request failed: {err}")));
            }
        }
    }

    fn on_analyzed(&mut self, result: Result<AnalysisPayload, ServiceError>, now: Instant) {
        self.ticker = None;
        match result {
            Ok(payload) => {
                let detected = payload.rooms.len();
                self.registry = RoomRegistry::from_records(payload.rooms, self.config.px_per_foot);
                self.mapper = CoordinateMapper::new(
                    payload
                        .image_metadata
                        .filter(Size::is_valid)
                        .unwrap_or(self.config.reference_size),
                );
                self.view.reset();
                self.highlight = None;
                self.history.clear();
                self.category_summary = payload.category_summary;
                self.analysis_error = None;
                self.progress = 100;
                self.advance_at = Some(now + self.config.advance_delay());
                tracing::info!(
                    session = %self.session_id,
                    detected,
                    kept = self.registry.len(),
                    "analysis complete"
                );
            }
            Err(err) => {
                tracing::error!(session = %self.session_id, %err, "analysis failed");
                self.progress = 0;
                self.advance_at = None;
                self.step = WizardStep::Upload;
                self.analysis_error = Some(FlowError::Analysis(format!("Analysis failed: {err}")));
            }
        }
    }

    fn on_reported(&mut self, result: Result<Option<ComplianceReport>, ServiceError>) {
        match result {
            Ok(Some(report)) => {
                tracing::info!(
                    session = %self.session_id,
                    score = %report.score_label(),
                    categories = report.results.len(),
                    "report ready"
                );
                self.report_view = ReportView::for_report(&report);
                self.report = Some(ReportStatus::Complete(Box::new(report)));
            }
            Ok(None) => {
                tracing::error!(session = %self.session_id, "report payload was empty");
                self.report = Some(ReportStatus::Failed);
                self.generation_error = Some(FlowError::Generation(EMPTY_REPORT.to_string()));
            }
            Err(err) => {
                tracing::error!(session = %self.session_id, %err, "report generation failed");
                self.report = Some(ReportStatus::Failed);
                self.generation_error = Some(FlowError::Generation(format!(
                    "Report generation failed: {err}"
                )));
            }
        }
    }

    /// Advances timers. Returns true while something time-driven is still pending.
    pub fn tick(&mut self, now: Instant) -> bool {
        if let Some(ticker) = &mut self.ticker {
            ticker.tick(now);
            self.progress = ticker.value();
        }
        if let Some(at) = self.advance_at {
            if now >= at {
                self.advance_at = None;
                if self.step == WizardStep::Analyzing {
                    self.step = WizardStep::Review;
                    tracing::info!(session = %self.session_id, rooms = self.registry.len(), "entering review");
                }
            }
        }
        self.ticker.is_some() || self.advance_at.is_some()
    }

    /// Earliest instant at which [`Self::tick`] would change something.
    pub fn next_deadline(&self) -> Option<Instant> {
        let ticker = self.ticker.map(|t| t.next_at());
        match (ticker, self.advance_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn validation_error(&self) -> Option<&FlowError> {
        self.validation_error.as_ref()
    }

    pub fn analysis_error(&self) -> Option<&FlowError> {
        self.analysis_error.as_ref()
    }

    pub fn generation_error(&self) -> Option<&FlowError> {
        self.generation_error.as_ref()
    }

    pub fn clear_validation_error(&mut self) {
        self.validation_error = None;
    }

    pub fn clear_analysis_error(&mut self) {
        self.analysis_error = None;
    }

    pub fn clear_generation_error(&mut self) {
        self.generation_error = None;
    }

    pub fn clear_errors(&mut self) {
        self.clear_validation_error();
        self.clear_analysis_error();
        self.clear_generation_error();
    }

    /// Every present error, in validate/analyze/generate order.
    pub fn error_banner(&self) -> Option<String> {
        let banner = [
            &self.validation_error,
            &self.analysis_error,
            &self.generation_error,
        ]
        .into_iter()
        .flatten()
        .map(ToString::to_string)
        .join(" • ");
        (!banner.is_empty()).then_some(banner)
    }
}
