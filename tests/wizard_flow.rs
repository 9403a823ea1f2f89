use std::time::{Duration, Instant};

use blueprint_studio::error::FlowError;
use blueprint_studio::flow::{JobKind, JobOutcome, ReportStatus};
use blueprint_studio::fixtures::SAMPLES;
use blueprint_studio::geometry::{Geometry, ShapeKind};
use blueprint_studio::mapper::Size;
use blueprint_studio::registry::GeometryEdit;
use blueprint_studio::room::SpaceCategory;
use blueprint_studio::service::{BlueprintService, FixtureService, StagedFile};
use blueprint_studio::{AppConfig, WizardController, WizardStep};

fn pump(wizard: &mut WizardController, service: &dyn BlueprintService, now: Instant) {
    loop {
        let jobs = wizard.take_jobs();
        if jobs.is_empty() {
            break;
        }
        for (ticket, job) in jobs {
            let outcome = job.run(service);
            wizard.resolve(ticket, outcome, now);
        }
    }
}

fn into_review(wizard: &mut WizardController, service: &dyn BlueprintService, now: Instant) {
    wizard.stage_file(SAMPLES[0].staged()).expect("stage sample");
    assert_eq!(wizard.step(), WizardStep::Attestation);
    wizard.set_attestation(true, true);
    wizard.submit_attestation();
    pump(wizard, service, now);
    wizard.tick(now + Duration::from_millis(600));
    assert_eq!(wizard.step(), WizardStep::Review);
}

#[test]
fn edited_category_reaches_the_report() {
    let service = FixtureService::default();
    let mut wizard = WizardController::new(AppConfig::default());
    let now = Instant::now();
    into_review(&mut wizard, &service, now);

    let groups = wizard.registry().group_by_category();
    let names = |category: SpaceCategory| -> Vec<&str> {
        groups
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, rooms)| rooms.iter().map(|r| r.name.as_str()).collect())
            .unwrap_or_default()
    };
    assert_eq!(names(SpaceCategory::PfsaSpace), vec!["Admin Office", "Classroom"]);
    assert_eq!(names(SpaceCategory::CommonSpace), vec!["Lobby", "Lounge"]);
    assert_eq!(names(SpaceCategory::SharedSpace), vec!["Gymnasium"]);
    assert_eq!(names(SpaceCategory::NonQualifiedSpace), vec!["Storage"]);
    assert!(names(SpaceCategory::Unknown).is_empty());
    let grouped: usize = groups.iter().map(|(_, rooms)| rooms.len()).sum();
    assert_eq!(grouped, wizard.registry().len());

    let lobby = wizard
        .registry()
        .rooms()
        .iter()
        .find(|r| r.name == "Lobby")
        .map(|r| r.id)
        .expect("lobby detected");
    wizard.record_edit();
    wizard
        .registry_mut()
        .update_type(lobby, SpaceCategory::PfsaSpace);
    wizard.registry_mut().update_label(lobby, "Tribal Services");

    let added = wizard.registry_mut().add(ShapeKind::Rect).id;
    wizard
        .registry_mut()
        .update_geometry(added, GeometryEdit::Translate { dx: 10.0, dy: 0.0 });

    wizard.generate_report();
    assert_eq!(wizard.step(), WizardStep::Report);
    assert_eq!(wizard.report_status(), Some(&ReportStatus::Generating));
    pump(&mut wizard, &service, now);

    let report = wizard.report().expect("report complete");
    let section = report
        .results
        .iter()
        .find(|c| c.category == "Space Classification")
        .expect("classification section");
    let renamed = section
        .items
        .iter()
        .find(|i| i.check == "Tribal Services")
        .expect("renamed room listed");
    assert!(renamed.finding.starts_with("Classified as PFSA Space"));
    assert!(section.items.iter().any(|i| i.check == "New Room"));
    assert!(wizard.report_view().is_expanded(&report.results[0].category));
    assert!(wizard.error_banner().is_none());
}

#[test]
fn reset_mid_analysis_ignores_late_result() {
    let service = FixtureService::default();
    let mut wizard = WizardController::new(AppConfig::default());
    let now = Instant::now();
    wizard
        .stage_file(StagedFile::new("plan.png", vec![1, 2, 3]))
        .expect("stage");
    wizard.set_attestation(true, true);
    wizard.submit_attestation();

    let (ticket, job) = wizard.take_jobs().remove(0);
    wizard.resolve(ticket, job.run(&service), now);
    assert_eq!(wizard.step(), WizardStep::Analyzing);
    let (analyze_ticket, analyze_job) = wizard.take_jobs().remove(0);
    assert_eq!(analyze_ticket.kind, JobKind::Analyze);

    wizard.tick(now + Duration::from_millis(1200));
    assert_eq!(wizard.progress(), 30);

    wizard.reset();
    assert_eq!(wizard.step(), WizardStep::Upload);
    assert!(wizard.file().is_none());

    let late = analyze_job.run(&service);
    assert!(!wizard.resolve(analyze_ticket, late, now));
    assert_eq!(wizard.step(), WizardStep::Upload);
    assert!(wizard.registry().is_empty());
    assert_eq!(wizard.progress(), 0);
    assert!(!wizard.tick(now + Duration::from_secs(10)));
}

#[test]
fn reset_mid_validation_ignores_late_approval() {
    let mut wizard = WizardController::new(AppConfig::default());
    let now = Instant::now();
    wizard
        .stage_file(StagedFile::new("plan.png", vec![1, 2, 3]))
        .expect("stage");
    wizard.set_attestation(true, true);
    wizard.submit_attestation();
    assert!(wizard.is_validating());
    let (ticket, _) = wizard.take_jobs().remove(0);
    assert_eq!(ticket.kind, JobKind::Validate);

    wizard.reset();
    assert!(!wizard.resolve(ticket, JobOutcome::Validated(Ok(true)), now));
    assert_eq!(wizard.step(), WizardStep::Upload);
    assert!(!wizard.is_validating());
    assert!(wizard.take_jobs().is_empty());
    assert!(!wizard.tick(now + Duration::from_secs(2)));
    assert_eq!(wizard.step(), WizardStep::Upload);
}

#[test]
fn reset_mid_report_ignores_late_report() {
    let service = FixtureService::default();
    let mut wizard = WizardController::new(AppConfig::default());
    let now = Instant::now();
    into_review(&mut wizard, &service, now);

    wizard.generate_report();
    let (ticket, job) = wizard.take_jobs().remove(0);
    assert_eq!(ticket.kind, JobKind::GenerateReport);
    let late = job.run(&service);
    assert!(matches!(late, JobOutcome::Reported(Ok(Some(_)))));

    wizard.reset();
    assert!(!wizard.resolve(ticket, late, now));
    assert_eq!(wizard.step(), WizardStep::Upload);
    assert!(wizard.report().is_none());
    assert!(wizard.report_status().is_none());
    assert!(wizard.registry().is_empty());
    assert!(wizard.error_banner().is_none());
}

#[test]
fn rejected_validation_stays_on_attestation() {
    let service = FixtureService {
        reject_validation: true,
        ..FixtureService::default()
    };
    let mut wizard = WizardController::new(AppConfig::default());
    let now = Instant::now();
    wizard
        .stage_file(StagedFile::new("plan.pdf", vec![b'%'; 64]))
        .expect("stage");
    wizard.set_attestation(true, true);
    wizard.submit_attestation();
    pump(&mut wizard, &service, now);

    assert_eq!(wizard.step(), WizardStep::Attestation);
    assert!(!wizard.is_validating());
    assert!(matches!(wizard.validation_error(), Some(FlowError::Validation(_))));
    assert!(wizard.can_submit_attestation());
}

#[test]
fn empty_report_payload_is_a_generation_failure() {
    let service = FixtureService {
        empty_report: true,
        ..FixtureService::default()
    };
    let mut wizard = WizardController::new(AppConfig::default());
    let now = Instant::now();
    into_review(&mut wizard, &service, now);

    wizard.generate_report();
    pump(&mut wizard, &service, now);
    assert_eq!(wizard.report_status(), Some(&ReportStatus::Failed));
    assert!(matches!(wizard.generation_error(), Some(FlowError::Generation(_))));
    assert!(wizard.error_banner().is_some());

    wizard.back_to_review();
    assert_eq!(wizard.step(), WizardStep::Review);
    assert!(!wizard.registry().is_empty());
}

#[test]
fn image_load_rescales_rooms_once() {
    let service = FixtureService::default();
    let mut wizard = WizardController::new(AppConfig::default());
    let now = Instant::now();
    into_review(&mut wizard, &service, now);

    let before = wizard.registry().rooms()[0].geometry.clone();
    wizard.image_loaded(Size::new(2048.0, 2048.0));
    wizard.image_loaded(Size::new(2048.0, 2048.0));
    let after = &wizard.registry().rooms()[0].geometry;
    match (before, after) {
        (Geometry::Rect { x: x0, w: w0, .. }, Geometry::Rect { x: x1, w: w1, .. }) => {
            assert_eq!(*x1, x0 * 2.0);
            assert_eq!(*w1, w0 * 2.0);
        }
        other => panic!("unexpected geometry {other:?}"),
    }
    assert_eq!(wizard.mapper().reference(), Size::new(2048.0, 2048.0));
}

#[test]
fn undo_restores_edited_rooms() {
    let service = FixtureService::default();
    let mut wizard = WizardController::new(AppConfig::default());
    let now = Instant::now();
    into_review(&mut wizard, &service, now);

    let count = wizard.registry().len();
    let first = wizard.registry().rooms()[0].id;
    wizard.record_edit();
    wizard.registry_mut().remove(first);
    assert_eq!(wizard.registry().len(), count - 1);

    wizard.undo();
    assert_eq!(wizard.registry().len(), count);
    wizard.redo();
    assert_eq!(wizard.registry().len(), count - 1);
}
