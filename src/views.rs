use eframe::egui::{self, Align2, Color32, FontId, RichText, Sense, Ui};
use eframe::epaint::Shadow;
use egui_extras::{Column, TableBuilder};
use rfd::FileDialog;
use strum::IntoEnumIterator;

use crate::app::BlueprintApp;
use crate::canvas;
use crate::fixtures::SAMPLES;
use crate::flow::{ReportStatus, WizardStep};
use crate::geometry::ShapeKind;
use crate::overlay::{category_color, format_thousands};
use crate::report::{CategoryStatus, CheckStatus, ComplianceReport};
use crate::room::{RoomId, SpaceCategory};
use crate::service::{StagedFile, ACCEPTED_EXTENSIONS};

const ANALYSIS_CHECKLIST: [(&str, u8); 5] = [
    ("Extracting blueprint features", 20),
    ("Detecting rooms and walls", 40),
    ("Classifying space use", 60),
    ("Retrieving relevant policies", 80),
    ("Checking space requirements", 95),
];

const PASS: Color32 = Color32::from_rgb(34, 197, 94);
const FAIL: Color32 = Color32::from_rgb(239, 68, 68);
const WARN: Color32 = Color32::from_rgb(234, 179, 8);

/// Deferred sidebar edits, applied after the registry borrow ends.
enum RoomAction {
    Select(RoomId),
    Rename(RoomId, String),
    Recategorize(RoomId, SpaceCategory),
    Remove(RoomId),
    ToggleHighlight(SpaceCategory),
}

fn check_icon(status: CheckStatus) -> (&'static str, Color32) {
    match status {
        CheckStatus::Pass => ("✔", PASS),
        CheckStatus::Fail => ("✖", FAIL),
        CheckStatus::Warning => ("⚠", WARN),
        CheckStatus::Unknown => ("?", Color32::GRAY),
    }
}

fn category_badge(status: CategoryStatus) -> (&'static str, Color32) {
    match status {
        CategoryStatus::Compliant => ("Compliant", PASS),
        CategoryStatus::Violation => ("Violation", FAIL),
        CategoryStatus::Warning => ("Warning", WARN),
        CategoryStatus::Unknown => ("Unknown", Color32::GRAY),
    }
}

impl BlueprintApp {
    pub(crate) fn surface_panel() -> egui::Frame {
        egui::Frame::default()
            .fill(Color32::from_rgba_unmultiplied(18, 23, 34, 236))
            .stroke(egui::Stroke::new(
                1.0,
                Color32::from_rgba_unmultiplied(255, 255, 255, 20),
            ))
            .rounding(egui::Rounding::same(8.0))
            .inner_margin(egui::Margin::same(14.0))
            .outer_margin(egui::Margin::same(2.0))
            .shadow(Shadow {
                offset: egui::vec2(0.0, 6.0),
                blur: 24.0,
                spread: 0.0,
                color: Color32::from_rgba_unmultiplied(0, 0, 0, 130),
            })
    }

    pub(crate) fn card_frame() -> egui::Frame {
        egui::Frame::default()
            .fill(Color32::from_rgba_unmultiplied(255, 255, 255, 7))
            .stroke(egui::Stroke::new(
                1.0,
                Color32::from_rgba_unmultiplied(255, 255, 255, 20),
            ))
            .rounding(egui::Rounding::same(8.0))
            .inner_margin(egui::Margin::same(8.0))
    }

    pub(crate) fn render(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("steps")
            .frame(Self::surface_panel())
            .show(ctx, |ui| {
                self.step_indicator(ui);
                self.error_banner(ui);
            });

        egui::TopBottomPanel::bottom("status")
            .frame(Self::surface_panel())
            .show(ctx, |ui| self.status_bar(ui));

        if self.wizard.step() == WizardStep::Review {
            egui::SidePanel::left("rooms")
                .resizable(true)
                .default_width(340.0)
                .frame(Self::surface_panel())
                .show(ctx, |ui| self.room_sidebar(ui));
        }

        egui::CentralPanel::default()
            .frame(Self::surface_panel().inner_margin(egui::Margin::same(18.0)))
            .show(ctx, |ui| {
                ui.set_width(ui.available_width());
                match self.wizard.step() {
                    WizardStep::Upload => self.upload_view(ui),
                    WizardStep::Attestation => self.attestation_view(ui),
                    WizardStep::Analyzing => self.analyzing_view(ui),
                    WizardStep::Review => self.review_view(ui),
                    WizardStep::Report => self.report_view(ui),
                }
            });
    }

    fn step_indicator(&self, ui: &mut Ui) {
        let current = self.wizard.step();
        ui.horizontal_wrapped(|ui| {
            ui.label(RichText::new("Blueprint Compliance").strong().size(16.0));
            ui.separator();
            for (i, step) in WizardStep::iter().enumerate() {
                let (fill, text) = if step == current {
                    (self.accent(), Color32::WHITE)
                } else if step < current {
                    (PASS, Color32::WHITE)
                } else {
                    (Color32::from_gray(60), Color32::from_gray(170))
                };
                let (rect, _) = ui.allocate_exact_size(egui::vec2(22.0, 22.0), Sense::hover());
                ui.painter().circle_filled(rect.center(), 11.0, fill);
                let mark = if step < current {
                    "✔".to_string()
                } else {
                    (i + 1).to_string()
                };
                ui.painter().text(
                    rect.center(),
                    Align2::CENTER_CENTER,
                    mark,
                    FontId::proportional(12.0),
                    text,
                );
                let label = RichText::new(step.as_ref());
                ui.label(if step == current { label.strong() } else { label.weak() });
                if i + 1 < WizardStep::iter().count() {
                    ui.label(RichText::new("›").weak());
                }
            }
        });
    }

    fn error_banner(&mut self, ui: &mut Ui) {
        let Some(message) = self.wizard.error_banner() else {
            return;
        };
        ui.add_space(6.0);
        egui::Frame::default()
            .fill(Color32::from_rgba_unmultiplied(239, 68, 68, 40))
            .stroke(egui::Stroke::new(1.0, FAIL))
            .rounding(egui::Rounding::same(6.0))
            .inner_margin(egui::Margin::same(8.0))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.horizontal(|ui| {
                    ui.label(RichText::new(message).color(Color32::from_rgb(254, 202, 202)));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("Dismiss").clicked() {
                            self.wizard.clear_errors();
                        }
                    });
                });
            });
    }

    fn status_bar(&self, ui: &mut Ui) {
        ui.horizontal_wrapped(|ui| {
            ui.label(self.status.as_str());
            if self.wizard.registry().is_empty() {
                return;
            }
            ui.separator();
            for (category, rooms) in self.wizard.registry().group_by_category() {
                if rooms.is_empty() {
                    continue;
                }
                ui.label(
                    RichText::new(format!("{category}: {}", rooms.len()))
                        .color(category_color(category)),
                );
            }
        });
    }

    fn stage(&mut self, file: StagedFile) {
        let name = file.name.clone();
        match self.wizard.stage_file(file) {
            Ok(()) => self.status = format!("Staged {name}"),
            Err(err) => self.status = err.to_string(),
        }
    }

    fn upload_view(&mut self, ui: &mut Ui) {
        ui.heading("Upload a facility blueprint");
        ui.label(
            RichText::new(format!(
                "Accepted: {} up to {} MB",
                ACCEPTED_EXTENSIONS.join(", ").to_uppercase(),
                self.wizard.config().max_upload_mb
            ))
            .color(Color32::from_gray(170)),
        );
        ui.add_space(12.0);

        if let Some(kept) = self.wizard.file().map(|f| f.name.clone()) {
            let retry = ui.horizontal(|ui| {
                ui.label(format!("Analysis of {kept} did not finish."));
                ui.button("Retry analysis").clicked()
            });
            if retry.inner && self.wizard.retry_staged() {
                self.status = format!("Retrying {kept}");
            }
            ui.add_space(8.0);
        }

        Self::card_frame().show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.vertical_centered(|ui| {
                ui.add_space(24.0);
                ui.label(RichText::new("Drop a blueprint here").size(18.0));
                ui.label(RichText::new("or").weak());
                if ui.button("Choose file…").clicked() {
                    if let Some(path) = FileDialog::new()
                        .add_filter("Blueprint", &ACCEPTED_EXTENSIONS)
                        .pick_file()
                    {
                        match StagedFile::from_path(&path) {
                            Ok(file) => self.stage(file),
                            Err(err) => self.status = format!("Upload failed: {err}"),
                        }
                    }
                }
                ui.add_space(24.0);
            });
        });

        let dropped = ui.ctx().input(|i| i.raw.dropped_files.clone());
        if let Some(drop) = dropped.into_iter().next() {
            let file = match (drop.bytes, drop.path) {
                (Some(bytes), _) => Ok(StagedFile::new(drop.name, bytes.to_vec())),
                (None, Some(path)) => StagedFile::from_path(&path),
                (None, None) => Ok(StagedFile::new(drop.name, vec![])),
            };
            match file {
                Ok(file) => self.stage(file),
                Err(err) => self.status = format!("Upload failed: {err}"),
            }
        }

        ui.add_space(16.0);
        ui.label(RichText::new("Or start from a sample").strong());
        ui.horizontal_wrapped(|ui| {
            for sample in SAMPLES.iter() {
                Self::card_frame().show(ui, |ui| {
                    ui.vertical(|ui| {
                        let thumb = egui::Image::from_bytes(
                            format!("bytes://sample/{}.png", sample.name),
                            sample.png.as_slice(),
                        )
                        .fit_to_exact_size(egui::vec2(180.0, 180.0));
                        let picked = ui.add(egui::ImageButton::new(thumb)).clicked()
                            | ui.button(sample.name).clicked();
                        if picked {
                            self.stage(sample.staged());
                        }
                    });
                });
            }
        });
    }

    fn file_card(&self, ui: &mut Ui) {
        let Some(file) = self.wizard.file() else {
            return;
        };
        Self::card_frame().show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                ui.label(RichText::new("📄").size(22.0));
                ui.vertical(|ui| {
                    ui.label(RichText::new(&file.name).strong());
                    ui.label(
                        RichText::new(format!("{:.2} MB", file.size_mb())).color(Color32::from_gray(170)),
                    );
                });
                if let Some(texture) = self.preview.texture() {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.add(egui::Image::new(texture).fit_to_exact_size(egui::vec2(96.0, 96.0)));
                    });
                }
            });
        });
    }

    fn attestation_view(&mut self, ui: &mut Ui) {
        ui.heading("Attestation");
        ui.add_space(8.0);
        self.file_card(ui);
        ui.add_space(12.0);

        let (mut title, mut operation) = self.wizard.attestation();
        Self::card_frame().show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(RichText::new("Before analysis, confirm the following:").strong());
            ui.checkbox(
                &mut title,
                "The tribe or tribal organization holds title to, or a leasehold interest in, this facility.",
            );
            ui.checkbox(
                &mut operation,
                "The facility is used to carry out programs under the funding agreement.",
            );
        });
        self.wizard.set_attestation(title, operation);

        ui.add_space(12.0);
        ui.horizontal(|ui| {
            if ui.button("Start over").clicked() {
                self.wizard.reset();
                self.status = "Reset".to_string();
            }
            let submit = ui.add_enabled(
                self.wizard.can_submit_attestation(),
                egui::Button::new(RichText::new("Validate & analyze").strong()),
            );
            if submit.clicked() {
                self.wizard.submit_attestation();
                self.status = "Validating blueprint…".to_string();
            }
            if self.wizard.is_validating() {
                ui.spinner();
                ui.label("Validating…");
            }
        });
    }

    fn analyzing_view(&mut self, ui: &mut Ui) {
        let progress = self.wizard.progress();
        ui.vertical_centered(|ui| {
            ui.add_space(40.0);
            ui.heading("Analyzing blueprint");
            ui.add_space(12.0);
            ui.add(
                egui::ProgressBar::new(progress as f32 / 100.0)
                    .desired_width(420.0)
                    .show_percentage()
                    .animate(progress < 100),
            );
            ui.add_space(16.0);
        });
        Self::card_frame().show(ui, |ui| {
            ui.set_width(ui.available_width());
            for (label, threshold) in ANALYSIS_CHECKLIST {
                let done = progress > threshold;
                ui.horizontal(|ui| {
                    if done {
                        ui.label(RichText::new("✔").color(PASS));
                        ui.label(label);
                    } else {
                        ui.spinner();
                        ui.label(RichText::new(label).weak());
                    }
                });
            }
        });
        ui.add_space(12.0);
        if ui.button("Cancel").clicked() {
            self.wizard.reset();
            self.status = "Analysis cancelled".to_string();
        }
    }

    fn category_legend(&self, ui: &mut Ui, actions: &mut Vec<RoomAction>) {
        ui.label(RichText::new("Space categories").strong());
        for category in SpaceCategory::iter() {
            let total = self.wizard.category_total(category);
            if total <= 0.0 {
                continue;
            }
            ui.horizontal(|ui| {
                let (rect, _) = ui.allocate_exact_size(egui::vec2(12.0, 12.0), Sense::hover());
                ui.painter().rect_filled(rect, 2.0, category_color(category));
                let active = self.wizard.highlight() == Some(category);
                let text = format!("{category} · {} ft²", format_thousands(total));
                if ui.selectable_label(active, text).clicked() {
                    actions.push(RoomAction::ToggleHighlight(category));
                }
            });
        }
    }

    fn room_sidebar(&mut self, ui: &mut Ui) {
        let mut actions = Vec::new();
        self.category_legend(ui, &mut actions);
        ui.separator();

        let selected = self.wizard.registry().selected();
        let scroll = std::mem::take(&mut self.scroll_to_selected);
        egui::ScrollArea::vertical()
            .id_source("room_list")
            .max_height(ui.available_height() * 0.55)
            .show(ui, |ui| {
                for (category, rooms) in self.wizard.registry().group_by_category() {
                    if rooms.is_empty() {
                        continue;
                    }
                    let holds_selection = rooms.iter().any(|r| Some(r.id) == selected);
                    let header = RichText::new(format!("{category}  ({})", rooms.len()))
                        .color(category_color(category));
                    egui::CollapsingHeader::new(header)
                        .id_source(("group", category.label()))
                        .default_open(true)
                        .open((scroll && holds_selection).then_some(true))
                        .show(ui, |ui| {
                            for room in rooms {
                                let is_selected = Some(room.id) == selected;
                                let resp = ui.selectable_label(
                                    is_selected,
                                    format!("{}  ·  {}", room.name, room.dimensions),
                                );
                                if resp.clicked() {
                                    actions.push(RoomAction::Select(room.id));
                                }
                                if is_selected && scroll {
                                    resp.scroll_to_me(Some(egui::Align::Center));
                                }
                            }
                        });
                }
            });

        ui.separator();
        self.selected_room_panel(ui, &mut actions);

        for action in actions {
            match action {
                RoomAction::Select(id) => {
                    self.wizard.registry_mut().toggle_select(id);
                }
                RoomAction::Rename(id, name) => self.wizard.registry_mut().update_label(id, &name),
                RoomAction::Recategorize(id, category) => {
                    self.wizard.record_edit();
                    self.wizard.registry_mut().update_type(id, category);
                    self.status = format!("Room {id} set to {category}");
                }
                RoomAction::Remove(id) => {
                    self.wizard.record_edit();
                    self.wizard.registry_mut().remove(id);
                    self.status = format!("Room {id} removed");
                }
                RoomAction::ToggleHighlight(category) => self.wizard.toggle_highlight(category),
            }
        }
    }

    fn selected_room_panel(&mut self, ui: &mut Ui, actions: &mut Vec<RoomAction>) {
        let edit_mode = self.canvas.edit_mode;
        let Some(room) = self.wizard.registry().selected_room() else {
            ui.label(RichText::new("Select a room on the plan or in the list.").weak());
            return;
        };
        let id = room.id;

        let mut name = room.name.clone();
        let mut category = room.category;
        let mut record_rename = false;
        Self::card_frame().show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                ui.label("Name");
                let resp = ui.text_edit_singleline(&mut name);
                record_rename = resp.gained_focus();
                if resp.changed() {
                    actions.push(RoomAction::Rename(id, name.clone()));
                }
            });
            ui.horizontal(|ui| {
                ui.label("Category");
                egui::ComboBox::from_id_source(("category", id.0))
                    .selected_text(category.label())
                    .show_ui(ui, |ui| {
                        for option in SpaceCategory::iter() {
                            ui.selectable_value(&mut category, option, option.label());
                        }
                    });
            });
            if category != room.category {
                actions.push(RoomAction::Recategorize(id, category));
            }
            if let Some(kind) = &room.room_type {
                ui.label(RichText::new(format!("Type: {kind}")).weak());
            }
            ui.label(format!("Shape: {}  ·  {}", room.geometry.kind(), room.dimensions));
            if let Some(area) = room.calculated_area {
                ui.label(format!("Area: {} ft²", format_thousands(area)));
            }

            if !room.walls.is_empty() {
                ui.add_space(4.0);
                ui.push_id(("walls", id.0), |ui| {
                    TableBuilder::new(ui)
                        .striped(true)
                        .vscroll(false)
                        .column(Column::exact(60.0))
                        .column(Column::remainder())
                        .header(18.0, |mut header| {
                            header.col(|ui| {
                                ui.strong("Wall");
                            });
                            header.col(|ui| {
                                ui.strong("Length");
                            });
                        })
                        .body(|mut body| {
                            for wall in &room.walls {
                                body.row(18.0, |mut row| {
                                    row.col(|ui| {
                                        ui.label(wall.sequence_order.to_string());
                                    });
                                    row.col(|ui| {
                                        ui.label(format!("{} {}", wall.length, wall.unit));
                                    });
                                });
                            }
                        });
                });
            }

            if edit_mode && ui.button("🗑 Delete room").clicked() {
                actions.push(RoomAction::Remove(id));
            }
        });
        if record_rename {
            self.wizard.record_edit();
        }
    }

    fn review_toolbar(&mut self, ui: &mut Ui) {
        ui.horizontal_wrapped(|ui| {
            ui.heading("Review rooms");
            if let Some(file) = self.wizard.file() {
                ui.label(RichText::new(&file.name).color(Color32::from_gray(180)));
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let generate = ui.add_enabled(
                    !self.wizard.is_busy(),
                    egui::Button::new(RichText::new("Generate report ➡").strong()),
                );
                if generate.clicked() {
                    self.canvas.editor.pointer_up();
                    self.wizard.generate_report();
                    self.status = "Generating report…".to_string();
                }
                if ui.button("Start over").clicked() {
                    self.wizard.reset();
                    self.status = "Reset".to_string();
                }
            });
        });

        ui.horizontal_wrapped(|ui| {
            if ui.button("➕ Zoom in").clicked() {
                self.wizard.zoom_in();
            }
            if ui.button("➖ Zoom out").clicked() {
                self.wizard.zoom_out();
            }
            if ui.button("Reset view").clicked() {
                self.wizard.reset_view();
            }
            ui.monospace(format!("{:.0}%", self.wizard.view().scale * 100.0));
            ui.separator();
            ui.toggle_value(&mut self.canvas.edit_mode, "✏ Edit shapes");
            if self.canvas.edit_mode {
                for kind in ShapeKind::iter() {
                    if ui.button(format!("Add {kind}")).clicked() {
                        self.wizard.record_edit();
                        let id = self.wizard.registry_mut().add(kind).id;
                        self.scroll_to_selected = true;
                        self.status = format!("Added room {id}");
                    }
                }
                if ui
                    .add_enabled(self.wizard.history().can_undo(), egui::Button::new("↶ Undo"))
                    .clicked()
                {
                    self.wizard.undo();
                }
                if ui
                    .add_enabled(self.wizard.history().can_redo(), egui::Button::new("↷ Redo"))
                    .clicked()
                {
                    self.wizard.redo();
                }
                ui.separator();
                let mut ppf = self.wizard.registry().px_per_foot();
                ui.label("px / ft");
                if ui
                    .add(egui::DragValue::new(&mut ppf).speed(0.05).clamp_range(0.5..=100.0))
                    .changed()
                {
                    self.wizard.set_px_per_foot(ppf);
                }
            }
        });
    }

    fn review_view(&mut self, ui: &mut Ui) {
        self.review_toolbar(ui);
        ui.add_space(6.0);
        if let Some(selection) = canvas::show(ui, &mut self.wizard, &self.preview, &mut self.canvas) {
            self.scroll_to_selected = selection.is_some();
        }
    }

    fn report_view(&mut self, ui: &mut Ui) {
        let status = self.wizard.report_status().cloned();
        match status {
            Some(ReportStatus::Generating) | None => {
                ui.vertical_centered(|ui| {
                    ui.add_space(60.0);
                    ui.spinner();
                    ui.label("Generating compliance report…");
                });
            }
            Some(ReportStatus::Failed) => {
                ui.vertical_centered(|ui| {
                    ui.add_space(60.0);
                    ui.label(RichText::new("The report could not be generated.").color(FAIL).size(18.0));
                    ui.add_space(12.0);
                    ui.horizontal(|ui| {
                        if ui.button("Back to review").clicked() {
                            self.wizard.back_to_review();
                        }
                        if ui.button("Retry").clicked() {
                            self.wizard.back_to_review();
                            self.wizard.generate_report();
                        }
                    });
                });
            }
            Some(ReportStatus::Complete(report)) => self.report_body(ui, &report),
        }
    }

    fn summary_card(ui: &mut Ui, label: &str, value: u32, color: Color32) {
        Self::card_frame().show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.vertical_centered(|ui| {
                ui.label(RichText::new(value.to_string()).size(26.0).strong().color(color));
                ui.label(RichText::new(label).weak());
            });
        });
    }

    fn report_body(&mut self, ui: &mut Ui, report: &ComplianceReport) {
        let threshold = self.wizard.config().pass_threshold;
        ui.horizontal(|ui| {
            ui.heading("Compliance report");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Start new analysis").clicked() {
                    self.wizard.reset();
                    self.status = "Reset".to_string();
                }
                if ui.button("Back to review").clicked() {
                    self.wizard.back_to_review();
                }
            });
        });

        let score_color = match report.score() {
            Some(_) if report.is_compliant(threshold) => PASS,
            Some(_) => WARN,
            None => Color32::GRAY,
        };
        ui.horizontal(|ui| {
            ui.label(RichText::new(report.score_label()).size(40.0).strong().color(score_color));
            ui.label(
                RichText::new(if report.is_compliant(threshold) {
                    "Compliant"
                } else {
                    "Needs attention"
                })
                .color(score_color),
            );
        });

        ui.columns(4, |columns| {
            Self::summary_card(&mut columns[0], "Compliant", report.summary.compliant, PASS);
            Self::summary_card(&mut columns[1], "Violations", report.summary.violations, FAIL);
            Self::summary_card(&mut columns[2], "Warnings", report.summary.warnings, WARN);
            Self::summary_card(
                &mut columns[3],
                "Total checks",
                report.summary.total_checks,
                Color32::from_gray(220),
            );
        });

        ui.add_space(8.0);
        Self::card_frame().show(ui, |ui| {
            ui.set_width(ui.available_width());
            let info = &report.blueprint;
            let rows = [
                ("Blueprint", info.name.as_str()),
                ("Facility type", info.facility_type.as_str()),
                ("Total area", info.total_area.as_str()),
                ("Uploaded", info.upload_date.as_str()),
            ];
            ui.push_id("blueprint_info", |ui| {
                TableBuilder::new(ui)
                    .vscroll(false)
                    .column(Column::exact(120.0))
                    .column(Column::remainder())
                    .body(|mut body| {
                        for (field, value) in rows {
                            body.row(18.0, |mut row| {
                                row.col(|ui| {
                                    ui.label(RichText::new(field).weak());
                                });
                                row.col(|ui| {
                                    ui.label(value);
                                });
                            });
                        }
                    });
            });
        });

        ui.add_space(8.0);
        let mut toggled = None;
        egui::ScrollArea::vertical().id_source("report").show(ui, |ui| {
            for category in &report.results {
                let expanded = self.wizard.report_view().is_expanded(&category.category);
                let (badge, color) = category_badge(category.status);
                Self::card_frame().show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    let arrow = if expanded { "⏷" } else { "⏵" };
                    let header = ui.horizontal(|ui| {
                        let clicked = ui
                            .add(
                                egui::Label::new(
                                    RichText::new(format!("{arrow} {}", category.category)).strong(),
                                )
                                .sense(Sense::click()),
                            )
                            .clicked();
                        ui.label(RichText::new(badge).color(color));
                        ui.label(RichText::new(format!("{} checks", category.items.len())).weak());
                        clicked
                    });
                    if header.inner {
                        toggled = Some(category.category.clone());
                    }
                    if !expanded {
                        return;
                    }
                    for item in &category.items {
                        ui.separator();
                        let (icon, color) = check_icon(item.status);
                        ui.horizontal(|ui| {
                            ui.label(RichText::new(icon).color(color));
                            ui.label(RichText::new(&item.check).strong());
                        });
                        ui.label(&item.finding);
                        for (field, value) in [
                            ("Blueprint", &item.blueprint),
                            ("Policy", &item.policy),
                            ("Citation", &item.citation),
                        ] {
                            if !value.is_empty() {
                                ui.label(RichText::new(format!("{field}: {value}")).weak());
                            }
                        }
                        if let Some(recommendation) = &item.recommendation {
                            ui.label(
                                RichText::new(format!("Recommendation: {recommendation}"))
                                    .color(Color32::from_rgb(147, 197, 253)),
                            );
                        }
                    }
                });
                ui.add_space(4.0);
            }
        });
        if let Some(category) = toggled {
            self.wizard.toggle_report_category(&category);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checklist_thresholds_increase() {
        let thresholds: Vec<u8> = ANALYSIS_CHECKLIST.iter().map(|(_, t)| *t).collect();
        assert_eq!(thresholds, vec![20, 40, 60, 80, 95]);
    }

    #[test]
    fn every_check_status_has_an_icon() {
        assert_eq!(check_icon(CheckStatus::Pass).0, "✔");
        assert_eq!(check_icon(CheckStatus::Fail).1, FAIL);
        assert_eq!(category_badge(CategoryStatus::Warning).0, "Warning");
    }
}
