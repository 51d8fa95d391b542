//! Settings Panel Component for Markport
//!
//! This module implements a modal settings panel for export, PDF rendering
//! and network options. Changes apply immediately and are saved on exit.

use crate::config::Settings;
use crate::files::dialogs::pick_output_folder;
use eframe::egui::{self, Color32, RichText, Ui};

/// Settings panel sections for navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SettingsSection {
    #[default]
    Export,
    Pdf,
    Network,
}

impl SettingsSection {
    /// Get the display label for the section.
    pub fn label(&self) -> &'static str {
        match self {
            SettingsSection::Export => "Export",
            SettingsSection::Pdf => "PDF",
            SettingsSection::Network => "Network",
        }
    }

    /// Get the icon for the section.
    pub fn icon(&self) -> &'static str {
        match self {
            SettingsSection::Export => "📤",
            SettingsSection::Pdf => "📄",
            SettingsSection::Network => "🌐",
        }
    }
}

/// Result of showing the settings panel.
#[derive(Debug, Clone, Default)]
pub struct SettingsPanelOutput {
    /// Whether settings were modified.
    pub changed: bool,
    /// Whether the panel should be closed.
    pub close_requested: bool,
    /// Whether a reset to defaults was requested.
    pub reset_requested: bool,
}

/// Settings panel state and rendering.
#[derive(Debug, Clone, Default)]
pub struct SettingsPanel {
    active_section: SettingsSection,
    /// Text buffer for the font URL field
    font_url_input: Option<String>,
}

impl SettingsPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the settings panel as a modal window.
    ///
    /// `settings` is edited in place; the caller sanitizes and persists it
    /// when `changed` is reported.
    pub fn show(&mut self, ctx: &egui::Context, settings: &mut Settings) -> SettingsPanelOutput {
        let mut output = SettingsPanelOutput::default();

        let screen_rect = ctx.screen_rect();
        let overlay_color = if ctx.style().visuals.dark_mode {
            Color32::from_rgba_unmultiplied(0, 0, 0, 180)
        } else {
            Color32::from_rgba_unmultiplied(0, 0, 0, 120)
        };

        egui::Area::new(egui::Id::new("settings_overlay"))
            .order(egui::Order::Middle)
            .fixed_pos(screen_rect.min)
            .show(ctx, |ui| {
                let response = ui.allocate_response(screen_rect.size(), egui::Sense::click());
                ui.painter().rect_filled(screen_rect, 0.0, overlay_color);
                if response.clicked() {
                    output.close_requested = true;
                }
            });

        egui::Window::new("⚙ Settings")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .min_width(500.0)
            .max_width(600.0)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                    output.close_requested = true;
                }

                ui.horizontal(|ui| {
                    ui.vertical(|ui| {
                        ui.set_min_width(120.0);

                        for section in [
                            SettingsSection::Export,
                            SettingsSection::Pdf,
                            SettingsSection::Network,
                        ] {
                            let selected = self.active_section == section;
                            let text = format!("{} {}", section.icon(), section.label());
                            let btn = ui.add_sized(
                                [110.0, 32.0],
                                egui::SelectableLabel::new(
                                    selected,
                                    RichText::new(text).size(14.0),
                                ),
                            );
                            if btn.clicked() {
                                self.active_section = section;
                            }
                        }

                        ui.add_space(ui.available_height() - 40.0);

                        if ui
                            .add_sized([110.0, 28.0], egui::Button::new("↺ Reset All"))
                            .on_hover_text("Reset all settings to defaults")
                            .clicked()
                        {
                            self.font_url_input = None;
                            output.reset_requested = true;
                        }
                    });

                    ui.separator();

                    ui.vertical(|ui| {
                        ui.set_min_width(350.0);
                        ui.set_min_height(280.0);

                        let changed = match self.active_section {
                            SettingsSection::Export => self.show_export_section(ui, settings),
                            SettingsSection::Pdf => self.show_pdf_section(ui, settings),
                            SettingsSection::Network => self.show_network_section(ui, settings),
                        };
                        output.changed |= changed;
                    });
                });

                ui.separator();

                ui.horizontal(|ui| {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Close").clicked() {
                            output.close_requested = true;
                        }
                        ui.label(
                            RichText::new("Settings are saved automatically")
                                .small()
                                .weak(),
                        );
                    });
                });
            });

        output
    }

    fn show_export_section(&mut self, ui: &mut Ui, settings: &mut Settings) -> bool {
        let mut changed = false;
        let export = &mut settings.export;

        ui.heading("Export");
        ui.add_space(8.0);

        ui.label(RichText::new("File name").strong());
        if ui
            .text_edit_singleline(&mut export.filename)
            .on_hover_text("Base name for exported files, without extension")
            .changed()
        {
            changed = true;
        }

        ui.add_space(12.0);
        ui.label(RichText::new("Output folder").strong());
        ui.horizontal(|ui| {
            ui.label(export.resolved_output_dir().display().to_string());
            if ui.small_button("Change…").clicked() {
                if let Some(dir) = pick_output_folder(export.output_dir.as_ref()) {
                    export.output_dir = Some(dir);
                    changed = true;
                }
            }
            if export.output_dir.is_some() && ui.small_button("Default").clicked() {
                export.output_dir = None;
                changed = true;
            }
        });

        ui.add_space(12.0);
        ui.separator();
        ui.add_space(8.0);

        if ui
            .checkbox(&mut export.open_after_export, "Open files after export")
            .changed()
        {
            changed = true;
        }
        if ui
            .checkbox(&mut export.allow_raw_html, "Allow raw HTML in markdown")
            .on_hover_text("Raw HTML is still sanitized before preview and export")
            .changed()
        {
            changed = true;
        }

        if !export.embedded_resources.is_empty() {
            ui.add_space(8.0);
            ui.label(
                RichText::new(format!(
                    "{} resource(s) embedded in HTML exports",
                    export.embedded_resources.len()
                ))
                .small()
                .weak(),
            );
        }

        changed
    }

    fn show_pdf_section(&mut self, ui: &mut Ui, settings: &mut Settings) -> bool {
        let mut changed = false;
        let pdf = &mut settings.pdf;

        ui.heading("PDF");
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            ui.label("Page width:");
            changed |= ui
                .add(
                    egui::Slider::new(
                        &mut pdf.page_width_px,
                        Settings::MIN_PAGE_WIDTH..=Settings::MAX_PAGE_WIDTH,
                    )
                    .suffix(" px"),
                )
                .changed();
        });
        ui.horizontal(|ui| {
            ui.label("Padding:");
            changed |= ui
                .add(egui::Slider::new(&mut pdf.padding_px, 0..=Settings::MAX_PADDING).suffix(" px"))
                .changed();
        });
        ui.horizontal(|ui| {
            ui.label("Render scale:");
            changed |= ui
                .add(
                    egui::Slider::new(&mut pdf.scale, Settings::MIN_SCALE..=Settings::MAX_SCALE)
                        .step_by(0.5),
                )
                .on_hover_text("Higher values give sharper pages and larger files")
                .changed();
        });

        ui.add_space(12.0);
        ui.label(RichText::new("Font URL").strong());
        let input = self
            .font_url_input
            .get_or_insert_with(|| pdf.font_url.clone().unwrap_or_default());
        let response = ui.text_edit_singleline(input);
        if response.lost_focus() {
            let trimmed = input.trim();
            let new_url = (!trimmed.is_empty()).then(|| trimmed.to_string());
            if new_url != pdf.font_url {
                pdf.font_url = new_url;
                changed = true;
            }
        }
        ui.label(
            RichText::new("Leave empty to use system fonts")
                .small()
                .weak(),
        );

        changed
    }

    fn show_network_section(&mut self, ui: &mut Ui, settings: &mut Settings) -> bool {
        let mut changed = false;
        let network = &mut settings.network;

        ui.heading("Network");
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            ui.label("Retries:");
            changed |= ui
                .add(egui::Slider::new(&mut network.retries, 0..=Settings::MAX_RETRIES))
                .changed();
        });
        ui.horizontal(|ui| {
            ui.label("Backoff step:");
            changed |= ui
                .add(egui::Slider::new(&mut network.backoff_step_ms, 0..=5000).suffix(" ms"))
                .on_hover_text("Retries wait longer as fewer remain, up to three steps")
                .changed();
        });
        ui.horizontal(|ui| {
            ui.label("Timeout:");
            changed |= ui
                .add(egui::Slider::new(&mut network.timeout_secs, 1..=120).suffix(" s"))
                .changed();
        });

        ui.add_space(8.0);
        ui.label(
            RichText::new("Network changes apply to the next session")
                .small()
                .weak(),
        );

        changed
    }
}
