//! Main application module for Markport
//!
//! This module implements the eframe App trait: the editor and preview
//! panes, the export toolbar, and the background export worker.

use crate::config::{Settings, WindowSize};
use crate::error::Error;
use crate::export::{DirectorySink, ExportFormat, ExportOutcome, Exporter, SourceClipboard};
use crate::files::dialogs::pick_output_folder;
use crate::state::{ActiveTab, AppState, ExportStatus};
use crate::ui::{
    show_error_banner, show_reset_confirm, show_source, ConfirmResult, PreviewPane, SettingsPanel,
};
use eframe::egui;
use log::{debug, error, info, warn};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

/// Result of a background export, sent back to the UI thread.
struct ExportMessage {
    format: ExportFormat,
    result: crate::error::Result<ExportOutcome>,
}

/// The main application struct that holds all state and implements eframe::App.
pub struct MarkportApp {
    /// Central application state
    state: AppState,
    /// Export dispatcher; `None` if it could not be built at startup
    exporter: Option<Exporter>,
    /// Rendered preview cache
    preview: PreviewPane,
    /// Settings panel component
    settings_panel: SettingsPanel,
    clipboard: SourceClipboard,
    /// Channel of the running export, if any
    export_rx: Option<Receiver<ExportMessage>>,
    /// Last known window size (for detecting changes)
    last_window_size: Option<egui::Vec2>,
    /// Application start time for timing toast messages
    start_time: std::time::Instant,
}

impl MarkportApp {
    /// Create a new MarkportApp instance.
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        info!("Initializing Markport");
        Self::with_state(AppState::new())
    }

    pub fn with_state(state: AppState) -> Self {
        let exporter = match Exporter::from_settings(&state.settings) {
            Ok(exporter) => Some(exporter),
            Err(e) => {
                error!("Failed to set up exporter: {}", e);
                None
            }
        };

        Self {
            state,
            exporter,
            preview: PreviewPane::new(),
            settings_panel: SettingsPanel::new(),
            clipboard: SourceClipboard::new(),
            export_rx: None,
            last_window_size: None,
            start_time: std::time::Instant::now(),
        }
    }

    /// Rebuild the exporter after PDF or resource settings changed.
    ///
    /// A running export keeps the exporter it started with.
    fn rebuild_exporter(&mut self) {
        match Exporter::from_settings(&self.state.settings) {
            Ok(exporter) => {
                debug!("Exporter rebuilt from new settings");
                self.exporter = Some(exporter);
            }
            Err(e) => warn!("Keeping previous exporter: {}", e),
        }
    }

    /// Get elapsed time since app start in seconds.
    fn get_app_time(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    /// Update window size in settings if changed.
    fn update_window_state(&mut self, ctx: &egui::Context) {
        let Some(size) = ctx.input(|i| i.viewport().inner_rect.map(|rect| rect.size())) else {
            return;
        };
        let changed = self
            .last_window_size
            .map(|s| (s - size).length() > 1.0)
            .unwrap_or(true);
        if !changed {
            return;
        }

        self.last_window_size = Some(size);
        let maximized = ctx.input(|i| i.viewport().maximized.unwrap_or(false));
        self.state.settings.window_size = WindowSize {
            width: size.x,
            height: size.y,
            maximized,
        };
        self.state.mark_settings_dirty();
        debug!("Window size updated: {}x{}", size.x, size.y);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Export
    // ─────────────────────────────────────────────────────────────────────────

    /// Start an export on a worker thread.
    fn handle_export(&mut self, format: ExportFormat, ctx: &egui::Context) {
        let time = self.get_app_time();
        let request = match self.state.begin_export(format) {
            Ok(request) => request,
            Err(e) => {
                self.state.show_toast(e.to_string(), time, 2.0);
                return;
            }
        };

        let Some(exporter) = self.exporter.as_ref() else {
            let err = Error::Application("Exporter is not available".to_string());
            self.state.finish_export(format, Err(err), time);
            return;
        };

        // The output folder may have changed since startup
        let sink = DirectorySink::new(self.state.settings.export.resolved_output_dir());
        let exporter = exporter.with_sink(Arc::new(sink));

        let (tx, rx) = mpsc::channel();
        let repaint = ctx.clone();
        let spawned = thread::Builder::new()
            .name(format!("export-{}", format.extension()))
            .spawn(move || {
                let result = exporter.export(&request);
                if tx.send(ExportMessage { format, result }).is_err() {
                    warn!("Export finished after the UI went away");
                }
                repaint.request_repaint();
            });

        match spawned {
            Ok(_) => self.export_rx = Some(rx),
            Err(e) => {
                self.state.finish_export(format, Err(Error::Io(e)), time);
            }
        }
    }

    /// Collect the result of the running export, if it finished.
    fn poll_export(&mut self) {
        let Some(rx) = self.export_rx.as_ref() else {
            return;
        };

        let message = match rx.try_recv() {
            Ok(message) => message,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                let format = match self.state.export_status() {
                    ExportStatus::Exporting(format) => format,
                    ExportStatus::Idle => {
                        self.export_rx = None;
                        return;
                    }
                };
                ExportMessage {
                    format,
                    result: Err(Error::Application("Export worker stopped".to_string())),
                }
            }
        };
        self.export_rx = None;

        let time = self.get_app_time();
        let saved = self.state.finish_export(message.format, message.result, time);
        if let Some(path) = saved {
            info!("Exported to {}", path.display());
            if self.state.settings.export.open_after_export {
                if let Err(e) = open::that(&path) {
                    warn!("Failed to open exported file: {}", e);
                }
            }
        }
    }

    fn handle_copy_html(&mut self) {
        let time = self.get_app_time();
        match self.clipboard.copy(self.state.html()) {
            Ok(()) => {
                info!("Copied HTML to clipboard");
                self.state.show_toast("HTML copied to clipboard", time, 2.0);
            }
            Err(e) => {
                warn!("Failed to copy HTML to clipboard: {}", e);
                self.state
                    .show_toast("Failed to copy HTML to clipboard", time, 3.0);
            }
        }
    }

    fn handle_choose_output_folder(&mut self) {
        let current = self.state.settings.export.resolved_output_dir();
        if let Some(dir) = pick_output_folder(Some(&current)) {
            let time = self.get_app_time();
            self.state
                .show_toast(format!("Exports go to {}", dir.display()), time, 2.5);
            self.state
                .update_settings(|s| s.export.output_dir = Some(dir));
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────────────────

    fn render_toolbar(&mut self, ctx: &egui::Context) {
        let mut requested: Option<ExportFormat> = None;

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.heading("Markport");
                ui.separator();

                let exporting = self.state.export_status();
                for &format in ExportFormat::all() {
                    let busy = exporting == ExportStatus::Exporting(format);
                    let label = if busy {
                        format!("Exporting {}…", format.label())
                    } else {
                        format!("Export {}", format.label())
                    };
                    let button = ui
                        .add_enabled(!self.state.is_exporting(), egui::Button::new(label))
                        .on_hover_text(format!(
                            "Save as {}.{}",
                            self.state.settings.export.filename,
                            format.extension()
                        ));
                    if button.clicked() {
                        requested = Some(format);
                    }
                    if busy {
                        ui.spinner();
                    }
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("⚙").on_hover_text("Settings").clicked() {
                        self.state.ui.show_settings = true;
                    }
                    if ui
                        .button("↺ Reset")
                        .on_hover_text("Replace the document with the sample")
                        .clicked()
                    {
                        self.state.ui.show_reset_confirm = true;
                    }
                    if ui
                        .button("📁")
                        .on_hover_text("Choose export folder")
                        .clicked()
                    {
                        self.handle_choose_output_folder();
                    }
                });
            });
            ui.add_space(4.0);

            if let Some(message) = self.state.ui.error_message.clone() {
                if show_error_banner(ui, &message) {
                    self.state.dismiss_error();
                }
                ui.add_space(4.0);
            }
        });

        if let Some(format) = requested {
            self.handle_export(format, ctx);
        }
    }

    fn render_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let chars = self.state.markdown().chars().count();
                ui.label(egui::RichText::new(format!("{} characters", chars)).small());

                if let Some(toast) = &self.state.ui.toast_message {
                    ui.with_layout(
                        egui::Layout::centered_and_justified(egui::Direction::LeftToRight),
                        |ui| {
                            ui.label(egui::RichText::new(toast).italics());
                        },
                    );
                }
            });
        });
    }

    fn render_panes(&mut self, ctx: &egui::Context) {
        let half_width = ctx.screen_rect().width() / 2.0;

        egui::SidePanel::left("editor_panel")
            .resizable(true)
            .default_width(half_width)
            .show(ctx, |ui| {
                ui.label(egui::RichText::new("Markdown").strong());
                ui.separator();
                let mut markdown = self.state.markdown().to_string();
                let response = egui::ScrollArea::vertical()
                    .id_source("editor_scroll")
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        ui.add(
                            egui::TextEdit::multiline(&mut markdown)
                                .font(egui::TextStyle::Monospace)
                                .desired_width(f32::INFINITY)
                                .desired_rows(30)
                                .hint_text("Type your markdown here..."),
                        )
                    })
                    .inner;
                if response.changed() {
                    self.state.set_markdown(markdown);
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                for tab in [ActiveTab::Preview, ActiveTab::Source] {
                    let selected = self.state.active_tab() == tab;
                    if ui.selectable_label(selected, tab.label()).clicked() {
                        self.state.set_active_tab(tab);
                    }
                }
                if self.state.active_tab() == ActiveTab::Source {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("📋 Copy HTML").clicked() {
                            self.handle_copy_html();
                        }
                    });
                }
            });
            ui.separator();

            match self.state.active_tab() {
                ActiveTab::Preview => self.preview.show(ui, self.state.html()),
                ActiveTab::Source => show_source(ui, self.state.html()),
            }
        });
    }

    fn render_dialogs(&mut self, ctx: &egui::Context) {
        if self.state.ui.show_reset_confirm {
            match show_reset_confirm(ctx) {
                ConfirmResult::Confirmed => {
                    self.state.reset_markdown();
                    let time = self.get_app_time();
                    self.state.show_toast("Document reset", time, 2.0);
                }
                ConfirmResult::Cancelled => self.state.ui.show_reset_confirm = false,
                ConfirmResult::None => {}
            }
        }

        if self.state.ui.show_settings {
            let previous = self.state.settings.clone();
            let mut settings = previous.clone();
            let output = self.settings_panel.show(ctx, &mut settings);

            if output.changed {
                self.state.update_settings(|s| *s = settings);
            }

            if output.reset_requested {
                self.state.update_settings(|s| *s = Settings::default());
                let time = self.get_app_time();
                self.state
                    .show_toast("Settings reset to defaults", time, 2.0);
            }

            if self.state.settings.pdf != previous.pdf
                || self.state.settings.export.embedded_resources
                    != previous.export.embedded_resources
            {
                self.rebuild_exporter();
            }

            if output.close_requested {
                self.state.ui.show_settings = false;
            }
        }
    }
}

impl eframe::App for MarkportApp {
    /// Called each time the UI needs repainting.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let current_time = self.get_app_time();
        self.state.update_toast(current_time);
        self.update_window_state(ctx);
        self.poll_export();

        self.render_toolbar(ctx);
        self.render_status_bar(ctx);
        self.render_panes(ctx);
        self.render_dialogs(ctx);

        // Keep polling while an export runs or a toast is visible
        if self.state.is_exporting() || self.state.ui.toast_message.is_some() {
            ctx.request_repaint_after(std::time::Duration::from_millis(250));
        }
    }

    /// Called when the application is about to close.
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Application exiting");
        self.state.save_settings_if_dirty();
    }

    /// Save persistent state.
    fn save(&mut self, _storage: &mut dyn eframe::Storage) {
        debug!("Saving application state");
        self.state.save_settings_if_dirty();
    }

    /// Auto-save interval in seconds.
    fn auto_save_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(30)
    }
}
