//! Confirmation dialog and error banner.

use eframe::egui::{self, Color32, RichText};

/// Result from showing a confirmation dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmResult {
    /// Dialog still open
    None,
    Confirmed,
    Cancelled,
}

/// Ask before replacing the document with the sample.
pub fn show_reset_confirm(ctx: &egui::Context) -> ConfirmResult {
    let mut result = ConfirmResult::None;

    egui::Window::new("Reset Document")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label("Are you sure you want to reset to the default markdown?");
            ui.label(
                RichText::new("Your current text will be lost.")
                    .small()
                    .weak(),
            );
            ui.separator();
            ui.horizontal(|ui| {
                if ui.button("Reset").clicked() {
                    result = ConfirmResult::Confirmed;
                }
                if ui.button("Cancel").clicked() || ui.input(|i| i.key_pressed(egui::Key::Escape))
                {
                    result = ConfirmResult::Cancelled;
                }
            });
        });

    result
}

/// Draw a dismissible error banner.
///
/// Returns `true` when the user dismissed it.
pub fn show_error_banner(ui: &mut egui::Ui, message: &str) -> bool {
    let mut dismissed = false;

    egui::Frame::none()
        .fill(Color32::from_rgb(254, 226, 226))
        .stroke(egui::Stroke::new(1.0, Color32::from_rgb(248, 113, 113)))
        .rounding(4.0)
        .inner_margin(egui::Margin::symmetric(10.0, 6.0))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new(format!("⚠ {}", message)).color(Color32::from_rgb(153, 27, 27)),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("✕").on_hover_text("Dismiss").clicked() {
                        dismissed = true;
                    }
                });
            });
        });

    dismissed
}
