//! Rendered preview and HTML source views
//!
//! The preview draws the same flat block model the PDF layout uses, so what
//! the user sees matches what lands on the page.

use crate::markdown::{blocks_from_html, Block};
use crate::sanitize::sanitize;
use eframe::egui::{self, Color32, FontId, RichText, Ui};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Base text size of the preview, in points.
const BASE_SIZE: f32 = 15.0;

/// Font size for a heading level, scaled like the exported stylesheet.
pub fn heading_size(level: u8) -> f32 {
    let factor = match level {
        1 => 2.0,
        2 => 1.5,
        3 => 1.25,
        4 => 1.1,
        _ => 1.0,
    };
    BASE_SIZE * factor
}

/// Cached block rendering of the current HTML.
#[derive(Debug, Default)]
pub struct PreviewPane {
    html_hash: u64,
    blocks: Vec<Block>,
}

impl PreviewPane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the cached blocks if `html` changed.
    ///
    /// Returns `true` when the cache was rebuilt.
    pub fn update(&mut self, html: &str) -> bool {
        let mut hasher = DefaultHasher::new();
        html.hash(&mut hasher);
        let hash = hasher.finish();
        if hash == self.html_hash && !self.blocks.is_empty() {
            return false;
        }
        self.html_hash = hash;
        self.blocks = blocks_from_html(&sanitize(html));
        true
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Draw the rendered document.
    pub fn show(&mut self, ui: &mut Ui, html: &str) {
        self.update(html);

        egui::ScrollArea::vertical()
            .id_source("preview_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.spacing_mut().item_spacing.y = 6.0;
                for block in &self.blocks {
                    show_block(ui, block);
                }
            });
    }
}

fn show_block(ui: &mut Ui, block: &Block) {
    let weak = ui.visuals().weak_text_color();
    match block {
        Block::Heading { level, text } => {
            ui.add_space(4.0);
            ui.label(RichText::new(text).size(heading_size(*level)).strong());
            if *level <= 2 {
                ui.separator();
            }
        }
        Block::Paragraph(text) => {
            ui.label(RichText::new(text).size(BASE_SIZE));
        }
        Block::Code(text) => {
            egui::Frame::none()
                .fill(ui.visuals().extreme_bg_color)
                .rounding(4.0)
                .inner_margin(egui::Margin::same(8.0))
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.label(RichText::new(text).font(FontId::monospace(BASE_SIZE - 1.0)));
                });
        }
        Block::Quote(text) => {
            ui.horizontal(|ui| {
                let (rect, _) =
                    ui.allocate_exact_size(egui::vec2(3.0, BASE_SIZE * 1.6), egui::Sense::hover());
                ui.painter().rect_filled(rect, 0.0, Color32::GRAY);
                ui.label(RichText::new(text).size(BASE_SIZE).italics().color(weak));
            });
        }
        Block::ListItem {
            depth,
            marker,
            text,
        } => {
            ui.horizontal_wrapped(|ui| {
                ui.add_space(16.0 * (*depth as f32 + 1.0));
                let marker = if marker.is_empty() { " " } else { marker };
                ui.label(RichText::new(marker).size(BASE_SIZE));
                ui.label(RichText::new(text).size(BASE_SIZE));
            });
        }
        Block::Rule => {
            ui.separator();
        }
        Block::TableRow { header, cells } => {
            ui.horizontal(|ui| {
                for cell in cells {
                    let mut text = RichText::new(cell).size(BASE_SIZE);
                    if *header {
                        text = text.strong();
                    }
                    ui.add_sized([120.0, BASE_SIZE * 1.6], egui::Label::new(text));
                }
            });
        }
        Block::Image { alt } => {
            ui.label(RichText::new(format!("[Image: {}]", alt)).italics().color(weak));
        }
    }
}

/// Draw the HTML source in a read-only monospace view.
pub fn show_source(ui: &mut Ui, html: &str) {
    egui::ScrollArea::both()
        .id_source("source_scroll")
        .auto_shrink([false, false])
        .show(ui, |ui| {
            let mut text = html;
            ui.add(
                egui::TextEdit::multiline(&mut text)
                    .font(egui::TextStyle::Monospace)
                    .desired_width(f32::INFINITY)
                    .code_editor(),
            );
        });
}
