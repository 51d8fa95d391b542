//! Block layout into an off-screen SVG page
//!
//! A single fixed-width column, laid out top to bottom. Text is wrapped by
//! an average glyph width rather than measured; this is a reading layout,
//! not a typesetter.

use crate::config::PdfSettings;
use crate::markdown::Block;
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;

// ─────────────────────────────────────────────────────────────────────────────
// Metrics
// ─────────────────────────────────────────────────────────────────────────────

const BASE_SIZE: f32 = 16.0;
const LINE_HEIGHT: f32 = 1.6;
const HEADING_LINE_HEIGHT: f32 = 1.25;
const CODE_SIZE: f32 = 14.0;
const CODE_LINE_HEIGHT: f32 = 1.45;
const CODE_PADDING: f32 = 16.0;
const BLOCK_GAP: f32 = 16.0;
const HEADING_GAP: f32 = 24.0;
const LIST_INDENT: f32 = 32.0;
const QUOTE_INDENT: f32 = 20.0;
const CELL_PADDING: f32 = 12.0;
const IMAGE_PLACEHOLDER_HEIGHT: f32 = 48.0;

/// Average advance of a proportional glyph, in em.
const TEXT_ADVANCE: f32 = 0.52;
/// Advance of a monospace glyph, in em.
const MONO_ADVANCE: f32 = 0.6;

const TEXT_COLOR: &str = "#24292e";
const MUTED_COLOR: &str = "#6a737d";
const CODE_BACKGROUND: &str = "#f5f5f5";
const RULE_COLOR: &str = "#e1e4e8";
const BORDER_COLOR: &str = "#d0d7de";
const HEADER_BACKGROUND: &str = "#f6f8fa";

// ─────────────────────────────────────────────────────────────────────────────
// Public Types
// ─────────────────────────────────────────────────────────────────────────────

/// Geometry of the layout column, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub width: u32,
    pub padding: u32,
    pub scale: f32,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::from(&PdfSettings::default())
    }
}

impl From<&PdfSettings> for PageLayout {
    fn from(settings: &PdfSettings) -> Self {
        Self {
            width: settings.page_width_px,
            padding: settings.padding_px,
            scale: settings.scale,
        }
    }
}

/// Font families the layout refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFamilies {
    pub text: String,
    pub mono: String,
}

impl Default for FontFamilies {
    fn default() -> Self {
        Self {
            text: "sans-serif".to_string(),
            mono: "monospace".to_string(),
        }
    }
}

/// A laid out document: SVG source and its size in CSS pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct LaidOutDocument {
    pub svg: String,
    pub width: u32,
    pub height: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Layout
// ─────────────────────────────────────────────────────────────────────────────

/// Lay `blocks` out in a single column.
pub fn layout_document(
    blocks: &[Block],
    layout: &PageLayout,
    fonts: &FontFamilies,
) -> LaidOutDocument {
    let mut canvas = Canvas::new(layout, fonts);
    let mut in_table = false;

    for block in blocks {
        let is_row = matches!(block, Block::TableRow { .. });
        if in_table && !is_row {
            canvas.y += BLOCK_GAP;
        }
        in_table = is_row;

        match block {
            Block::Heading { level, text } => canvas.heading(*level, text),
            Block::Paragraph(text) => canvas.paragraph(text),
            Block::Code(text) => canvas.code(text),
            Block::Quote(text) => canvas.quote(text),
            Block::ListItem {
                depth,
                marker,
                text,
            } => canvas.list_item(*depth, marker, text),
            Block::Rule => canvas.rule(),
            Block::TableRow { header, cells } => canvas.table_row(*header, cells),
            Block::Image { alt } => canvas.image_placeholder(alt),
        }
    }

    canvas.finish()
}

struct Canvas<'a> {
    elements: String,
    fonts: &'a FontFamilies,
    left: f32,
    content_width: f32,
    width: u32,
    padding: f32,
    /// Top of the next block
    y: f32,
}

impl<'a> Canvas<'a> {
    fn new(layout: &PageLayout, fonts: &'a FontFamilies) -> Self {
        let padding = layout.padding as f32;
        Self {
            elements: String::new(),
            fonts,
            left: padding,
            content_width: (layout.width as f32 - 2.0 * padding).max(1.0),
            width: layout.width,
            padding,
            y: padding,
        }
    }

    fn is_at_top(&self) -> bool {
        self.y <= self.padding
    }

    // ─────────────────────────────────────────────────────────────────────
    // Blocks
    // ─────────────────────────────────────────────────────────────────────

    fn heading(&mut self, level: u8, text: &str) {
        let size = BASE_SIZE
            * match level {
                1 => 2.0,
                2 => 1.5,
                3 => 1.25,
                4 => 1.0,
                5 => 0.875,
                _ => 0.85,
            };
        if !self.is_at_top() {
            self.y += HEADING_GAP - BLOCK_GAP;
        }

        let lines = wrap(text, max_chars(self.content_width, size, TEXT_ADVANCE * 1.1));
        let style = TextStyle {
            size,
            line_height: size * HEADING_LINE_HEIGHT,
            mono: false,
            bold: true,
            fill: TEXT_COLOR,
        };
        self.text_lines(&lines, self.left, &style);

        if level <= 2 {
            self.y += size * 0.3;
            self.rect(self.left, self.y, self.content_width, 1.0, RULE_COLOR);
            self.y += 1.0;
        }
        self.y += BLOCK_GAP;
    }

    fn paragraph(&mut self, text: &str) {
        let lines = wrap(text, max_chars(self.content_width, BASE_SIZE, TEXT_ADVANCE));
        self.text_lines(&lines, self.left, &TextStyle::body());
        self.y += BLOCK_GAP;
    }

    fn code(&mut self, text: &str) {
        let inner_width = self.content_width - 2.0 * CODE_PADDING;
        let limit = max_chars(inner_width, CODE_SIZE, MONO_ADVANCE);
        let lines: Vec<String> = text
            .split('\n')
            .flat_map(|line| hard_wrap(line, limit))
            .collect();

        let style = TextStyle {
            size: CODE_SIZE,
            line_height: CODE_SIZE * CODE_LINE_HEIGHT,
            mono: true,
            bold: false,
            fill: TEXT_COLOR,
        };
        let height = 2.0 * CODE_PADDING + lines.len() as f32 * style.line_height;
        self.rect(self.left, self.y, self.content_width, height, CODE_BACKGROUND);

        let bottom = self.y + height;
        self.y += CODE_PADDING;
        self.text_lines(&lines, self.left + CODE_PADDING, &style);
        self.y = bottom + BLOCK_GAP;
    }

    fn quote(&mut self, text: &str) {
        let width = self.content_width - QUOTE_INDENT;
        let lines = wrap(text, max_chars(width, BASE_SIZE, TEXT_ADVANCE));
        let style = TextStyle {
            fill: MUTED_COLOR,
            ..TextStyle::body()
        };
        let top = self.y;
        self.text_lines(&lines, self.left + QUOTE_INDENT, &style);
        self.rect(self.left, top, 4.0, self.y - top, BORDER_COLOR);
        self.y += BLOCK_GAP;
    }

    fn list_item(&mut self, depth: usize, marker: &str, text: &str) {
        let indent = LIST_INDENT * depth.max(1) as f32;
        let width = (self.content_width - indent).max(BASE_SIZE);
        let lines = wrap(text, max_chars(width, BASE_SIZE, TEXT_ADVANCE));
        let style = TextStyle::body();

        if !marker.is_empty() {
            let baseline = self.baseline(&style);
            let x = self.left + indent - 8.0;
            self.text_element(x, baseline, marker, &style, Some("end"));
        }
        self.text_lines(&lines, self.left + indent, &style);
        self.y += 4.0;
    }

    fn rule(&mut self) {
        self.y += 8.0;
        self.rect(self.left, self.y, self.content_width, 2.0, RULE_COLOR);
        self.y += 2.0 + HEADING_GAP;
    }

    fn table_row(&mut self, header: bool, cells: &[String]) {
        if cells.is_empty() {
            return;
        }
        let column_width = self.content_width / cells.len() as f32;
        let limit = max_chars(column_width - 2.0 * CELL_PADDING, BASE_SIZE, TEXT_ADVANCE);
        let wrapped: Vec<Vec<String>> = cells.iter().map(|cell| wrap(cell, limit)).collect();

        let style = TextStyle {
            bold: header,
            ..TextStyle::body()
        };
        let line_count = wrapped.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let height = line_count as f32 * style.line_height + 2.0 * 8.0;
        let top = self.y;

        for (column, lines) in wrapped.iter().enumerate() {
            let x = self.left + column as f32 * column_width;
            let fill = if header { HEADER_BACKGROUND } else { "#ffffff" };
            let _ = write!(
                self.elements,
                r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}" stroke="{}" stroke-width="1"/>"#,
                x, top, column_width, height, fill, BORDER_COLOR
            );
            self.y = top + 8.0;
            self.text_lines(lines, x + CELL_PADDING, &style);
        }
        self.y = top + height;
    }

    fn image_placeholder(&mut self, alt: &str) {
        let label = if alt.is_empty() {
            "[Image]".to_string()
        } else {
            format!("[Image: {}]", alt)
        };
        let _ = write!(
            self.elements,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="none" stroke="{}" stroke-dasharray="4 4"/>"#,
            self.left, self.y, self.content_width, IMAGE_PLACEHOLDER_HEIGHT, BORDER_COLOR
        );

        let style = TextStyle {
            fill: MUTED_COLOR,
            ..TextStyle::body()
        };
        let limit = max_chars(self.content_width - 2.0 * CELL_PADDING, BASE_SIZE, TEXT_ADVANCE);
        let first_line = wrap(&label, limit).into_iter().next().unwrap_or_default();
        let baseline = self.y + (IMAGE_PLACEHOLDER_HEIGHT - style.size) / 2.0 + style.size * 0.8;
        self.text_element(self.left + CELL_PADDING, baseline, &first_line, &style, None);
        self.y += IMAGE_PLACEHOLDER_HEIGHT + BLOCK_GAP;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Primitives
    // ─────────────────────────────────────────────────────────────────────

    fn baseline(&self, style: &TextStyle) -> f32 {
        self.y + (style.line_height - style.size) / 2.0 + style.size * 0.8
    }

    fn text_lines(&mut self, lines: &[String], x: f32, style: &TextStyle) {
        for line in lines {
            let baseline = self.baseline(style);
            self.text_element(x, baseline, line, style, None);
            self.y += style.line_height;
        }
    }

    fn text_element(
        &mut self,
        x: f32,
        baseline: f32,
        text: &str,
        style: &TextStyle,
        anchor: Option<&str>,
    ) {
        if text.is_empty() {
            return;
        }
        let family = if style.mono {
            font_stack(&self.fonts.mono, "monospace")
        } else {
            font_stack(&self.fonts.text, "sans-serif")
        };
        let _ = write!(
            self.elements,
            r#"<text x="{:.2}" y="{:.2}" font-family="{}" font-size="{:.2}" fill="{}""#,
            x,
            baseline,
            encode_double_quoted_attribute(&xml_safe(&family)),
            style.size,
            style.fill
        );
        if style.bold {
            self.elements.push_str(r#" font-weight="bold""#);
        }
        if style.mono {
            self.elements.push_str(r#" xml:space="preserve""#);
        }
        if let Some(anchor) = anchor {
            let _ = write!(self.elements, r#" text-anchor="{}""#, anchor);
        }
        let _ = write!(self.elements, ">{}</text>", encode_text(&xml_safe(text)));
    }

    fn rect(&mut self, x: f32, y: f32, width: f32, height: f32, fill: &str) {
        let _ = write!(
            self.elements,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"/>"#,
            x, y, width, height, fill
        );
    }

    fn finish(self) -> LaidOutDocument {
        let height = (self.y + self.padding).ceil().max(2.0 * self.padding).max(1.0) as u32;
        let width = self.width;
        let svg = format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><rect width="{w}" height="{h}" fill="#ffffff"/>{elements}</svg>"##,
            w = width,
            h = height,
            elements = self.elements
        );
        LaidOutDocument { svg, width, height }
    }
}

struct TextStyle {
    size: f32,
    line_height: f32,
    mono: bool,
    bold: bool,
    fill: &'static str,
}

impl TextStyle {
    fn body() -> Self {
        Self {
            size: BASE_SIZE,
            line_height: BASE_SIZE * LINE_HEIGHT,
            mono: false,
            bold: false,
            fill: TEXT_COLOR,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Text Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn font_stack(family: &str, generic: &str) -> String {
    let name: String = family.chars().filter(|c| *c != '\'' && *c != '"').collect();
    if name == generic {
        generic.to_string()
    } else {
        format!("'{}', {}", name, generic)
    }
}

/// Drop characters that XML 1.0 does not allow in documents.
fn xml_safe(text: &str) -> String {
    text.chars()
        .filter(|&c| {
            !((c < '\u{20}' && !matches!(c, '\t' | '\n' | '\r'))
                || c == '\u{FFFE}'
                || c == '\u{FFFF}')
        })
        .collect()
}

/// Characters that fit in `width` at `size` with the given advance.
fn max_chars(width: f32, size: f32, advance: f32) -> usize {
    ((width / (size * advance)).floor() as usize).max(1)
}

/// Word-wrap `text` to lines of at most `limit` characters.
///
/// Explicit newlines are kept. Words longer than a line are split.
fn wrap(text: &str, limit: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_len = 0;
        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();
            if line_len > 0 && line_len + 1 + word_len > limit {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            if word_len > limit {
                let mut pieces = hard_wrap(word, limit);
                if let Some(last) = pieces.pop() {
                    lines.extend(pieces);
                    line_len = last.chars().count();
                    line = last;
                }
                continue;
            }
            if line_len > 0 {
                line.push(' ');
                line_len += 1;
            }
            line.push_str(word);
            line_len += word_len;
        }
        lines.push(line);
    }
    lines
}

/// Split `text` into chunks of at most `limit` characters.
fn hard_wrap(text: &str, limit: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(limit.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}
