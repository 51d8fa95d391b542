//! Flat block model of a rendered HTML fragment
//!
//! The preview pane and the PDF layout both draw documents as a vertical run
//! of simple blocks. Inline formatting is flattened to text; structure that
//! matters for reading (headings, list nesting, code, quotes, tables) is kept.

use crate::sanitize::{tokenize, Token};

/// Stands in for `<br>` while whitespace is collapsed.
const LINE_BREAK: char = '\u{2028}';

/// Bullet used for unordered list items.
pub const BULLET: &str = "•";

/// One vertically stacked block of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading {
        level: u8,
        text: String,
    },
    Paragraph(String),
    /// Preformatted text, whitespace preserved
    Code(String),
    Quote(String),
    /// A list item; `marker` is empty for continuation paragraphs
    ListItem {
        depth: usize,
        marker: String,
        text: String,
    },
    Rule,
    TableRow {
        header: bool,
        cells: Vec<String>,
    },
    /// Images are not fetched; the alt text stands in
    Image {
        alt: String,
    },
}

impl Block {
    /// The text carried by the block, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Block::Heading { text, .. }
            | Block::Paragraph(text)
            | Block::Code(text)
            | Block::Quote(text)
            | Block::ListItem { text, .. } => Some(text),
            Block::Image { alt } => Some(alt),
            Block::Rule | Block::TableRow { .. } => None,
        }
    }
}

/// Split an HTML fragment into blocks.
///
/// Expects sanitized or comrak-rendered HTML; anything else is handled on a
/// best-effort basis.
pub fn blocks_from_html(html: &str) -> Vec<Block> {
    let mut builder = BlockBuilder::default();
    for token in tokenize(html) {
        match token {
            Token::Start { ref name, .. } => builder.start(name, &token),
            Token::End { name } => builder.end(&name),
            Token::Text(text) => builder.text.push_str(&text),
        }
    }
    builder.flush();
    builder.blocks
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

enum ListKind {
    Bullet,
    /// Number of the next item
    Ordered(u32),
}

#[derive(Default)]
struct Row {
    header: bool,
    cells: Vec<String>,
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    text: String,
    heading: Option<u8>,
    pre: bool,
    quote_depth: usize,
    lists: Vec<ListKind>,
    /// Open list items; the marker is taken by the first block of the item
    items: Vec<Option<String>>,
    row: Option<Row>,
}

impl BlockBuilder {
    fn start(&mut self, name: &str, token: &Token) {
        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.flush();
                self.heading = name[1..].parse().ok();
            }
            "p" => self.flush(),
            "pre" => {
                self.flush();
                self.pre = true;
            }
            "blockquote" => {
                self.flush();
                self.quote_depth += 1;
            }
            "ul" => {
                self.flush();
                self.lists.push(ListKind::Bullet);
            }
            "ol" => {
                self.flush();
                let start = token
                    .attr("start")
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(1);
                self.lists.push(ListKind::Ordered(start));
            }
            "li" => {
                self.flush();
                let marker = match self.lists.last_mut() {
                    Some(ListKind::Ordered(next)) => {
                        let marker = format!("{}.", next);
                        *next += 1;
                        marker
                    }
                    _ => BULLET.to_string(),
                };
                self.items.push(Some(marker));
            }
            "tr" => {
                self.flush();
                self.row = Some(Row::default());
            }
            "th" | "td" => {
                if let Some(row) = self.row.as_mut() {
                    row.header |= name == "th";
                }
                self.text.clear();
            }
            "hr" => {
                self.flush();
                self.blocks.push(Block::Rule);
            }
            "br" => self.text.push(LINE_BREAK),
            "img" => {
                let alt = token.attr("alt").unwrap_or_default().to_string();
                if self.row.is_some() {
                    self.text.push_str(&alt);
                } else {
                    self.flush();
                    self.blocks.push(Block::Image { alt });
                }
            }
            _ => {}
        }
    }

    fn end(&mut self, name: &str) {
        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.flush();
                self.heading = None;
            }
            "p" => self.flush(),
            "pre" => {
                self.flush();
                self.pre = false;
            }
            "blockquote" => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            "ul" | "ol" => {
                self.flush();
                self.lists.pop();
            }
            "li" => {
                self.flush();
                self.items.pop();
            }
            "th" | "td" => {
                let cell = collapse_whitespace(&std::mem::take(&mut self.text));
                if let Some(row) = self.row.as_mut() {
                    row.cells.push(cell);
                }
            }
            "tr" => {
                if let Some(row) = self.row.take() {
                    if !row.cells.is_empty() {
                        self.blocks.push(Block::TableRow {
                            header: row.header,
                            cells: row.cells,
                        });
                    }
                }
                self.text.clear();
            }
            _ => {}
        }
    }

    fn flush(&mut self) {
        // Cells collect their own text until the row closes.
        if self.row.is_some() {
            return;
        }

        let raw = std::mem::take(&mut self.text);
        let text = if self.pre {
            raw.trim_end_matches('\n').to_string()
        } else {
            collapse_whitespace(&raw)
        };
        if text.trim().is_empty() {
            return;
        }

        let block = if self.pre {
            Block::Code(text)
        } else if let Some(level) = self.heading {
            Block::Heading { level, text }
        } else if let Some(item) = self.items.last_mut() {
            Block::ListItem {
                depth: self.lists.len().max(1),
                marker: item.take().unwrap_or_default(),
                text,
            }
        } else if self.quote_depth > 0 {
            Block::Quote(text)
        } else {
            Block::Paragraph(text)
        };
        self.blocks.push(block);
    }
}

/// Collapse whitespace runs like a browser would, keeping explicit breaks.
fn collapse_whitespace(raw: &str) -> String {
    raw.split(LINE_BREAK)
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
