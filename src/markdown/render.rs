//! Markdown to HTML rendering using comrak

use comrak::{markdown_to_html, Options};

// ─────────────────────────────────────────────────────────────────────────────
// Rendering Options
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration options for markdown rendering.
#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    /// Enable GitHub Flavored Markdown tables
    pub tables: bool,
    /// Enable strikethrough syntax (~~text~~)
    pub strikethrough: bool,
    /// Enable autolink URLs and emails
    pub autolink: bool,
    /// Enable task lists (- [ ] and - [x])
    pub tasklist: bool,
    /// Enable footnotes
    pub footnotes: bool,
    /// Pass raw HTML embedded in the markdown through to the output
    pub allow_raw_html: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            autolink: true,
            tasklist: true,
            footnotes: true,
            allow_raw_html: false,
        }
    }
}

impl MarkdownOptions {
    /// Convert to comrak Options.
    fn to_comrak_options(&self) -> Options {
        let mut options = Options::default();

        // Extension options
        options.extension.strikethrough = self.strikethrough;
        options.extension.table = self.tables;
        options.extension.autolink = self.autolink;
        options.extension.tasklist = self.tasklist;
        options.extension.footnotes = self.footnotes;

        // Render options
        options.render.unsafe_ = self.allow_raw_html;

        options
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendering
// ─────────────────────────────────────────────────────────────────────────────

/// Render markdown to an HTML fragment with the default GFM options.
///
/// Raw HTML in the source is replaced by comrak's `<!-- raw HTML omitted -->`
/// marker unless `allow_raw_html` is set.
pub fn render_markdown(markdown: &str, allow_raw_html: bool) -> String {
    let options = MarkdownOptions {
        allow_raw_html,
        ..MarkdownOptions::default()
    };
    render_markdown_with_options(markdown, &options)
}

/// Render markdown to an HTML fragment with explicit options.
pub fn render_markdown_with_options(markdown: &str, options: &MarkdownOptions) -> String {
    markdown_to_html(markdown, &options.to_comrak_options())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
