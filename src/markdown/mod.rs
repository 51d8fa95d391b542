//! Markdown rendering module
//!
//! This module renders markdown to HTML using the comrak library, a
//! CommonMark + GFM compatible parser, and turns rendered HTML into the flat
//! block model shared by the preview pane and the PDF layout.
//!
//! # Example
//! ```ignore
//! use markport::markdown::{blocks_from_html, render_markdown};
//!
//! let html = render_markdown("# Hello\n\nThis is **bold** text.", false);
//! let blocks = blocks_from_html(&html);
//! ```

mod blocks;
mod render;

pub use blocks::{blocks_from_html, Block, BULLET};
pub use render::{render_markdown, render_markdown_with_options, MarkdownOptions};

/// Document shown on first launch and after a reset.
pub const SAMPLE_MARKDOWN: &str = r#"# Hello, Markdown!

This is a **bold** text, and this is an *italic* text.

## Lists

### Unordered List
- Item 1
- Item 2
- Item 3

### Ordered List
1. First item
2. Second item
3. Third item

## Code

```javascript
function greet() {
  console.log("Hello, world!");
}
```

## Links and Images

[Visit GitHub](https://github.com)

![Markdown Converter Logo](/placeholder.svg?height=200&width=400)
"#;
