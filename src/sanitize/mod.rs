//! HTML sanitization for exported documents
//!
//! Every export path writes HTML into a fresh document context (a standalone
//! file, a print page, a rasterized page), so the rendered HTML is cleaned
//! against a fixed allow-list before it leaves the converter.
//!
//! - `sanitize` restricts markup to the allowed tags and attributes
//! - `extract_text` flattens a fragment into its text content
//! - `tokenize` splits a fragment for the block layout used by previews and PDFs

mod tokens;

pub use tokens::{tokenize, Token};

use ammonia::Builder;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// Tags that survive sanitization.
pub const ALLOWED_TAGS: &[&str] = &[
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "p",
    "a",
    "ul",
    "ol",
    "li",
    "b",
    "i",
    "strong",
    "em",
    "code",
    "pre",
    "blockquote",
    "img",
    "table",
    "thead",
    "tbody",
    "tr",
    "th",
    "td",
    "hr",
    "br",
];

/// Attributes that survive sanitization, on any allowed tag.
pub const ALLOWED_ATTRIBUTES: &[&str] = &["href", "src", "alt", "title", "class"];

/// Per-tag attributes on top of the generic ones.
const TAG_ATTRIBUTES: &[(&str, &[&str])] = &[("ol", &["start"])];

/// URL schemes permitted in `href` and `src`.
const ALLOWED_URL_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

/// Tags removed together with everything inside them.
const CLEAN_CONTENT_TAGS: &[&str] = &["script", "style"];

fn builder() -> &'static Builder<'static> {
    static BUILDER: OnceLock<Builder<'static>> = OnceLock::new();
    BUILDER.get_or_init(|| {
        let mut builder = Builder::default();
        builder
            .tags(ALLOWED_TAGS.iter().copied().collect::<HashSet<_>>())
            .tag_attributes(
                TAG_ATTRIBUTES
                    .iter()
                    .map(|&(tag, attrs)| (tag, attrs.iter().copied().collect::<HashSet<_>>()))
                    .collect::<HashMap<_, _>>(),
            )
            .generic_attributes(ALLOWED_ATTRIBUTES.iter().copied().collect::<HashSet<_>>())
            .url_schemes(ALLOWED_URL_SCHEMES.iter().copied().collect::<HashSet<_>>())
            .clean_content_tags(CLEAN_CONTENT_TAGS.iter().copied().collect::<HashSet<_>>())
            .link_rel(None)
            .strip_comments(true);
        builder
    })
}

/// Restrict `html` to the allow-list.
///
/// Malformed input is never an error; whatever the HTML parser recovers is
/// cleaned and re-serialized. The transform is idempotent.
pub fn sanitize(html: &str) -> String {
    builder().clean(html).to_string()
}

/// Concatenate the text content of an HTML fragment.
///
/// No separators are inserted between elements, so `<h1>A</h1><p>B</p>`
/// yields `AB`. Entities are decoded.
pub fn extract_text(html: &str) -> String {
    tokenize(html)
        .into_iter()
        .filter_map(|token| match token {
            Token::Text(text) => Some(text),
            _ => None,
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_tag_removed_with_content() {
        let out = sanitize("<script>alert(1)</script><p>ok</p>");
        assert!(out.contains("<p>ok</p>"));
        assert!(!out.contains("<script"));
        assert!(!out.contains("alert"));
    }

    #[test]
    fn test_event_handler_attribute_removed() {
        let out = sanitize(r#"<img src="cat.png" alt="cat" onerror="alert(1)">"#);
        assert!(out.contains(r#"src="cat.png""#));
        assert!(out.contains(r#"alt="cat""#));
        assert!(!out.contains("onerror"));
    }

    #[test]
    fn test_javascript_uri_removed() {
        let out = sanitize(r#"<a href="javascript:alert(1)">click</a>"#);
        assert!(!out.contains("javascript"));
        assert!(out.contains("click"));
    }

    #[test]
    fn test_allowed_link_kept_without_rel() {
        let out = sanitize(r#"<a href="https://example.com" title="t">x</a>"#);
        assert_eq!(out, r#"<a href="https://example.com" title="t">x</a>"#);
    }

    #[test]
    fn test_disallowed_tags_unwrapped() {
        let out = sanitize("<div><span>text</span></div><iframe src=\"x\"></iframe>");
        assert!(!out.contains("<div"));
        assert!(!out.contains("<span"));
        assert!(!out.contains("<iframe"));
        assert!(out.contains("text"));
    }

    #[test]
    fn test_class_attribute_kept_on_code() {
        let html = "<pre><code class=\"language-rust\">fn main() {}</code></pre>";
        assert_eq!(sanitize(html), html);
    }

    #[test]
    fn test_style_and_id_attributes_removed() {
        let out = sanitize(r#"<p style="color:red" id="x" class="lead">hi</p>"#);
        assert_eq!(out, r#"<p class="lead">hi</p>"#);
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let inputs = [
            "<script>alert(1)</script><p>ok</p>",
            "<h1>Title</h1><p>a &amp; b &lt; c</p>",
            r#"<table><tr><td onclick="x()">1</td></tr></table>"#,
            "<p>unclosed <b>bold <i>both</p>",
            r#"<img src="javascript:bad()" alt="a > b">"#,
            "plain text with <unknown>tags</unknown>",
            "",
        ];
        for input in inputs {
            let once = sanitize(input);
            let twice = sanitize(&once);
            assert_eq!(once, twice, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_extract_text_concatenates_blocks() {
        assert_eq!(extract_text("<h1>Title</h1><p>Body</p>"), "TitleBody");
    }

    #[test]
    fn test_extract_text_decodes_entities() {
        assert_eq!(extract_text("<p>a &amp; b &lt;c&gt;</p>"), "a & b <c>");
    }

    #[test]
    fn test_extract_text_ignores_attribute_values() {
        let html = r#"<img src="x.png" alt="a > b"><p title="t">text</p>"#;
        assert_eq!(extract_text(html), "text");
    }

    #[test]
    fn test_extract_text_recovers_from_unterminated_quote() {
        let html = r#"<p>visible</p><img alt="open title='x'>hidden"#;
        assert_eq!(extract_text(html), "visible");
    }

    #[test]
    fn test_extract_text_skips_script_and_style_bodies() {
        let html = "<style>b{}</style><p>a</p><script>var x = '<p>';</script>";
        assert_eq!(extract_text(html), "a");
    }

    #[test]
    fn test_ordered_list_start_kept() {
        let out = sanitize(r#"<ol start="3" type="a"><li>x</li></ol>"#);
        assert_eq!(out, r#"<ol start="3"><li>x</li></ol>"#);
    }

    #[test]
    fn test_start_attribute_only_on_ordered_lists() {
        let out = sanitize(r#"<ul start="3"><li>x</li></ul>"#);
        assert_eq!(out, "<ul><li>x</li></ul>");
    }
}
