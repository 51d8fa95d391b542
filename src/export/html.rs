//! HTML Export Generation
//!
//! This module wraps sanitized HTML in a standalone document with a fixed
//! inline stylesheet, so the exported file renders the same anywhere.

use super::{Artifact, ArtifactSink, ExportFormat};
use crate::error::Result;
use crate::resources::{Resource, ResourceKind};
use crate::sanitize::sanitize;
use html_escape::encode_text;
use log::{debug, warn};
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Stylesheets
// ─────────────────────────────────────────────────────────────────────────────

/// Typography, code blocks and image scaling for exported documents.
pub(crate) const DOCUMENT_CSS: &str = r#"
body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, Cantarell, 'Open Sans', 'Helvetica Neue', sans-serif;
    line-height: 1.6;
    padding: 2em;
    max-width: 800px;
    margin: 0 auto;
}
pre {
    background-color: #f5f5f5;
    padding: 1em;
    border-radius: 4px;
    overflow-x: auto;
}
code {
    font-family: 'Courier New', Courier, monospace;
}
img {
    max-width: 100%;
}
"#;

// ─────────────────────────────────────────────────────────────────────────────
// HTML Generation
// ─────────────────────────────────────────────────────────────────────────────

/// Build a complete HTML document around an already sanitized body.
///
/// Loaded stylesheets are inlined as `<style>`, in the order given, after the
/// built-in stylesheet. Other resource kinds are never written, and a
/// stylesheet that could close its `<style>` element is dropped.
pub fn generate_html_document(body: &str, title: &str, head_resources: &[Resource]) -> String {
    let mut head_extra = String::new();
    for resource in head_resources {
        if resource.kind != ResourceKind::Stylesheet {
            debug!("Not inlining {} {}", resource.kind.label(), resource.url);
            continue;
        }
        let css = resource.text();
        if closes_style_element(css) {
            warn!("Dropping stylesheet {}: contains </style", resource.url);
            continue;
        }
        head_extra.push_str("<style>\n");
        head_extra.push_str(css);
        head_extra.push_str("\n</style>\n");
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>{css}</style>
{head_extra}</head>
<body>
{body}
</body>
</html>
"#,
        title = encode_text(title),
        css = DOCUMENT_CSS,
        head_extra = head_extra,
        body = body,
    )
}

/// Whether `css` contains an end tag for `<style>`, in any letter case.
fn closes_style_element(css: &str) -> bool {
    css.as_bytes()
        .windows(b"</style".len())
        .any(|window| window.eq_ignore_ascii_case(b"</style"))
}

/// Sanitize `html` and save it as a standalone `{filename}.html`.
pub fn export_to_html(
    html: &str,
    filename: &str,
    head_resources: &[Resource],
    sink: &dyn ArtifactSink,
) -> Result<PathBuf> {
    let document = generate_html_document(&sanitize(html), filename, head_resources);
    sink.save(&Artifact::new(
        filename,
        ExportFormat::Html,
        document.into_bytes(),
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::MemorySink;
    use std::sync::Arc;

    fn exported(html: &str, filename: &str, resources: &[Resource]) -> String {
        let sink = MemorySink::new();
        export_to_html(html, filename, resources, &sink).unwrap();
        let artifact = sink.artifacts().remove(0);
        assert_eq!(artifact.mime, "text/html");
        String::from_utf8(artifact.bytes).unwrap()
    }

    #[test]
    fn test_generate_html_document_structure() {
        let html = generate_html_document("<p>Body</p>", "Doc", &[]);

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"<meta charset="utf-8">"#));
        assert!(html.contains("<title>Doc</title>"));
        assert!(html.contains("max-width: 100%"));
        assert!(html.contains("<body>\n<p>Body</p>\n</body>"));
    }

    #[test]
    fn test_export_sanitizes_body() {
        let doc = exported(
            r#"<h1>Title</h1><script>alert(1)</script><img src="x" onerror="bad()">"#,
            "page",
            &[],
        );
        assert!(doc.contains("<h1>Title</h1>"));
        assert!(!doc.contains("alert"));
        assert!(!doc.contains("onerror"));
    }

    #[test]
    fn test_title_is_escaped() {
        let doc = generate_html_document("", "a<b>&c", &[]);
        assert!(doc.contains("<title>a&lt;b&gt;&amp;c</title>"));
    }

    #[test]
    fn test_export_names_artifact() {
        let sink = MemorySink::new();
        let path = export_to_html("<p>x</p>", "notes", &[], &sink).unwrap();
        assert_eq!(path, PathBuf::from("notes.html"));
    }

    fn resource(kind: ResourceKind, url: &str, body: &str) -> Resource {
        Resource {
            kind,
            url: url.to_string(),
            content: Arc::from(body.as_bytes().to_vec()),
        }
    }

    #[test]
    fn test_stylesheets_are_inlined_in_order() {
        let resources = vec![
            resource(ResourceKind::Stylesheet, "https://cdn/a.css", "h1 { color: teal; }"),
            resource(ResourceKind::Stylesheet, "https://cdn/b.css", "h2 { color: navy; }"),
        ];
        let doc = exported("<p>x</p>", "doc", &resources);

        let first = doc.find("h1 { color: teal; }").unwrap();
        let second = doc.find("h2 { color: navy; }").unwrap();
        assert!(doc.find(DOCUMENT_CSS).unwrap() < first);
        assert!(first < second);
        assert!(second < doc.find("<body>").unwrap());
    }

    #[test]
    fn test_scripts_and_style_breakouts_are_not_inlined() {
        let resources = vec![
            resource(
                ResourceKind::Stylesheet,
                "https://cdn/evil.css",
                "p{}</style><img src=x onerror=alert(1)>",
            ),
            resource(
                ResourceKind::Stylesheet,
                "https://cdn/upper.css",
                "p{}</STYLE ><b>",
            ),
            resource(ResourceKind::Script, "https://cdn/x.js", "alert(document.cookie)"),
            resource(ResourceKind::Font, "https://cdn/f.ttf", "font"),
        ];
        let doc = exported("<p>ok</p>", "doc", &resources);

        assert!(!doc.contains("<script"));
        assert!(!doc.contains("onerror"));
        assert!(!doc.contains("alert"));
        assert!(!doc.contains("<b>"));
        assert_eq!(doc.matches("</style>").count(), 1);
        assert!(doc.contains("<p>ok</p>"));
    }

    #[test]
    fn test_closes_style_element_ignores_case() {
        assert!(closes_style_element("a</style>"));
        assert!(closes_style_element("a</StYlE"));
        assert!(!closes_style_element("a</styl"));
        assert!(!closes_style_element("content: '<style>'"));
    }
}
