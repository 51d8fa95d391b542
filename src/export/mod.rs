//! Document Export Module for Markport
//!
//! This module exports rendered documents to HTML, PDF, plain text and DOCX,
//! and routes export requests to the right exporter.
//!
//! # Supported Export Formats
//!
//! - **HTML**: Standalone document with an inline stylesheet
//! - **PDF**: Rasterized A4 pages, with a print-page fallback
//! - **TXT**: The markdown source, unchanged
//! - **DOCX**: The text content as a single paragraph
//!
//! # Architecture
//!
//! - `sink.rs` - artifact type and destinations
//! - `html.rs` - HTML document generation
//! - `pdf/` - rasterized PDF pipeline
//! - `fallback.rs` - print-page PDF fallback
//! - `text.rs` / `docx.rs` - plain text and Word exports
//! - `clipboard.rs` - copying the HTML source

pub mod clipboard;
pub mod docx;
pub mod fallback;
pub mod html;
pub mod pdf;
mod sink;
pub mod text;

pub use clipboard::{ClipboardError, SourceClipboard};
pub use docx::export_to_docx;
pub use fallback::{fallback_pdf_export, Opener, SystemOpener};
pub use html::{export_to_html, generate_html_document};
pub use pdf::PdfExporter;
pub use sink::{Artifact, ArtifactSink, DirectorySink, MemorySink};
pub use text::export_to_txt;

use crate::config::{ExportSettings, Settings};
use crate::error::{Error, Result};
use crate::resources::{
    Backoff, HttpFetcher, Resource, ResourceKind, ResourceLoader, ResourceRef,
    ResourceRegistry, RetryingFetcher,
};
use log::{error, info, warn};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

// ─────────────────────────────────────────────────────────────────────────────
// Export Format
// ─────────────────────────────────────────────────────────────────────────────

/// Supported export formats for documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Html,
    Pdf,
    Txt,
    Docx,
}

impl ExportFormat {
    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Html => "html",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Txt => "txt",
            ExportFormat::Docx => "docx",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Html => "text/html",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Txt => "text/plain",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    /// Uppercase label used in buttons and messages.
    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Html => "HTML",
            ExportFormat::Pdf => "PDF",
            ExportFormat::Txt => "TXT",
            ExportFormat::Docx => "DOCX",
        }
    }

    /// Get all available export formats.
    pub fn all() -> &'static [ExportFormat] {
        &[
            ExportFormat::Html,
            ExportFormat::Pdf,
            ExportFormat::Txt,
            ExportFormat::Docx,
        ]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Requests and Outcomes
// ─────────────────────────────────────────────────────────────────────────────

/// One export to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    /// HTML for HTML/PDF/DOCX, markdown for TXT
    pub content: String,
    /// Base file name, without extension
    pub filename: String,
    pub format: ExportFormat,
}

impl ExportRequest {
    /// Build a request for the current document, choosing the right content.
    pub fn for_document(format: ExportFormat, markdown: &str, html: &str, filename: &str) -> Self {
        let content = match format {
            ExportFormat::Txt => markdown,
            ExportFormat::Html | ExportFormat::Pdf | ExportFormat::Docx => html,
        };
        Self {
            content: content.to_string(),
            filename: sanitize_filename(filename),
            format,
        }
    }
}

/// What a successful export produced.
#[derive(Debug)]
pub enum ExportOutcome {
    /// The artifact was saved at this path
    Saved(PathBuf),
    /// The PDF renderer failed and the print page was opened instead
    PrintFallback { path: PathBuf, primary_error: Error },
}

impl ExportOutcome {
    pub fn path(&self) -> &Path {
        match self {
            ExportOutcome::Saved(path) => path,
            ExportOutcome::PrintFallback { path, .. } => path,
        }
    }
}

/// Make `name` safe to use as a file name.
///
/// Path separators and characters reserved on Windows become `_`. An empty
/// name becomes the default export name.
pub fn sanitize_filename(name: &str) -> String {
    static RESERVED: OnceLock<Option<Regex>> = OnceLock::new();
    let reserved = RESERVED.get_or_init(|| Regex::new(r#"[\\/:*?"<>|\x00-\x1f]"#).ok());

    let trimmed = name.trim();
    let cleaned = match reserved {
        Some(re) => re.replace_all(trimmed, "_").into_owned(),
        None => trimmed.to_string(),
    };
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        ExportSettings::DEFAULT_FILENAME.to_string()
    } else {
        cleaned.to_string()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Export Dispatcher
// ─────────────────────────────────────────────────────────────────────────────

/// Routes export requests to the exporters.
///
/// Cloning is cheap; clones share the resource registry and the PDF engine.
#[derive(Clone)]
pub struct Exporter {
    sink: Arc<dyn ArtifactSink>,
    loader: ResourceLoader,
    pdf: Arc<PdfExporter>,
    print_dir: PathBuf,
    opener: Arc<dyn Opener>,
    head_resources: Vec<ResourceRef>,
}

impl Exporter {
    pub fn new(
        sink: Arc<dyn ArtifactSink>,
        loader: ResourceLoader,
        pdf: Arc<PdfExporter>,
        print_dir: PathBuf,
        opener: Arc<dyn Opener>,
    ) -> Self {
        Self {
            sink,
            loader,
            pdf,
            print_dir,
            opener,
            head_resources: Vec::new(),
        }
    }

    /// Build the application exporter from settings.
    ///
    /// Network resources are fetched over HTTP with the configured retries;
    /// files land in the configured output directory.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = HttpFetcher::new(settings.network.timeout())?;
        let fetcher = RetryingFetcher::new(
            Arc::new(http),
            settings.network.retries,
            Backoff {
                step: settings.network.backoff_step(),
            },
        );
        let loader = ResourceLoader::new(Arc::new(ResourceRegistry::new()), Arc::new(fetcher));

        Ok(Self::new(
            Arc::new(DirectorySink::new(settings.export.resolved_output_dir())),
            loader,
            Arc::new(PdfExporter::new(&settings.pdf)),
            default_print_dir(),
            Arc::new(SystemOpener),
        )
        .with_head_resources(settings.export.embedded_resources.clone()))
    }

    /// Resources inlined into the head of HTML exports.
    pub fn with_head_resources(mut self, resources: Vec<ResourceRef>) -> Self {
        self.head_resources = resources;
        self
    }

    /// A copy of this exporter writing to a different sink.
    pub fn with_sink(&self, sink: Arc<dyn ArtifactSink>) -> Self {
        Self {
            sink,
            ..self.clone()
        }
    }

    pub fn loader(&self) -> &ResourceLoader {
        &self.loader
    }

    /// Run one export.
    ///
    /// A failed PDF render falls back to the print page exactly once. If the
    /// fallback fails too, both causes are returned.
    pub fn export(&self, request: &ExportRequest) -> Result<ExportOutcome> {
        let filename = &request.filename;
        let content = &request.content;
        info!("Exporting {} as {}", filename, request.format.label());

        let result = match request.format {
            ExportFormat::Html => {
                let resources = self.load_head_resources();
                export_to_html(content, filename, &resources, self.sink.as_ref())
            }
            ExportFormat::Txt => export_to_txt(content, filename, self.sink.as_ref()),
            ExportFormat::Docx => export_to_docx(content, filename, self.sink.as_ref()),
            ExportFormat::Pdf => {
                return self.export_pdf(content, filename);
            }
        };

        result.map(ExportOutcome::Saved).map_err(|e| {
            error!("{} export failed: {}", request.format.label(), e);
            e
        })
    }

    fn export_pdf(&self, html: &str, filename: &str) -> Result<ExportOutcome> {
        let primary = match self
            .pdf
            .export(html, filename, &self.loader, self.sink.as_ref())
        {
            Ok(path) => return Ok(ExportOutcome::Saved(path)),
            Err(e) => e,
        };

        warn!("PDF export failed, trying print fallback: {}", primary);
        match fallback_pdf_export(html, filename, &self.print_dir, self.opener.as_ref()) {
            Ok(path) => Ok(ExportOutcome::PrintFallback {
                path,
                primary_error: primary,
            }),
            Err(fallback) => {
                error!("Print fallback failed: {}", fallback);
                Err(Error::PdfFallbackFailed {
                    primary: Box::new(primary),
                    fallback: Box::new(fallback),
                })
            }
        }
    }

    fn load_head_resources(&self) -> Vec<Resource> {
        self.head_resources
            .iter()
            .filter(|reference| {
                let inlined = reference.kind == ResourceKind::Stylesheet;
                if !inlined {
                    warn!(
                        "Skipping embedded {} {}: only stylesheets are inlined",
                        reference.kind.label(),
                        reference.url
                    );
                }
                inlined
            })
            .filter_map(|reference| match self.loader.load(reference.kind, &reference.url) {
                Ok(resource) => Some(resource),
                Err(e) => {
                    warn!("Skipping embedded resource: {}", e);
                    None
                }
            })
            .collect()
    }
}

/// Where print pages are written.
pub fn default_print_dir() -> PathBuf {
    std::env::temp_dir().join("markport")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_metadata() {
        assert_eq!(ExportFormat::Html.extension(), "html");
        assert_eq!(ExportFormat::Pdf.mime(), "application/pdf");
        assert_eq!(ExportFormat::Txt.mime(), "text/plain");
        assert_eq!(ExportFormat::Docx.label(), "DOCX");
        assert_eq!(ExportFormat::all().len(), 4);
    }

    #[test]
    fn test_request_uses_markdown_for_txt_only() {
        let txt = ExportRequest::for_document(ExportFormat::Txt, "# md", "<h1>md</h1>", "doc");
        assert_eq!(txt.content, "# md");

        for format in [ExportFormat::Html, ExportFormat::Pdf, ExportFormat::Docx] {
            let request = ExportRequest::for_document(format, "# md", "<h1>md</h1>", "doc");
            assert_eq!(request.content, "<h1>md</h1>");
        }
    }

    #[test]
    fn test_sanitize_filename_replaces_reserved_characters() {
        assert_eq!(sanitize_filename("a/b\\c:d*e?f\"g<h>i|j"), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(sanitize_filename("  notes  "), "notes");
        assert_eq!(sanitize_filename("../secret"), "_secret");
    }

    #[test]
    fn test_sanitize_filename_empty_uses_default() {
        assert_eq!(sanitize_filename(""), "markdown-export");
        assert_eq!(sanitize_filename("   "), "markdown-export");
        assert_eq!(sanitize_filename(".."), "markdown-export");
    }

    #[test]
    fn test_outcome_path() {
        let saved = ExportOutcome::Saved(PathBuf::from("/out/doc.pdf"));
        assert_eq!(saved.path(), Path::new("/out/doc.pdf"));

        let fallback = ExportOutcome::PrintFallback {
            path: PathBuf::from("/tmp/doc-print.html"),
            primary_error: Error::Rasterize("x".to_string()),
        };
        assert_eq!(fallback.path(), Path::new("/tmp/doc-print.html"));
    }
}
