//! Print-page PDF export
//!
//! Used when the built-in PDF renderer fails. The document is written as a
//! print-ready HTML page and handed to the system browser, where the user
//! prints it or saves it as PDF.

use super::html::DOCUMENT_CSS;
use crate::error::{Error, Result};
use crate::sanitize::sanitize;
use html_escape::encode_text;
use log::{info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Opens a file with an external application.
pub trait Opener: Send + Sync {
    fn open(&self, path: &Path) -> io::Result<()>;
}

/// Opens files with the platform's default handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl Opener for SystemOpener {
    fn open(&self, path: &Path) -> io::Result<()> {
        open::that(path)
    }
}

/// Styles that only apply to the print page.
const PRINT_CSS: &str = r#"
@media print {
    body {
        padding: 0;
    }
    .no-print {
        display: none;
    }
}
"#;

/// Build the print page around an already sanitized body.
pub fn generate_print_document(body: &str, title: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>{css}{print_css}</style>
</head>
<body>
<div class="no-print" style="margin-bottom: 20px; text-align: center;">
<p>Use your browser's print function to save as PDF</p>
<button onclick="window.print()" style="padding: 8px 16px; background: #0070f3; color: white; border: none; border-radius: 4px; cursor: pointer;">Print / Save as PDF</button>
</div>
{body}
</body>
</html>
"#,
        title = encode_text(title),
        css = DOCUMENT_CSS,
        print_css = PRINT_CSS,
        body = body,
    )
}

/// Write `{filename}-print.html` into `print_dir` and open it.
///
/// If the page cannot be opened it is removed again and
/// [`Error::PrintWindow`] is returned.
pub fn fallback_pdf_export(
    html: &str,
    filename: &str,
    print_dir: &Path,
    opener: &dyn Opener,
) -> Result<PathBuf> {
    let path = print_dir.join(format!("{}-print.html", filename));
    let document = generate_print_document(&sanitize(html), filename);

    fs::create_dir_all(print_dir)
        .and_then(|_| fs::write(&path, document))
        .map_err(|source| Error::FileWrite {
            path: path.clone(),
            source,
        })?;

    if let Err(source) = opener.open(&path) {
        if let Err(e) = fs::remove_file(&path) {
            warn!("Failed to remove print page {}: {}", path.display(), e);
        }
        return Err(Error::PrintWindow { path, source });
    }

    info!("Opened print page {}", path.display());
    Ok(path)
}
