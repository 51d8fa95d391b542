//! DOCX export
//!
//! The document is reduced to its text content and written as a single
//! paragraph with a single run. Headings, lists and emphasis are not carried
//! over; this is the expected output, not a degraded one.

use super::{Artifact, ArtifactSink, ExportFormat};
use crate::error::{Error, Result};
use crate::sanitize::{extract_text, sanitize};
use docx_rs::{Docx, Paragraph, Run};
use std::io::Cursor;
use std::path::PathBuf;

/// Save the text content of `html` as `{filename}.docx`.
pub fn export_to_docx(html: &str, filename: &str, sink: &dyn ArtifactSink) -> Result<PathBuf> {
    let bytes = build_docx(html)?;
    sink.save(&Artifact::new(filename, ExportFormat::Docx, bytes))
}

/// Pack the text content of `html` into DOCX bytes.
pub fn build_docx(html: &str) -> Result<Vec<u8>> {
    let text = extract_text(&sanitize(html));

    let mut buffer = Vec::new();
    Docx::new()
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text(text)))
        .build()
        .pack(&mut Cursor::new(&mut buffer))
        .map_err(|e| Error::Docx(e.to_string()))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::MemorySink;
    use std::io::Read;

    fn document_xml(bytes: &[u8]) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .unwrap()
            .read_to_string(&mut xml)
            .unwrap();
        xml
    }

    #[test]
    fn test_docx_contains_concatenated_text() {
        let bytes = build_docx("<h1>Title</h1><p>Body</p>").unwrap();
        let xml = document_xml(&bytes);
        assert!(xml.contains("TitleBody"));
        assert_eq!(xml.matches("<w:p>").count() + xml.matches("<w:p ").count(), 1);
    }

    #[test]
    fn test_docx_drops_script_content() {
        let bytes = build_docx("<p>safe</p><script>evil()</script>").unwrap();
        let xml = document_xml(&bytes);
        assert!(xml.contains("safe"));
        assert!(!xml.contains("evil"));
    }

    #[test]
    fn test_export_to_docx_names_artifact() {
        let sink = MemorySink::new();
        export_to_docx("<p>x</p>", "report", &sink).unwrap();
        let artifact = &sink.artifacts()[0];
        assert_eq!(artifact.file_name, "report.docx");
        assert!(artifact.bytes.starts_with(b"PK"));
    }
}
