//! Plain text export: the markdown source, byte for byte.

use super::{Artifact, ArtifactSink, ExportFormat};
use crate::error::Result;
use std::path::PathBuf;

/// Save `markdown` unchanged as `{filename}.txt`.
pub fn export_to_txt(markdown: &str, filename: &str, sink: &dyn ArtifactSink) -> Result<PathBuf> {
    let artifact = Artifact::new(filename, ExportFormat::Txt, markdown.as_bytes().to_vec());
    sink.save(&artifact)
}
