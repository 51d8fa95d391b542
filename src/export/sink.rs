//! Artifact delivery
//!
//! Exporters never touch the filesystem directly. They hand a finished
//! [`Artifact`] to an [`ArtifactSink`], which decides where it ends up.

use super::ExportFormat;
use crate::error::{Error, Result};
use log::{debug, info};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// A finished export: file name, MIME type and content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// Build an artifact named `{filename}.{extension}`.
    pub fn new(filename: &str, format: ExportFormat, bytes: Vec<u8>) -> Self {
        Self {
            file_name: format!("{}.{}", filename, format.extension()),
            mime: format.mime(),
            bytes,
        }
    }
}

/// Destination for exported artifacts.
pub trait ArtifactSink: Send + Sync {
    /// Store the artifact and return where it was saved.
    fn save(&self, artifact: &Artifact) -> Result<PathBuf>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Directory Sink
// ─────────────────────────────────────────────────────────────────────────────

/// Writes artifacts into a directory.
///
/// Content goes to a temporary file in the same directory which is renamed
/// into place once fully written. An interrupted export leaves no partial
/// file behind; the temporary file is removed when dropped.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactSink for DirectorySink {
    fn save(&self, artifact: &Artifact) -> Result<PathBuf> {
        let path = self.dir.join(&artifact.file_name);
        let write_error = |source| Error::FileWrite {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(write_error)?;

        let mut temp = NamedTempFile::new_in(&self.dir).map_err(write_error)?;
        temp.write_all(&artifact.bytes).map_err(write_error)?;
        temp.flush().map_err(write_error)?;
        debug!(
            "Wrote {} bytes for {} to {}",
            artifact.bytes.len(),
            artifact.file_name,
            temp.path().display()
        );

        temp.persist(&path).map_err(|e| write_error(e.error))?;
        info!("Saved {} ({})", path.display(), artifact.mime);
        Ok(path)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Sink
// ─────────────────────────────────────────────────────────────────────────────

/// Keeps artifacts in memory. Returned paths are the bare file names.
#[derive(Debug, Default)]
pub struct MemorySink {
    saved: Mutex<Vec<Artifact>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything saved so far, in order.
    pub fn artifacts(&self) -> Vec<Artifact> {
        self.saved
            .lock()
            .map(|saved| saved.clone())
            .unwrap_or_default()
    }
}

impl ArtifactSink for MemorySink {
    fn save(&self, artifact: &Artifact) -> Result<PathBuf> {
        self.saved
            .lock()
            .map_err(|_| Error::Application("artifact store poisoned".to_string()))?
            .push(artifact.clone());
        Ok(PathBuf::from(&artifact.file_name))
    }
}
