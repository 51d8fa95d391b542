//! Centralized error handling for Markport
//!
//! This module provides a unified error type that covers all error scenarios
//! in the application: file I/O, configuration, resource loading and the
//! export pipeline.

use crate::export::ExportFormat;
use crate::resources::ResourceKind;
use log::warn;
use std::fmt;
use std::io;
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Custom Result Type Alias
// ─────────────────────────────────────────────────────────────────────────────

/// A specialized `Result` type for the application.
pub type Result<T> = std::result::Result<T, Error>;

/// The centralized error type for the application.
#[derive(Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // File I/O Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Generic I/O error wrapper
    Io(io::Error),

    /// Failed to write file contents
    FileWrite { path: PathBuf, source: io::Error },

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to load configuration file
    ConfigLoad {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to save configuration file
    ConfigSave {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to parse configuration (invalid JSON/format)
    ConfigParse {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration directory not found or inaccessible
    ConfigDirNotFound,

    // ─────────────────────────────────────────────────────────────────────────
    // Resource Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// A script, stylesheet or font could not be loaded
    ResourceLoad {
        kind: ResourceKind,
        url: String,
        message: String,
    },

    /// The transport could not complete a request
    Network { url: String, message: String },

    /// The server answered with a non-2xx status
    HttpStatus {
        url: String,
        status: u16,
        status_text: String,
    },

    /// All fetch attempts failed
    FetchFailed {
        url: String,
        attempts: u32,
        source: Box<Error>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Export Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// The PDF rendering engine could not be acquired
    EngineUnavailable(String),

    /// Rendering the document into a bitmap failed
    Rasterize(String),

    /// Assembling the PDF document failed
    PdfAssembly(String),

    /// Packing the DOCX document failed
    Docx(String),

    /// The print page could not be opened in a browser
    PrintWindow { path: PathBuf, source: io::Error },

    /// Both the primary PDF export and the print fallback failed
    PdfFallbackFailed {
        primary: Box<Error>,
        fallback: Box<Error>,
    },

    /// Another export is still running
    ExportInProgress(ExportFormat),

    // ─────────────────────────────────────────────────────────────────────────
    // Application Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Generic application error with a message
    Application(String),
}

// Implement From traits for convenient error conversion
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigParse {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::PdfAssembly(err.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Display trait implementation for user-friendly error messages
// ─────────────────────────────────────────────────────────────────────────────
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // File I/O Errors
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::FileWrite { path, source } => {
                write!(f, "Failed to write '{}': {}", path.display(), source)
            }

            // Configuration Errors
            Error::ConfigLoad { path, source } => {
                write!(
                    f,
                    "Failed to load configuration from '{}': {}",
                    path.display(),
                    source
                )
            }
            Error::ConfigSave { path, source } => {
                write!(
                    f,
                    "Failed to save configuration to '{}': {}",
                    path.display(),
                    source
                )
            }
            Error::ConfigParse { message, .. } => {
                write!(f, "Invalid configuration format: {}", message)
            }
            Error::ConfigDirNotFound => {
                write!(f, "Configuration directory not found")
            }

            // Resource Errors
            Error::ResourceLoad { kind, url, message } => {
                write!(f, "Failed to load {}: {} ({})", kind.label(), url, message)
            }
            Error::Network { url, message } => {
                write!(f, "Request to {} failed: {}", url, message)
            }
            Error::HttpStatus {
                status,
                status_text,
                ..
            } => write!(
                f,
                "Network response was not ok: {} {}",
                status, status_text
            ),
            Error::FetchFailed { source, .. } => {
                write!(f, "Failed to fetch resource: {}", source)
            }

            // Export Errors
            Error::EngineUnavailable(msg) => {
                write!(
                    f,
                    "Failed to load the PDF rendering engine: {}. Please try the fallback method.",
                    msg
                )
            }
            Error::Rasterize(msg) => write!(f, "Failed to render document: {}", msg),
            Error::PdfAssembly(msg) => write!(f, "Failed to assemble PDF: {}", msg),
            Error::Docx(msg) => write!(f, "Failed to build DOCX: {}", msg),
            Error::PrintWindow { source, .. } => write!(
                f,
                "Could not open print window. Please check that a default browser is configured: {}",
                source
            ),
            Error::PdfFallbackFailed { primary, fallback } => write!(
                f,
                "PDF export failed ({}) and the print fallback failed too ({})",
                primary, fallback
            ),
            Error::ExportInProgress(format) => {
                write!(f, "An export to {} is already in progress", format.label())
            }

            // Application Errors
            Error::Application(msg) => write!(f, "{}", msg),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// std::error::Error trait implementation for error chaining
// ─────────────────────────────────────────────────────────────────────────────
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::FileWrite { source, .. } => Some(source),
            Error::ConfigLoad { source, .. } => Some(source.as_ref()),
            Error::ConfigSave { source, .. } => Some(source.as_ref()),
            Error::ConfigParse { source, .. } => source
                .as_ref()
                .map(|s| s.as_ref() as &(dyn std::error::Error + 'static)),
            Error::FetchFailed { source, .. } => Some(source.as_ref()),
            Error::PrintWindow { source, .. } => Some(source),
            Error::PdfFallbackFailed { fallback, .. } => Some(fallback.as_ref()),
            Error::ConfigDirNotFound
            | Error::ResourceLoad { .. }
            | Error::Network { .. }
            | Error::HttpStatus { .. }
            | Error::EngineUnavailable(_)
            | Error::Rasterize(_)
            | Error::PdfAssembly(_)
            | Error::Docx(_)
            | Error::ExportInProgress(_)
            | Error::Application(_) => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Graceful Degradation Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Extension trait for Result to support graceful degradation.
pub trait ResultExt<T> {
    /// If the result is an error, log it at warning level and return the provided default.
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T;
}

impl<T> ResultExt<T> for Result<T> {
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                warn!("{}: {}. Using default.", context, err);
                default
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_creation() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "test error");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_result: std::result::Result<String, _> = serde_json::from_str("invalid json");
        let err = Error::from(json_result.unwrap_err());
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_display_config_dir_not_found() {
        let err = Error::ConfigDirNotFound;
        assert_eq!(err.to_string(), "Configuration directory not found");
    }

    #[test]
    fn test_display_resource_load_names_kind_and_url() {
        let err = Error::ResourceLoad {
            kind: ResourceKind::Script,
            url: "https://cdn.example.com/lib.js".to_string(),
            message: "404 Not Found".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to load script: https://cdn.example.com/lib.js"));
    }

    #[test]
    fn test_fetch_failed_wraps_original_cause() {
        use std::error::Error as StdError;
        let err = Error::FetchFailed {
            url: "https://example.com".to_string(),
            attempts: 4,
            source: Box::new(Error::HttpStatus {
                url: "https://example.com".to_string(),
                status: 503,
                status_text: "Service Unavailable".to_string(),
            }),
        };
        assert_eq!(
            err.to_string(),
            "Failed to fetch resource: Network response was not ok: 503 Service Unavailable"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_print_window_error_mentions_cause() {
        let err = Error::PrintWindow {
            path: PathBuf::from("/tmp/doc-print.html"),
            source: io::Error::new(io::ErrorKind::NotFound, "no browser"),
        };
        let msg = err.to_string();
        assert!(msg.contains("Could not open print window"));
        assert!(msg.contains("no browser"));
    }

    #[test]
    fn test_fallback_failure_keeps_both_causes() {
        let err = Error::PdfFallbackFailed {
            primary: Box::new(Error::Rasterize("bitmap too large".to_string())),
            fallback: Box::new(Error::Application("blocked".to_string())),
        };
        let msg = err.to_string();
        assert!(msg.contains("bitmap too large"));
        assert!(msg.contains("blocked"));
    }

    #[test]
    fn test_error_source_none_for_simple_variants() {
        use std::error::Error as StdError;
        let err = Error::Application("test".to_string());
        assert!(err.source().is_none());

        let err = Error::ExportInProgress(ExportFormat::Pdf);
        assert!(err.source().is_none());
    }

    #[test]
    fn test_unwrap_or_warn_default_ok() {
        let result: super::Result<i32> = Ok(42);
        assert_eq!(result.unwrap_or_warn_default(0, "test context"), 42);
    }

    #[test]
    fn test_unwrap_or_warn_default_err() {
        let result: super::Result<i32> = Err(Error::Application("test".to_string()));
        assert_eq!(result.unwrap_or_warn_default(0, "test context"), 0);
    }
}
