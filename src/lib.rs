//! Markport
//!
//! Converts Markdown to HTML and exports the result as HTML, PDF, plain text
//! or DOCX. The library holds the conversion and export pipeline; the binary
//! wraps it in an egui desktop application.

pub mod app;
pub mod config;
pub mod error;
pub mod export;
pub mod files;
pub mod markdown;
pub mod resources;
pub mod sanitize;
pub mod state;
pub mod ui;

pub use error::{Error, Result};
