//! User settings and preferences for Markport
//!
//! This module defines the `Settings` struct that holds all user-configurable
//! options, with serde support for JSON persistence.

use crate::resources::ResourceRef;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Window Size Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Window dimensions and position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowSize {
    /// Window width in pixels
    pub width: f32,
    /// Window height in pixels
    pub height: f32,
    /// Whether the window was maximized
    #[serde(default)]
    pub maximized: bool,
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            maximized: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Export Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Where and how exported files are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Output directory (None = the platform download directory)
    pub output_dir: Option<PathBuf>,
    /// Base file name, without extension
    pub filename: String,
    /// Open the exported file with the system handler afterwards
    pub open_after_export: bool,
    /// Keep raw HTML embedded in markdown when rendering (exports are still sanitized)
    pub allow_raw_html: bool,
    /// Stylesheets and scripts inlined into HTML exports
    pub embedded_resources: Vec<ResourceRef>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            output_dir: None,
            filename: ExportSettings::DEFAULT_FILENAME.to_string(),
            open_after_export: false,
            allow_raw_html: false,
            embedded_resources: Vec::new(),
        }
    }
}

impl ExportSettings {
    /// Base name used when none is configured.
    pub const DEFAULT_FILENAME: &'static str = "markdown-export";

    /// Resolve the output directory, falling back to downloads, then home.
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .or_else(dirs::download_dir)
            .or_else(dirs::home_dir)
            .unwrap_or_else(std::env::temp_dir)
    }
}

/// Layout parameters of the rasterized PDF export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfSettings {
    /// Width of the layout column in CSS pixels (794 ≈ A4 at 96 DPI)
    pub page_width_px: u32,
    /// Padding around the content in CSS pixels
    pub padding_px: u32,
    /// Raster scale factor
    pub scale: f32,
    /// Font to download for rendering; system fonts are used when unset or unusable
    pub font_url: Option<String>,
}

impl Default for PdfSettings {
    fn default() -> Self {
        Self {
            page_width_px: 794,
            padding_px: 40,
            scale: 2.0,
            font_url: None,
        }
    }
}

/// Retry behaviour for resource downloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// Retries after the first failed attempt
    pub retries: u32,
    /// Backoff step; a retry waits `4 - remaining retries` steps, at least zero
    pub backoff_step_ms: u64,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            retries: 3,
            backoff_step_ms: 1000,
            timeout_secs: 30,
        }
    }
}

impl NetworkSettings {
    pub fn backoff_step(&self) -> Duration {
        Duration::from_millis(self.backoff_step_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Main Settings Struct
// ─────────────────────────────────────────────────────────────────────────────

/// User settings persisted to `config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub window_size: WindowSize,
    pub export: ExportSettings,
    pub pdf: PdfSettings,
    pub network: NetworkSettings,
}

impl Settings {
    // ─────────────────────────────────────────────────────────────────────────
    // Validation Constants and Sanitization
    // ─────────────────────────────────────────────────────────────────────────

    /// Minimum window dimension.
    pub const MIN_WINDOW_SIZE: f32 = 200.0;
    /// Maximum window dimension.
    pub const MAX_WINDOW_SIZE: f32 = 10000.0;
    /// Minimum PDF layout width.
    pub const MIN_PAGE_WIDTH: u32 = 200;
    /// Maximum PDF layout width.
    pub const MAX_PAGE_WIDTH: u32 = 4000;
    /// Maximum PDF padding.
    pub const MAX_PADDING: u32 = 200;
    /// Minimum raster scale.
    pub const MIN_SCALE: f32 = 1.0;
    /// Maximum raster scale.
    pub const MAX_SCALE: f32 = 4.0;
    /// Maximum number of fetch retries.
    pub const MAX_RETRIES: u32 = 10;

    /// Sanitize settings by clamping values to valid ranges.
    ///
    /// This is useful after loading settings from a file that might have
    /// been manually edited with invalid values.
    pub fn sanitize(&mut self) {
        self.window_size.width = self
            .window_size
            .width
            .clamp(Self::MIN_WINDOW_SIZE, Self::MAX_WINDOW_SIZE);
        self.window_size.height = self
            .window_size
            .height
            .clamp(Self::MIN_WINDOW_SIZE, Self::MAX_WINDOW_SIZE);

        if self.export.filename.trim().is_empty() {
            self.export.filename = ExportSettings::DEFAULT_FILENAME.to_string();
        }

        self.pdf.page_width_px = self
            .pdf
            .page_width_px
            .clamp(Self::MIN_PAGE_WIDTH, Self::MAX_PAGE_WIDTH);
        self.pdf.padding_px = self
            .pdf
            .padding_px
            .min(Self::MAX_PADDING)
            .min(self.pdf.page_width_px / 4);
        self.pdf.scale = if self.pdf.scale.is_finite() {
            self.pdf.scale.clamp(Self::MIN_SCALE, Self::MAX_SCALE)
        } else {
            PdfSettings::default().scale
        };
        if self
            .pdf
            .font_url
            .as_ref()
            .is_some_and(|url| url.trim().is_empty())
        {
            self.pdf.font_url = None;
        }

        self.network.retries = self.network.retries.min(Self::MAX_RETRIES);
        if self.network.timeout_secs == 0 {
            self.network.timeout_secs = NetworkSettings::default().timeout_secs;
        }
    }

    /// Load settings and sanitize them to ensure validity.
    ///
    /// This is a convenience method that deserializes and then sanitizes.
    pub fn from_json_sanitized(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.sanitize();
        Ok(settings)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
