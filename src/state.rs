//! Application state management for Markport
//!
//! This module holds the runtime state of the converter: the markdown being
//! edited and its rendered HTML, the selected view, the export lifecycle,
//! and transient UI feedback (toasts, error banner, confirmations).

use crate::config::{
    load_config, save_config_silent, LocalStore, Settings, ACTIVE_TAB_KEY, MARKDOWN_CONTENT_KEY,
};
use crate::error::{Error, Result};
use crate::export::{ExportFormat, ExportOutcome, ExportRequest};
use crate::markdown::{render_markdown, SAMPLE_MARKDOWN};
use log::{debug, info, warn};
use std::path::PathBuf;

/// How long toasts stay visible, in seconds.
pub const TOAST_DURATION: f64 = 3.0;

// ─────────────────────────────────────────────────────────────────────────────
// View Selection
// ─────────────────────────────────────────────────────────────────────────────

/// The view shown in the right-hand pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveTab {
    /// Rendered document
    #[default]
    Preview,
    /// Generated HTML source
    Source,
}

impl ActiveTab {
    /// Value stored under the `active-tab` key.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActiveTab::Preview => "preview",
            ActiveTab::Source => "source",
        }
    }

    /// Parse a stored value; unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "preview" => Some(ActiveTab::Preview),
            "source" => Some(ActiveTab::Source),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActiveTab::Preview => "Preview",
            ActiveTab::Source => "HTML",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Export Lifecycle
// ─────────────────────────────────────────────────────────────────────────────

/// Export lifecycle: `Idle → Exporting(format) → Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportStatus {
    #[default]
    Idle,
    Exporting(ExportFormat),
}

// ─────────────────────────────────────────────────────────────────────────────
// UI State
// ─────────────────────────────────────────────────────────────────────────────

/// UI-related state flags.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Whether the reset confirmation is open
    pub show_reset_confirm: bool,
    /// Whether the settings window is open
    pub show_settings: bool,
    /// Dismissible error banner
    pub error_message: Option<String>,
    /// Temporary toast message (shown in center of status bar)
    pub toast_message: Option<String>,
    /// When the toast message should expire (as seconds since app start)
    pub toast_expires_at: Option<f64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Application State
// ─────────────────────────────────────────────────────────────────────────────

/// Central application state struct.
///
/// # Example
///
/// ```ignore
/// let mut state = AppState::new();
/// state.set_markdown("# Hello".to_string());
/// let request = state.begin_export(ExportFormat::Pdf)?;
/// ```
#[derive(Debug)]
pub struct AppState {
    markdown: String,
    /// Rendered HTML, kept in sync with `markdown`
    html: String,
    active_tab: ActiveTab,
    export_status: ExportStatus,
    /// User settings (loaded from config)
    pub settings: Settings,
    /// UI-related state
    pub ui: UiState,
    settings_dirty: bool,
    store: LocalStore,
}

impl AppState {
    /// Create the state from the config file and the local store.
    pub fn new() -> Self {
        let settings = load_config();
        info!("AppState initialized with settings");
        Self::with_store(settings, LocalStore::open_default())
    }

    /// Create the state from explicit settings and store.
    ///
    /// The last session's markdown and view are restored from the store; a
    /// missing or empty draft is replaced by the sample document.
    pub fn with_store(settings: Settings, store: LocalStore) -> Self {
        let markdown = store
            .get(MARKDOWN_CONTENT_KEY)
            .filter(|content| !content.is_empty())
            .unwrap_or(SAMPLE_MARKDOWN)
            .to_string();
        let active_tab = store
            .get(ACTIVE_TAB_KEY)
            .and_then(ActiveTab::parse)
            .unwrap_or_default();
        debug!("Restored view: {:?}", active_tab);

        let html = render_markdown(&markdown, settings.export.allow_raw_html);
        Self {
            markdown,
            html,
            active_tab,
            export_status: ExportStatus::Idle,
            settings,
            ui: UiState::default(),
            settings_dirty: false,
            store,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Document
    // ─────────────────────────────────────────────────────────────────────────

    pub fn markdown(&self) -> &str {
        &self.markdown
    }

    /// The rendered HTML of the current markdown.
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Replace the markdown, re-render it and save the draft.
    pub fn set_markdown(&mut self, markdown: String) {
        if markdown == self.markdown {
            return;
        }
        self.markdown = markdown;
        self.rerender();
        self.store.set(MARKDOWN_CONTENT_KEY, &self.markdown);
    }

    /// Replace the document with the sample.
    pub fn reset_markdown(&mut self) {
        info!("Resetting document to the sample");
        self.set_markdown(SAMPLE_MARKDOWN.to_string());
        self.ui.show_reset_confirm = false;
    }

    /// Re-render the HTML, e.g. after rendering settings changed.
    pub fn rerender(&mut self) {
        self.html = render_markdown(&self.markdown, self.settings.export.allow_raw_html);
    }

    pub fn active_tab(&self) -> ActiveTab {
        self.active_tab
    }

    /// Switch the right-hand view and remember it.
    pub fn set_active_tab(&mut self, tab: ActiveTab) {
        if tab == self.active_tab {
            return;
        }
        self.active_tab = tab;
        self.store.set(ACTIVE_TAB_KEY, tab.as_str());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Export Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    pub fn export_status(&self) -> ExportStatus {
        self.export_status
    }

    pub fn is_exporting(&self) -> bool {
        matches!(self.export_status, ExportStatus::Exporting(_))
    }

    /// Start an export of the current document.
    ///
    /// Fails with [`Error::ExportInProgress`] while another export runs.
    /// Clears any previous error banner.
    pub fn begin_export(&mut self, format: ExportFormat) -> Result<ExportRequest> {
        if let ExportStatus::Exporting(current) = self.export_status {
            warn!(
                "Ignoring {} export, {} export still running",
                format.label(),
                current.label()
            );
            return Err(Error::ExportInProgress(current));
        }

        self.export_status = ExportStatus::Exporting(format);
        self.ui.error_message = None;
        Ok(ExportRequest::for_document(
            format,
            &self.markdown,
            &self.html,
            &self.settings.export.filename,
        ))
    }

    /// Finish the running export and report its result.
    ///
    /// Returns the saved path when the artifact was written by the exporter
    /// itself (not for the print fallback, which is already open).
    pub fn finish_export(
        &mut self,
        format: ExportFormat,
        result: Result<ExportOutcome>,
        current_time: f64,
    ) -> Option<PathBuf> {
        self.export_status = ExportStatus::Idle;

        match result {
            Ok(ExportOutcome::Saved(path)) => {
                self.show_toast(
                    format!("Exported as {}", format.label()),
                    current_time,
                    TOAST_DURATION,
                );
                Some(path)
            }
            Ok(ExportOutcome::PrintFallback { primary_error, .. }) => {
                debug!("Print fallback used after: {}", primary_error);
                self.show_toast(
                    "Using alternative PDF method: print the opened page to save it as PDF",
                    current_time,
                    TOAST_DURATION * 2.0,
                );
                None
            }
            Err(e) => {
                self.ui.error_message =
                    Some(format!("Export to {} failed. {}", format.label(), e));
                self.show_toast("Export failed", current_time, TOAST_DURATION);
                None
            }
        }
    }

    pub fn dismiss_error(&mut self) {
        self.ui.error_message = None;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Settings Management
    // ─────────────────────────────────────────────────────────────────────────

    /// Update settings and mark as dirty.
    pub fn update_settings<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        let allow_raw_html = self.settings.export.allow_raw_html;
        f(&mut self.settings);
        self.settings.sanitize();
        if self.settings.export.allow_raw_html != allow_raw_html {
            self.rerender();
        }
        self.settings_dirty = true;
    }

    /// Mark settings as modified without changing them.
    pub fn mark_settings_dirty(&mut self) {
        self.settings_dirty = true;
    }

    pub fn settings_dirty(&self) -> bool {
        self.settings_dirty
    }

    /// Save settings to config file if modified.
    ///
    /// Returns `true` if settings were saved.
    pub fn save_settings_if_dirty(&mut self) -> bool {
        if self.settings_dirty {
            if save_config_silent(&self.settings) {
                self.settings_dirty = false;
                info!("Settings saved");
                return true;
            }
            warn!("Failed to save settings");
        }
        false
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Toasts
    // ─────────────────────────────────────────────────────────────────────────

    /// Show a temporary toast message.
    pub fn show_toast(&mut self, message: impl Into<String>, current_time: f64, duration: f64) {
        self.ui.toast_message = Some(message.into());
        self.ui.toast_expires_at = Some(current_time + duration);
    }

    /// Update toast state - clears expired toasts.
    ///
    /// Call this each frame with the current time.
    pub fn update_toast(&mut self, current_time: f64) {
        if let Some(expires_at) = self.ui.toast_expires_at {
            if current_time >= expires_at {
                self.clear_toast();
            }
        }
    }

    /// Clear any active toast message.
    pub fn clear_toast(&mut self) {
        self.ui.toast_message = None;
        self.ui.toast_expires_at = None;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn state() -> AppState {
        AppState::with_store(Settings::default(), LocalStore::in_memory())
    }

    #[test]
    fn test_new_state_uses_sample() {
        let state = state();
        assert_eq!(state.markdown(), SAMPLE_MARKDOWN);
        assert!(state.html().contains("<h1>Hello, Markdown!</h1>"));
        assert_eq!(state.active_tab(), ActiveTab::Preview);
        assert_eq!(state.export_status(), ExportStatus::Idle);
    }

    #[test]
    fn test_session_restored_from_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        {
            let mut state = AppState::with_store(Settings::default(), LocalStore::open(path.clone()));
            state.set_markdown("# Draft".to_string());
            state.set_active_tab(ActiveTab::Source);
        }

        let restored = AppState::with_store(Settings::default(), LocalStore::open(path));
        assert_eq!(restored.markdown(), "# Draft");
        assert_eq!(restored.active_tab(), ActiveTab::Source);
    }

    #[test]
    fn test_unknown_stored_tab_falls_back_to_preview() {
        let mut store = LocalStore::in_memory();
        store.set(ACTIVE_TAB_KEY, "sideways");
        let state = AppState::with_store(Settings::default(), store);
        assert_eq!(state.active_tab(), ActiveTab::Preview);
    }

    #[test]
    fn test_set_markdown_rerenders() {
        let mut state = state();
        state.set_markdown("*hi*".to_string());
        assert!(state.html().contains("<em>hi</em>"));
    }

    #[test]
    fn test_reset_restores_sample_and_closes_confirm() {
        let mut state = state();
        state.set_markdown("something else".to_string());
        state.ui.show_reset_confirm = true;

        state.reset_markdown();

        assert_eq!(state.markdown(), SAMPLE_MARKDOWN);
        assert!(!state.ui.show_reset_confirm);
    }

    #[test]
    fn test_second_export_rejected_while_running() {
        let mut state = state();
        state.begin_export(ExportFormat::Pdf).unwrap();

        let err = state.begin_export(ExportFormat::Html).unwrap_err();
        assert!(matches!(err, Error::ExportInProgress(ExportFormat::Pdf)));
        assert_eq!(
            state.export_status(),
            ExportStatus::Exporting(ExportFormat::Pdf)
        );
    }

    #[test]
    fn test_export_allowed_again_after_finish() {
        let mut state = state();
        state.begin_export(ExportFormat::Txt).unwrap();
        state.finish_export(
            ExportFormat::Txt,
            Ok(ExportOutcome::Saved(PathBuf::from("doc.txt"))),
            0.0,
        );

        assert!(!state.is_exporting());
        assert!(state.begin_export(ExportFormat::Docx).is_ok());
    }

    #[test]
    fn test_begin_export_builds_request() {
        let mut state = state();
        state.set_markdown("# T".to_string());
        state.update_settings(|s| s.export.filename = "my/notes".to_string());

        let txt = state.begin_export(ExportFormat::Txt).unwrap();
        assert_eq!(txt.content, "# T");
        assert_eq!(txt.filename, "my_notes");
    }

    #[test]
    fn test_success_shows_toast() {
        let mut state = state();
        state.begin_export(ExportFormat::Html).unwrap();
        let saved = state.finish_export(
            ExportFormat::Html,
            Ok(ExportOutcome::Saved(PathBuf::from("doc.html"))),
            10.0,
        );

        assert_eq!(saved, Some(PathBuf::from("doc.html")));
        assert_eq!(state.ui.toast_message.as_deref(), Some("Exported as HTML"));
        assert!(state.ui.error_message.is_none());
    }

    #[test]
    fn test_fallback_shows_alternative_method_toast() {
        let mut state = state();
        state.begin_export(ExportFormat::Pdf).unwrap();
        let saved = state.finish_export(
            ExportFormat::Pdf,
            Ok(ExportOutcome::PrintFallback {
                path: PathBuf::from("doc-print.html"),
                primary_error: Error::Rasterize("x".to_string()),
            }),
            0.0,
        );

        assert!(saved.is_none());
        assert!(state
            .ui
            .toast_message
            .as_deref()
            .unwrap()
            .starts_with("Using alternative PDF method"));
    }

    #[test]
    fn test_failure_sets_error_banner() {
        let mut state = state();
        state.begin_export(ExportFormat::Docx).unwrap();
        state.finish_export(
            ExportFormat::Docx,
            Err(Error::Docx("zip failed".to_string())),
            0.0,
        );

        assert_eq!(
            state.ui.error_message.as_deref(),
            Some("Export to DOCX failed. Failed to build DOCX: zip failed")
        );
        assert!(!state.is_exporting());

        state.dismiss_error();
        assert!(state.ui.error_message.is_none());
    }

    #[test]
    fn test_begin_export_clears_previous_error() {
        let mut state = state();
        state.ui.error_message = Some("old".to_string());
        state.begin_export(ExportFormat::Html).unwrap();
        assert!(state.ui.error_message.is_none());
    }

    #[test]
    fn test_toggling_raw_html_rerenders() {
        let mut state = state();
        state.set_markdown("<span>raw</span>".to_string());
        assert!(!state.html().contains("<span>"));

        state.update_settings(|s| s.export.allow_raw_html = true);
        assert!(state.html().contains("<span>raw</span>"));
        assert!(state.settings_dirty());
    }

    #[test]
    fn test_toast_expires() {
        let mut state = state();
        state.show_toast("hello", 1.0, 2.0);
        state.update_toast(2.5);
        assert!(state.ui.toast_message.is_some());
        state.update_toast(3.0);
        assert!(state.ui.toast_message.is_none());
    }
}
