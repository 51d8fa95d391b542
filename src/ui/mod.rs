//! UI components for Markport
//!
//! This module contains the panels and dialogs drawn by the application.

mod dialogs;
mod preview;
mod settings;

pub use dialogs::{show_error_banner, show_reset_confirm, ConfirmResult};
pub use preview::{heading_size, show_source, PreviewPane};
pub use settings::{SettingsPanel, SettingsPanelOutput, SettingsSection};
