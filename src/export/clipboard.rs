//! Copying the generated HTML source to the system clipboard (arboard)

use arboard::Clipboard;
use log::debug;
use std::fmt;

/// Why the HTML source could not be copied.
#[derive(Debug)]
pub enum ClipboardError {
    /// No clipboard could be opened (headless session, missing display)
    Unavailable(String),
    /// The clipboard refused the content
    Rejected(String),
}

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipboardError::Unavailable(msg) => write!(f, "Clipboard unavailable: {}", msg),
            ClipboardError::Rejected(msg) => write!(f, "Clipboard rejected content: {}", msg),
        }
    }
}

impl std::error::Error for ClipboardError {}

/// Long-lived clipboard handle.
///
/// On X11 the copied text is served by the process owning the handle, so
/// the handle is opened on first copy and kept for the life of the app.
#[derive(Default)]
pub struct SourceClipboard {
    handle: Option<Clipboard>,
}

impl SourceClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy `source` as plain text, so pasting anywhere yields the markup.
    pub fn copy(&mut self, source: &str) -> Result<(), ClipboardError> {
        let opened = match self.handle.take() {
            Some(clipboard) => clipboard,
            None => {
                debug!("Opening system clipboard");
                Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?
            }
        };
        let clipboard = self.handle.insert(opened);

        clipboard
            .set_text(source)
            .map_err(|e| ClipboardError::Rejected(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ClipboardError::Unavailable("no display".to_string());
        assert_eq!(err.to_string(), "Clipboard unavailable: no display");

        let err = ClipboardError::Rejected("busy".to_string());
        assert_eq!(err.to_string(), "Clipboard rejected content: busy");
    }

    #[test]
    fn test_handle_opened_lazily() {
        let clipboard = SourceClipboard::new();
        assert!(clipboard.handle.is_none());
    }
}
