//! Local key-value store for the last session
//!
//! Holds the last edited markdown and the last selected view so they survive
//! restarts. Every failure here is logged and swallowed: losing the draft is
//! an inconvenience, never a reason to interrupt the user.

use super::persistence::{get_config_dir, write_json_atomic};
use crate::error::{Error, Result};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Key holding the last edited markdown source.
pub const MARKDOWN_CONTENT_KEY: &str = "markdown-content";

/// Key holding the last selected view (`preview` or `source`).
pub const ACTIVE_TAB_KEY: &str = "active-tab";

/// Store file name inside the config directory
const STORE_FILE_NAME: &str = "storage.json";

/// String → string store persisted as a JSON object.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl LocalStore {
    /// Open the store in the platform config directory.
    ///
    /// When the directory cannot be determined the store lives in memory only.
    pub fn open_default() -> Self {
        match get_config_dir() {
            Ok(dir) => Self::open(dir.join(STORE_FILE_NAME)),
            Err(e) => {
                warn!("Local storage unavailable: {}", e);
                Self::in_memory()
            }
        }
    }

    /// Open the store backed by `path`; unreadable content starts empty.
    pub fn open(path: PathBuf) -> Self {
        let entries = match read_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read local storage at {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };
        Self {
            path: Some(path),
            entries,
        }
    }

    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Set `key` and persist the store.
    ///
    /// Returns `false` if the write failed; the in-memory value is updated
    /// either way.
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        if self.get(key) == Some(value) {
            return true;
        }
        self.entries.insert(key.to_string(), value.to_string());

        let Some(path) = &self.path else {
            return true;
        };
        match write_json_atomic(path, &self.entries) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to save '{}' to local storage: {}", key, e);
                false
            }
        }
    }
}

fn read_entries(path: &Path) -> Result<BTreeMap<String, String>> {
    if !path.exists() {
        debug!("No local storage at {}", path.display());
        return Ok(BTreeMap::new());
    }
    let contents = fs::read_to_string(path).map_err(|e| Error::ConfigLoad {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;
    if contents.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    Ok(serde_json::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(STORE_FILE_NAME);

        let mut store = LocalStore::open(path.clone());
        assert!(store.set(MARKDOWN_CONTENT_KEY, "# Draft"));
        assert!(store.set(ACTIVE_TAB_KEY, "source"));

        let reopened = LocalStore::open(path);
        assert_eq!(reopened.get(MARKDOWN_CONTENT_KEY), Some("# Draft"));
        assert_eq!(reopened.get(ACTIVE_TAB_KEY), Some("source"));
    }

    #[test]
    fn test_set_overwrites_previous_value() {
        let dir = TempDir::new().unwrap();
        let mut store = LocalStore::open(dir.path().join(STORE_FILE_NAME));
        store.set(MARKDOWN_CONTENT_KEY, "one");
        store.set(MARKDOWN_CONTENT_KEY, "two");
        assert_eq!(store.get(MARKDOWN_CONTENT_KEY), Some("two"));
    }

    #[test]
    fn test_corrupted_store_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(STORE_FILE_NAME);
        fs::write(&path, "not json").unwrap();

        let store = LocalStore::open(path);
        assert_eq!(store.get(MARKDOWN_CONTENT_KEY), None);
    }

    #[test]
    fn test_write_failure_is_reported_not_raised() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be makes the rename fail.
        let path = dir.path().join(STORE_FILE_NAME);
        fs::create_dir_all(path.join("blocker")).unwrap();

        let mut store = LocalStore::open(path);
        assert!(!store.set(MARKDOWN_CONTENT_KEY, "text"));
        assert_eq!(store.get(MARKDOWN_CONTENT_KEY), Some("text"));
    }

    #[test]
    fn test_in_memory_store() {
        let mut store = LocalStore::in_memory();
        assert!(store.set(ACTIVE_TAB_KEY, "preview"));
        assert_eq!(store.get(ACTIVE_TAB_KEY), Some("preview"));
    }
}
