//! External resource acquisition
//!
//! Exports can pull in resources that live outside the document: stylesheets
//! and scripts inlined into HTML exports, and fonts for the PDF renderer.
//!
//! # Architecture
//!
//! - `registry.rs` - URL → load state map, shared by every loader
//! - `loader.rs` - load-once acquisition of scripts, stylesheets and fonts
//! - `fetch.rs` - transport trait, HTTP transport and retrying fetch

mod fetch;
mod loader;
mod registry;

pub use fetch::{
    enhanced_fetch, Backoff, Fetch, FetchOptions, FetchResponse, HttpFetcher, RetryingFetcher,
};
pub use loader::ResourceLoader;
pub use registry::{LoadState, ResourceRegistry};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The kind of an external resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Script,
    Stylesheet,
    Font,
}

impl ResourceKind {
    /// Lowercase label used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Script => "script",
            ResourceKind::Stylesheet => "stylesheet",
            ResourceKind::Font => "font",
        }
    }

    /// Whether the resource body must be UTF-8 text.
    pub fn is_text(&self) -> bool {
        matches!(self, ResourceKind::Script | ResourceKind::Stylesheet)
    }
}

/// A reference to an external resource, as stored in settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub kind: ResourceKind,
    pub url: String,
}

/// A loaded resource. Cloning is cheap; the body is shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub kind: ResourceKind,
    pub url: String,
    pub content: Arc<[u8]>,
}

impl Resource {
    /// The body as text, for scripts and stylesheets.
    pub fn text(&self) -> &str {
        std::str::from_utf8(&self.content).unwrap_or_default()
    }
}
