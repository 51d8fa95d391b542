//! Process-wide record of which resources have been loaded.

use super::{Resource, ResourceKind};
use log::debug;
use std::collections::HashMap;
use std::sync::{Condvar, Mutex, MutexGuard};

/// Load state of a single resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// A loader is fetching the URL right now
    Pending,
    /// The URL was fetched successfully
    Loaded(Resource),
    /// The last attempt failed with this message
    Failed(String),
}

/// Outcome of asking the registry for a resource.
pub(super) enum Claim {
    /// Already loaded; use this resource
    Ready(Resource),
    /// The caller now owns the load and must `complete` or `fail` it
    Owned,
}

type Key = (ResourceKind, String);

/// (kind, URL) → load state map.
///
/// The same URL requested as two kinds is two entries, so a font never
/// satisfies a stylesheet request. The registry is shared between loaders
/// via `Arc`. Waiting on a pending entry blocks until the owning loader
/// records its result.
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    entries: Mutex<HashMap<Key, LoadState>>,
    changed: Condvar,
}

impl ResourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Key, LoadState>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current state of `url` loaded as `kind`, if it was ever requested.
    pub fn state(&self, kind: ResourceKind, url: &str) -> Option<LoadState> {
        self.lock().get(&(kind, url.to_string())).cloned()
    }

    /// Number of entries in the `Loaded` state.
    pub fn loaded_count(&self) -> usize {
        self.lock()
            .values()
            .filter(|state| matches!(state, LoadState::Loaded(_)))
            .count()
    }

    /// All loaded resources, in no particular order.
    pub fn loaded(&self) -> Vec<Resource> {
        self.lock()
            .values()
            .filter_map(|state| match state {
                LoadState::Loaded(resource) => Some(resource.clone()),
                _ => None,
            })
            .collect()
    }

    /// Resolve `url` as `kind` from the registry or take ownership of loading it.
    ///
    /// A failed entry is handed out again so a later call can retry it.
    pub(super) fn claim(&self, kind: ResourceKind, url: &str) -> Claim {
        let key = (kind, url.to_string());
        let mut entries = self.lock();
        loop {
            match entries.get(&key) {
                Some(LoadState::Loaded(resource)) => return Claim::Ready(resource.clone()),
                Some(LoadState::Pending) => {
                    debug!("Waiting for pending load of {}", url);
                    entries = self
                        .changed
                        .wait(entries)
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                }
                Some(LoadState::Failed(_)) | None => {
                    entries.insert(key, LoadState::Pending);
                    return Claim::Owned;
                }
            }
        }
    }

    pub(super) fn complete(&self, resource: Resource) {
        self.lock().insert(
            (resource.kind, resource.url.clone()),
            LoadState::Loaded(resource),
        );
        self.changed.notify_all();
    }

    pub(super) fn fail(&self, kind: ResourceKind, url: &str, message: String) {
        self.lock()
            .insert((kind, url.to_string()), LoadState::Failed(message));
        self.changed.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn resource(url: &str) -> Resource {
        Resource {
            kind: ResourceKind::Stylesheet,
            url: url.to_string(),
            content: Arc::from(&b"body{}"[..]),
        }
    }

    #[test]
    fn test_first_claim_owns_the_load() {
        let registry = ResourceRegistry::new();
        assert!(matches!(registry.claim(ResourceKind::Stylesheet, "a.css"), Claim::Owned));
        assert_eq!(registry.state(ResourceKind::Stylesheet, "a.css"), Some(LoadState::Pending));
    }

    #[test]
    fn test_loaded_url_resolves_immediately() {
        let registry = ResourceRegistry::new();
        let _ = registry.claim(ResourceKind::Stylesheet, "a.css");
        registry.complete(resource("a.css"));

        match registry.claim(ResourceKind::Stylesheet, "a.css") {
            Claim::Ready(res) => assert_eq!(res.url, "a.css"),
            Claim::Owned => panic!("expected cached resource"),
        }
        assert_eq!(registry.loaded_count(), 1);
    }

    #[test]
    fn test_failed_url_can_be_claimed_again() {
        let registry = ResourceRegistry::new();
        let _ = registry.claim(ResourceKind::Stylesheet, "a.css");
        registry.fail(ResourceKind::Stylesheet, "a.css", "boom".to_string());
        assert_eq!(
            registry.state(ResourceKind::Stylesheet, "a.css"),
            Some(LoadState::Failed("boom".to_string()))
        );
        assert!(matches!(registry.claim(ResourceKind::Stylesheet, "a.css"), Claim::Owned));
    }

    #[test]
    fn test_pending_claim_waits_for_completion() {
        let registry = Arc::new(ResourceRegistry::new());
        let _ = registry.claim(ResourceKind::Stylesheet, "a.css");

        let waiter = {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || match registry.claim(ResourceKind::Stylesheet, "a.css") {
                Claim::Ready(res) => res.url,
                Claim::Owned => String::from("owned"),
            })
        };

        std::thread::sleep(std::time::Duration::from_millis(20));
        registry.complete(resource("a.css"));
        assert_eq!(waiter.join().unwrap(), "a.css");
    }

    #[test]
    fn test_same_url_as_other_kind_is_a_separate_entry() {
        let registry = ResourceRegistry::new();
        let _ = registry.claim(ResourceKind::Stylesheet, "a.css");
        registry.complete(resource("a.css"));

        assert!(matches!(
            registry.claim(ResourceKind::Font, "a.css"),
            Claim::Owned
        ));
        assert_eq!(registry.state(ResourceKind::Font, "a.css"), Some(LoadState::Pending));
        assert!(matches!(
            registry.state(ResourceKind::Stylesheet, "a.css"),
            Some(LoadState::Loaded(_))
        ));
    }
}
