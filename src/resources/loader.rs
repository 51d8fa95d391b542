//! Load-once acquisition of external resources.

use super::registry::{Claim, ResourceRegistry};
use super::{Fetch, FetchOptions, Resource, ResourceKind};
use crate::error::{Error, Result};
use log::{debug, info, warn};
use std::sync::Arc;

/// Loads scripts, stylesheets and fonts, at most once per kind and URL.
///
/// The registry is injected so several loaders (and tests) can share or
/// isolate load state explicitly. The loader performs a single fetch per
/// attempt; retrying is decided by the [`Fetch`] it is given.
#[derive(Clone)]
pub struct ResourceLoader {
    registry: Arc<ResourceRegistry>,
    fetcher: Arc<dyn Fetch>,
}

impl ResourceLoader {
    pub fn new(registry: Arc<ResourceRegistry>, fetcher: Arc<dyn Fetch>) -> Self {
        Self { registry, fetcher }
    }

    /// The registry backing this loader.
    pub fn registry(&self) -> &Arc<ResourceRegistry> {
        &self.registry
    }

    /// Load a script; resolves immediately if `url` is already loaded.
    pub fn load_script(&self, url: &str) -> Result<Resource> {
        self.load(ResourceKind::Script, url)
    }

    /// Load a stylesheet; resolves immediately if `url` is already loaded.
    pub fn load_stylesheet(&self, url: &str) -> Result<Resource> {
        self.load(ResourceKind::Stylesheet, url)
    }

    /// Load a font file; resolves immediately if `url` is already loaded.
    pub fn load_font(&self, url: &str) -> Result<Resource> {
        self.load(ResourceKind::Font, url)
    }

    /// Load a resource of any kind.
    pub fn load(&self, kind: ResourceKind, url: &str) -> Result<Resource> {
        match self.registry.claim(kind, url) {
            Claim::Ready(resource) => {
                debug!("{} already loaded: {}", kind.label(), url);
                return Ok(resource);
            }
            Claim::Owned => {}
        }

        match self.fetch_resource(kind, url) {
            Ok(resource) => {
                info!("Loaded {}: {}", kind.label(), url);
                self.registry.complete(resource.clone());
                Ok(resource)
            }
            Err(err) => {
                warn!("Failed to load {}: {}", kind.label(), url);
                self.registry.fail(kind, url, err.to_string());
                Err(Error::ResourceLoad {
                    kind,
                    url: url.to_string(),
                    message: err.to_string(),
                })
            }
        }
    }

    fn fetch_resource(&self, kind: ResourceKind, url: &str) -> Result<Resource> {
        let response = self
            .fetcher
            .fetch(url, &FetchOptions::default())?
            .error_for_status(url)?;

        if kind.is_text() && std::str::from_utf8(&response.body).is_err() {
            return Err(Error::Application(format!(
                "{} is not valid UTF-8",
                kind.label()
            )));
        }

        Ok(Resource {
            kind,
            url: url.to_string(),
            content: Arc::from(response.body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{FetchResponse, LoadState};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingFetcher {
        calls: AtomicU32,
        fail_next: Mutex<bool>,
    }

    impl Fetch for CountingFetcher {
        fn fetch(&self, url: &str, _options: &FetchOptions) -> Result<FetchResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut fail = self.fail_next.lock().unwrap();
            if *fail {
                *fail = false;
                return Ok(FetchResponse {
                    status: 404,
                    status_text: "Not Found".to_string(),
                    body: Vec::new(),
                });
            }
            Ok(FetchResponse::ok(format!("/* {} */", url)))
        }
    }

    fn loader() -> (ResourceLoader, Arc<CountingFetcher>) {
        let fetcher = Arc::new(CountingFetcher::default());
        let loader = ResourceLoader::new(Arc::new(ResourceRegistry::new()), fetcher.clone());
        (loader, fetcher)
    }

    #[test]
    fn test_load_script_twice_fetches_once() {
        let (loader, fetcher) = loader();

        let first = loader.load_script("https://cdn/lib.js").unwrap();
        let second = loader.load_script("https://cdn/lib.js").unwrap();

        assert_eq!(first, second);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(loader.registry().loaded_count(), 1);
    }

    #[test]
    fn test_different_urls_load_separately() {
        let (loader, fetcher) = loader();
        loader.load_stylesheet("https://cdn/a.css").unwrap();
        loader.load_stylesheet("https://cdn/b.css").unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert_eq!(loader.registry().loaded_count(), 2);
    }

    #[test]
    fn test_failed_load_reports_kind_and_url() {
        let (loader, fetcher) = loader();
        *fetcher.fail_next.lock().unwrap() = true;

        let err = loader.load_stylesheet("https://cdn/missing.css").unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Failed to load stylesheet: https://cdn/missing.css"));
        assert!(matches!(
            loader
                .registry()
                .state(ResourceKind::Stylesheet, "https://cdn/missing.css"),
            Some(LoadState::Failed(_))
        ));
    }

    #[test]
    fn test_failed_load_can_be_retried_by_caller() {
        let (loader, fetcher) = loader();
        *fetcher.fail_next.lock().unwrap() = true;

        assert!(loader.load_script("https://cdn/lib.js").is_err());
        assert!(loader.load_script("https://cdn/lib.js").is_ok());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_shared_registry_is_visible_to_other_loaders() {
        let (loader, fetcher) = loader();
        loader.load_script("https://cdn/lib.js").unwrap();

        let other = ResourceLoader::new(loader.registry().clone(), fetcher.clone());
        other.load_script("https://cdn/lib.js").unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_text_resources_must_be_utf8() {
        struct BinaryFetcher;
        impl Fetch for BinaryFetcher {
            fn fetch(&self, _url: &str, _options: &FetchOptions) -> Result<FetchResponse> {
                Ok(FetchResponse::ok(vec![0xff, 0xfe, 0x00]))
            }
        }

        let loader = ResourceLoader::new(Arc::new(ResourceRegistry::new()), Arc::new(BinaryFetcher));
        assert!(loader.load_stylesheet("https://cdn/bad.css").is_err());
        assert!(loader.load_font("https://cdn/font.ttf").is_ok());
    }

    #[test]
    fn test_same_url_loaded_as_another_kind_keeps_its_kind() {
        let (loader, fetcher) = loader();

        let font = loader.load_font("https://cdn/shared").unwrap();
        let sheet = loader.load_stylesheet("https://cdn/shared").unwrap();

        assert_eq!(font.kind, ResourceKind::Font);
        assert_eq!(sheet.kind, ResourceKind::Stylesheet);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert_eq!(loader.load_stylesheet("https://cdn/shared").unwrap(), sheet);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }
}
