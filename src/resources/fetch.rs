//! Network fetching with retry and backoff.

use crate::error::{Error, Result};
use log::{debug, error, warn};
use std::sync::Arc;
use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Request / Response
// ─────────────────────────────────────────────────────────────────────────────

/// Per-request options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Extra request headers
    pub headers: Vec<(String, String)>,
    /// Overrides the transport's default timeout
    pub timeout: Option<Duration>,
}

/// A completed response, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub status_text: String,
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// A `200 OK` response with the given body.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            status_text: "OK".to_string(),
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Convert a non-2xx response into an error.
    pub fn error_for_status(self, url: &str) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::HttpStatus {
                url: url.to_string(),
                status: self.status,
                status_text: self.status_text,
            })
        }
    }
}

/// A transport able to perform one request.
///
/// Implementations report transport failures as errors and return every
/// completed response, including non-2xx ones.
pub trait Fetch: Send + Sync {
    fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchResponse>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Retry Policy
// ─────────────────────────────────────────────────────────────────────────────

/// Linear backoff that grows as retries run out.
///
/// After a failed attempt with `remaining` retries left the wait is
/// `(4 - remaining) * step`, floored at zero. With three retries that is one,
/// two, then three steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub step: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            step: Duration::from_millis(1000),
        }
    }
}

impl Backoff {
    /// Delay after failed attempt number `attempt` (1-based) out of a budget
    /// of `retries` retries.
    pub fn delay_after(&self, attempt: u32, retries: u32) -> Duration {
        let remaining = (retries + 1).saturating_sub(attempt);
        self.step * 4u32.saturating_sub(remaining)
    }
}

/// Fetch `url`, retrying failures up to `retries` times.
///
/// Any non-2xx status counts as a failure. The total number of attempts is
/// `retries + 1`. When every attempt fails the last cause is wrapped in
/// [`Error::FetchFailed`].
pub fn enhanced_fetch(
    fetcher: &dyn Fetch,
    url: &str,
    options: &FetchOptions,
    retries: u32,
    backoff: Backoff,
) -> Result<FetchResponse> {
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let outcome = fetcher
            .fetch(url, options)
            .and_then(|response| response.error_for_status(url));

        match outcome {
            Ok(response) => {
                debug!("Fetched {} on attempt {}", url, attempt);
                return Ok(response);
            }
            Err(err) if attempt <= retries => {
                let remaining = retries - attempt + 1;
                warn!(
                    "Fetch of {} failed ({}), retrying... ({} attempts left)",
                    url, err, remaining
                );
                let delay = backoff.delay_after(attempt, retries);
                if !delay.is_zero() {
                    std::thread::sleep(delay);
                }
            }
            Err(err) => {
                error!("Fetch of {} failed after {} attempts: {}", url, attempt, err);
                return Err(Error::FetchFailed {
                    url: url.to_string(),
                    attempts: attempt,
                    source: Box::new(err),
                });
            }
        }
    }
}

/// A [`Fetch`] that applies [`enhanced_fetch`] around another transport.
pub struct RetryingFetcher {
    inner: Arc<dyn Fetch>,
    retries: u32,
    backoff: Backoff,
}

impl RetryingFetcher {
    pub fn new(inner: Arc<dyn Fetch>, retries: u32, backoff: Backoff) -> Self {
        Self {
            inner,
            retries,
            backoff,
        }
    }
}

impl Fetch for RetryingFetcher {
    fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchResponse> {
        enhanced_fetch(self.inner.as_ref(), url, options, self.retries, self.backoff)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP Transport
// ─────────────────────────────────────────────────────────────────────────────

/// Blocking HTTP(S) transport; `file://` URLs are read from disk.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    /// Build a transport with a default per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("markport/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Application(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    fn fetch_file(url: &str, path: &str) -> Result<FetchResponse> {
        match std::fs::read(path) {
            Ok(body) => Ok(FetchResponse::ok(body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FetchResponse {
                status: 404,
                status_text: "Not Found".to_string(),
                body: Vec::new(),
            }),
            Err(e) => Err(Error::Network {
                url: url.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchResponse> {
        if let Some(path) = url.strip_prefix("file://") {
            return Self::fetch_file(url, path);
        }

        let mut request = self.client.get(url);
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(timeout) = options.timeout {
            request = request.timeout(timeout);
        }

        let network_error = |e: reqwest::Error| Error::Network {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = request.send().map_err(network_error)?;
        let status = response.status();
        let body = response.bytes().map_err(network_error)?;

        Ok(FetchResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body: body.to_vec(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
