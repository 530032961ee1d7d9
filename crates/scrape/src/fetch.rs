//! HTTP access to vendor pages.
//!
//! Every request goes through a [`Fetcher`]. Proxy, timeout and user agent
//! are not fetcher state: they travel with each call in an immutable
//! [`FetchOptions`], so a site that must bypass the proxy simply receives a
//! modified copy.

use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_USER_AGENT: &str = concat!("pkgsnap/", env!("CARGO_PKG_VERSION"));

/// Per-request settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Proxy URI for every scheme, or `None` to connect directly.
    pub proxy: Option<String>,
    pub timeout: Duration,
    pub user_agent: String,
}
impl FetchOptions {
    /// A copy of these options with the proxy removed.
    pub fn direct(&self) -> Self {
        Self {
            proxy: None,
            ..self.clone()
        }
    }
}
impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            proxy: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Status and body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}
impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform a GET request.
    ///
    /// Transport failures and timeouts are [`Network`](ErrorKind::Network)
    /// errors. A non-success status is *not* an error at this level.
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<Response>;
}

pub type FetcherHandle = Arc<dyn Fetcher>;

/// Fetch `url` and return its body, treating any non-success status as a
/// [`Status`](ErrorKind::Status) error.
pub async fn fetch_text(fetcher: &dyn Fetcher, url: &str, options: &FetchOptions) -> Result<String> {
    let response = fetcher.fetch(url, options).await?;
    if !response.is_success() {
        exn::bail!(ErrorKind::Status {
            url: url.to_string(),
            status: response.status,
        });
    }
    Ok(response.body)
}

/// [`Fetcher`] backed by `reqwest`.
///
/// A client is built per request because proxy settings may differ between
/// calls; runs make a handful of requests, so there is nothing to pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFetcher;
impl HttpFetcher {
    pub fn new() -> Self {
        Self
    }

    fn client(options: &FetchOptions) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder().timeout(options.timeout).user_agent(&options.user_agent);
        builder = match &options.proxy {
            Some(uri) => builder.proxy(reqwest::Proxy::all(uri).or_raise(|| ErrorKind::InvalidUrl(uri.clone()))?),
            // Ignore HTTP(S)_PROXY from the environment as well.
            None => builder.no_proxy(),
        };
        builder.build().or_raise(|| ErrorKind::Network("client construction".to_string()))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    #[instrument(skip(self, options), fields(proxy = options.proxy.is_some()))]
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<Response> {
        let client = Self::client(options)?;
        let response = client.get(url).send().await.or_raise(|| ErrorKind::Network(url.to_string()))?;
        let status = response.status().as_u16();
        let body = response.text().await.or_raise(|| ErrorKind::Network(url.to_string()))?;
        tracing::debug!(status, bytes = body.len(), "Fetched");
        Ok(Response { status, body })
    }
}

#[cfg(any(test, feature = "mock"))]
pub use self::mock::{FetchCall, MockFetcher};

#[cfg(any(test, feature = "mock"))]
mod mock {
    use super::{FetchOptions, Fetcher, Response};
    use crate::error::{ErrorKind, Result};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    /// A request received by [`MockFetcher`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct FetchCall {
        pub url: String,
        pub proxy: Option<String>,
    }

    /// Offline [`Fetcher`] serving canned responses.
    ///
    /// URLs without a canned response fail with a
    /// [`Network`](ErrorKind::Network) error, like an unreachable host.
    #[derive(Debug, Default)]
    pub struct MockFetcher {
        responses: HashMap<String, Response>,
        calls: Mutex<Vec<FetchCall>>,
    }
    impl MockFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        /// Serve `body` with status 200 for `url`.
        pub fn with_page(self, url: impl Into<String>, body: impl Into<String>) -> Self {
            self.with_response(url, 200, body)
        }

        pub fn with_response(mut self, url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
            self.responses.insert(url.into(), Response {
                status,
                body: body.into(),
            });
            self
        }

        /// Every request received so far, in order.
        pub async fn calls(&self) -> Vec<FetchCall> {
            self.calls.lock().await.clone()
        }
    }

    #[async_trait]
    impl Fetcher for MockFetcher {
        async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<Response> {
            self.calls.lock().await.push(FetchCall {
                url: url.to_string(),
                proxy: options.proxy.clone(),
            });
            match self.responses.get(url) {
                Some(response) => Ok(response.clone()),
                None => exn::bail!(ErrorKind::Network(url.to_string())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_direct_drops_proxy_only() {
        let options = FetchOptions {
            proxy: Some("http://127.0.0.1:2023".to_string()),
            timeout: Duration::from_secs(5),
            user_agent: "test".to_string(),
        };
        let direct = options.direct();
        assert_eq!(direct.proxy, None);
        assert_eq!(direct.timeout, Duration::from_secs(5));
        assert_eq!(direct.user_agent, "test");
        assert!(options.proxy.is_some());
    }

    #[test]
    fn test_default_options() {
        let options = FetchOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(30));
        assert!(options.user_agent.starts_with("pkgsnap/"));
        assert!(options.proxy.is_none());
    }

    #[rstest]
    #[case(200, true)]
    #[case(204, true)]
    #[case(301, false)]
    #[case(404, false)]
    #[case(503, false)]
    fn test_is_success(#[case] status: u16, #[case] expected: bool) {
        let response = Response {
            status,
            body: String::new(),
        };
        assert_eq!(response.is_success(), expected);
    }

    #[tokio::test]
    async fn test_fetch_text_rejects_error_status() {
        let fetcher = MockFetcher::new().with_response("https://example.com/", 503, "busy");
        let err = fetch_text(&fetcher, "https://example.com/", &FetchOptions::default()).await.unwrap_err();
        assert_eq!(&*err, &ErrorKind::Status {
            url: "https://example.com/".to_string(),
            status: 503
        });
    }

    #[tokio::test]
    async fn test_mock_records_proxy() {
        let fetcher = MockFetcher::new();
        let options = FetchOptions {
            proxy: Some("http://proxy:8080".to_string()),
            ..FetchOptions::default()
        };
        let err = fetcher.fetch("https://unreachable.example/", &options).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Network(_)));
        assert_eq!(fetcher.calls().await, vec![FetchCall {
            url: "https://unreachable.example/".to_string(),
            proxy: Some("http://proxy:8080".to_string()),
        }]);
    }

    #[test]
    fn test_http_client_rejects_bad_proxy() {
        let options = FetchOptions {
            proxy: Some("http://[::1".to_string()),
            ..FetchOptions::default()
        };
        let err = HttpFetcher::client(&options).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidUrl(_)));
    }
}
