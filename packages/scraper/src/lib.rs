#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! HTTP fetching layer for listing scrapers.
//!
//! Provides the [`Fetcher`] trait, a `reqwest`-backed [`HttpFetcher`] with
//! timeouts, redirect following, a browser user agent and bounded retry
//! ([`retry`]), plus an in-memory [`memory::StaticFetcher`] for exercising
//! scrape logic without the network.
//!
//! Every failure other than a 404 collapses into
//! [`FetchError::Unavailable`]; callers are expected to treat those
//! uniformly.

pub mod memory;
pub mod retry;

use std::time::Duration;

use serde::Deserialize;

use crate::retry::RetryPolicy;

/// Default desktop browser user agent. Some sites reject empty or library
/// default agents.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Errors that can occur while fetching a page.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The server answered 404.
    #[error("Not found: {url}")]
    NotFound {
        /// The requested URL.
        url: String,
    },

    /// Any other failure: non-2xx status, timeout, transport error or an
    /// empty body.
    #[error("Unavailable: {url}: {reason}")]
    Unavailable {
        /// The requested URL.
        url: String,
        /// What went wrong.
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl FetchError {
    /// Returns `true` for a 404 response.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Network settings for [`HttpFetcher`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// User agent sent with every request.
    pub user_agent: String,
    /// TCP/TLS connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Whole-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Maximum redirects followed per request.
    pub max_redirects: usize,
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
    /// Backoff before the first retry; doubles on each further retry.
    pub retry_backoff_ms: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout_ms: 3_000,
            request_timeout_ms: 20_000,
            max_redirects: 10,
            max_retries: 1,
            retry_backoff_ms: 500,
        }
    }
}

impl FetcherConfig {
    /// The retry policy described by this configuration.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_backoff_ms))
    }
}

/// Something that can GET a page body and probe a URL's status.
///
/// Implementations must be `Send + Sync` so one fetcher can be shared
/// between concurrent scrape runs.
pub trait Fetcher: Send + Sync {
    /// Fetches `url` and returns the response body.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::NotFound`] on 404 and
    /// [`FetchError::Unavailable`] for every other failure.
    fn get_text(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = Result<String, FetchError>> + Send;

    /// Issues a `HEAD` request and returns the status code.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Unavailable`] if no response was received.
    fn head_status(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = Result<u16, FetchError>> + Send;
}

/// [`Fetcher`] backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpFetcher {
    /// Builds a fetcher from the given settings.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the TLS backend cannot be
    /// initialised.
    pub fn new(config: &FetcherConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            retry: config.retry_policy(),
        })
    }
}

impl Fetcher for HttpFetcher {
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        log::debug!("GET {url}");

        let response = retry::send_with_retry(|| self.client.get(url), &self.retry, url).await?;

        let body = response.text().await.map_err(|e| FetchError::Unavailable {
            url: url.to_string(),
            reason: format!("body read failed: {e}"),
        })?;

        if body.trim().is_empty() {
            return Err(FetchError::Unavailable {
                url: url.to_string(),
                reason: "empty body".to_string(),
            });
        }

        Ok(body)
    }

    async fn head_status(&self, url: &str) -> Result<u16, FetchError> {
        log::debug!("HEAD {url}");

        self.client
            .head(url)
            .send()
            .await
            .map(|response| response.status().as_u16())
            .map_err(|e| FetchError::Unavailable {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }
}
