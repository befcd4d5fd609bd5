//! In-memory [`Fetcher`] that serves canned responses.
//!
//! Used to drive scrape pipelines in tests and offline runs. URLs that were
//! never registered answer 404, matching how a listing site responds past
//! its last page.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::{FetchError, Fetcher};

/// A canned response.
#[derive(Debug, Clone)]
enum StaticResponse {
    Body(String),
    Status(u16),
    Unavailable(String),
}

/// [`Fetcher`] serving responses from a URL map and recording every
/// request it receives.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    responses: BTreeMap<String, StaticResponse>,
    requests: Mutex<Vec<String>>,
}

impl StaticFetcher {
    /// Creates an empty fetcher. Every URL answers 404.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `body` with status 200 for `url`.
    #[must_use]
    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.responses
            .insert(url.to_string(), StaticResponse::Body(body.to_string()));
        self
    }

    /// Answers `url` with a bare status code.
    #[must_use]
    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.responses
            .insert(url.to_string(), StaticResponse::Status(status));
        self
    }

    /// Makes `url` fail as if the connection timed out.
    #[must_use]
    pub fn with_failure(mut self, url: &str, reason: &str) -> Self {
        self.responses.insert(
            url.to_string(),
            StaticResponse::Unavailable(reason.to_string()),
        );
        self
    }

    /// URLs requested so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn record(&self, url: &str) {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(url.to_string());
    }
}

impl Fetcher for StaticFetcher {
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        self.record(url);

        match self.responses.get(url) {
            Some(StaticResponse::Body(body)) => Ok(body.clone()),
            Some(StaticResponse::Status(404)) | None => Err(FetchError::NotFound {
                url: url.to_string(),
            }),
            Some(StaticResponse::Status(status)) => Err(FetchError::Unavailable {
                url: url.to_string(),
                reason: format!("HTTP {status}"),
            }),
            Some(StaticResponse::Unavailable(reason)) => Err(FetchError::Unavailable {
                url: url.to_string(),
                reason: reason.clone(),
            }),
        }
    }

    async fn head_status(&self, url: &str) -> Result<u16, FetchError> {
        self.record(url);

        match self.responses.get(url) {
            Some(StaticResponse::Body(_)) => Ok(200),
            Some(StaticResponse::Status(status)) => Ok(*status),
            None => Ok(404),
            Some(StaticResponse::Unavailable(reason)) => Err(FetchError::Unavailable {
                url: url.to_string(),
                reason: reason.clone(),
            }),
        }
    }
}
