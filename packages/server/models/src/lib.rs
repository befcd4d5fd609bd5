#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the dissident score server.
//!
//! These types are serialized to JSON for the HTTP API and the SSE stream.
//! They are kept separate from the pipeline's own result types so the wire
//! contract can evolve independently. Field names are `snake_case`, as
//! existing clients expect.

use std::collections::BTreeMap;

use dissident_film_models::{FilmEntry, SampleCategory, SimpleFilm};
use dissident_pipeline::{CountOutcome, ProgressEvent, ScrapeOutcome, UserCheck};
use serde::{Deserialize, Serialize};

/// One message on the `/scrape` event stream, tagged by `type`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Intermediate progress.
    Progress(ApiProgress),
    /// Final payload; always the last message of a successful run.
    Complete(Box<ApiScrapeComplete>),
    /// Terminal failure.
    Error(ApiError),
}

impl StreamEvent {
    /// Builds an error event.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ApiError::new(message))
    }
}

impl From<ProgressEvent> for StreamEvent {
    fn from(event: ProgressEvent) -> Self {
        Self::Progress(ApiProgress::from(event))
    }
}

impl From<ScrapeOutcome> for StreamEvent {
    fn from(outcome: ScrapeOutcome) -> Self {
        Self::Complete(Box::new(ApiScrapeComplete::from(outcome)))
    }
}

/// Progress payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiProgress {
    /// Completion percentage, 0 to 100.
    pub progress: f64,
    /// Last page fetched.
    pub page: u32,
    /// Pages planned, 0 when unknown.
    pub total_pages: u32,
    /// Status line.
    pub message: String,
}

impl From<ProgressEvent> for ApiProgress {
    fn from(event: ProgressEvent) -> Self {
        Self {
            progress: event.percent,
            page: event.page,
            total_pages: event.total_pages,
            message: event.message,
        }
    }
}

/// Final payload of a streamed scrape.
#[derive(Debug, Clone, Serialize)]
pub struct ApiScrapeComplete {
    /// Always 100.
    pub progress: f64,
    /// Sanitized username.
    pub username: String,
    /// Film count read from the profile.
    pub total_movies: u64,
    /// Records actually collected.
    pub count: usize,
    /// Pages planned.
    pub total_pages: u32,
    /// Pages that yielded records.
    pub pages_scraped: u32,
    /// Every record, in listing order.
    pub all_movies: Vec<FilmEntry>,
    /// Wall-clock time of the run.
    pub execution_time_ms: u64,
    /// Mean dissident score, for scored runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_dissident_score: Option<f64>,
    /// Requested samples, one key per category.
    #[serde(flatten)]
    pub samples: BTreeMap<SampleCategory, Vec<FilmEntry>>,
}

impl From<ScrapeOutcome> for ApiScrapeComplete {
    fn from(outcome: ScrapeOutcome) -> Self {
        Self {
            progress: 100.0,
            username: outcome.username.to_string(),
            total_movies: outcome.total_movies,
            count: outcome.count(),
            total_pages: outcome.total_pages,
            pages_scraped: outcome.pages_scraped,
            execution_time_ms: outcome.execution_time_ms(),
            mean_dissident_score: outcome.mean_dissident_score,
            all_movies: outcome.films,
            samples: outcome.samples,
        }
    }
}

/// Records in a non-streamed summary: full entries, or name/rating pairs
/// when `simple=1` was requested.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ApiMovies {
    /// Full records.
    Full(Vec<FilmEntry>),
    /// Reduced records.
    Simple(Vec<SimpleFilm>),
}

/// Non-streamed scrape result.
#[derive(Debug, Clone, Serialize)]
pub struct ApiScrapeSummary {
    /// Records collected.
    pub count: usize,
    /// Film count read from the profile.
    pub total_movies: u64,
    /// Pages planned.
    pub total_pages: u32,
    /// Pages that yielded records.
    pub pages_scraped: u32,
    /// Share of planned pages scraped.
    pub progress_percentage: f64,
    /// Wall-clock time of the run.
    pub execution_time_ms: u64,
    /// The records.
    pub movies: ApiMovies,
}

impl ApiScrapeSummary {
    /// Builds the summary, reducing records to name/rating pairs if
    /// `simple` is set.
    #[must_use]
    pub fn from_outcome(outcome: ScrapeOutcome, simple: bool) -> Self {
        let count = outcome.count();
        let progress_percentage = outcome.progress_percentage();
        let execution_time_ms = outcome.execution_time_ms();

        let movies = if simple {
            ApiMovies::Simple(
                outcome
                    .films
                    .iter()
                    .map(|entry| SimpleFilm::from(&entry.film))
                    .collect(),
            )
        } else {
            ApiMovies::Full(outcome.films)
        };

        Self {
            count,
            total_movies: outcome.total_movies,
            total_pages: outcome.total_pages,
            pages_scraped: outcome.pages_scraped,
            progress_percentage,
            execution_time_ms,
            movies,
        }
    }
}

/// Film-count lookup result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCount {
    /// Sanitized username.
    pub username: String,
    /// The count, 0 if none was found.
    pub total_movies: u64,
    /// Same as `total_movies`.
    pub count: u64,
    /// Wall-clock time of the lookup.
    pub execution_time_ms: u64,
    /// Whether a non-zero count was found.
    pub success: bool,
    /// Extractor that found the count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Failure description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiCount {
    /// A failed lookup.
    #[must_use]
    pub fn failure(username: &str, error: impl Into<String>, execution_time_ms: u64) -> Self {
        Self {
            username: username.to_string(),
            total_movies: 0,
            count: 0,
            execution_time_ms,
            success: false,
            source: None,
            error: Some(error.into()),
        }
    }
}

impl From<CountOutcome> for ApiCount {
    fn from(outcome: CountOutcome) -> Self {
        let total = outcome.total_movies();
        Self {
            username: outcome.username.to_string(),
            total_movies: total,
            count: total,
            execution_time_ms: outcome.execution_time_ms(),
            success: total > 0,
            source: outcome.found.map(|m| m.source.to_string()),
            error: (total == 0).then(|| "No rated movies found for this user".to_string()),
        }
    }
}

/// Profile existence check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiUserCheck {
    /// Whether the profile exists.
    pub exists: bool,
    /// Profile URL, when it exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Failure description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiUserCheck {
    /// A check that could not be completed.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            exists: false,
            url: None,
            error: Some(error.into()),
        }
    }
}

impl From<UserCheck> for ApiUserCheck {
    fn from(check: UserCheck) -> Self {
        Self {
            exists: check.exists,
            url: check.exists.then_some(check.url),
            error: None,
        }
    }
}

/// Error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// What went wrong.
    pub error: String,
}

impl ApiError {
    /// Wraps a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Query parameters for `/scrape` and `/scrape/summary`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScrapeQueryParams {
    /// Letterboxd username; sanitized server-side.
    pub username: Option<String>,
    /// `plain` or `dissident`.
    pub metric: Option<String>,
    /// `all`, `none`, or comma-separated sample categories.
    pub samples: Option<String>,
    /// `1` or `true` for name/rating pairs in the summary.
    pub simple: Option<String>,
}

impl ScrapeQueryParams {
    /// Whether the reduced record shape was requested.
    #[must_use]
    pub fn is_simple(&self) -> bool {
        self.simple
            .as_deref()
            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
    }
}

/// Query parameters for endpoints that only take a username.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsernameQueryParams {
    /// Letterboxd username; sanitized server-side.
    pub username: Option<String>,
}
