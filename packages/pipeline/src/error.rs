//! Errors surfaced by a scrape run.

use dissident_letterboxd::InvalidUsername;
use dissident_scraper::FetchError;

use crate::config::ConfigError;

/// Why a run did not produce an outcome.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Nothing usable was left after sanitizing the username.
    #[error(transparent)]
    InvalidUsername(#[from] InvalidUsername),

    /// The profile page answered 404.
    #[error("User '{username}' not found")]
    ProfileNotFound {
        /// Sanitized username.
        username: String,
    },

    /// A page could not be fetched after the retry budget.
    #[error("Letterboxd unavailable ({url}): {reason}")]
    Upstream {
        /// Failing URL.
        url: String,
        /// What went wrong.
        reason: String,
    },

    /// Paging finished without a single record.
    #[error("No rated movies found for user '{username}'")]
    NoRatedFilms {
        /// Sanitized username.
        username: String,
    },

    /// The run exceeded its wall-clock budget.
    #[error("Scrape did not finish within {secs}s")]
    TimedOut {
        /// The budget that was exceeded.
        secs: u64,
    },

    /// The progress consumer went away.
    #[error("Progress consumer disconnected")]
    Cancelled,

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Coarse classification of [`PipelineError`], used to pick a response
/// status or exit message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad caller input.
    Input,
    /// The site could not be reached or refused the request.
    UpstreamUnavailable,
    /// The user exists but has nothing to analyze.
    EmptyResult,
    /// The wall-clock budget ran out.
    Budget,
    /// The consumer disconnected.
    Cancelled,
    /// Local configuration problem.
    Config,
}

impl PipelineError {
    /// The error's category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUsername(_) => ErrorKind::Input,
            Self::ProfileNotFound { .. } | Self::Upstream { .. } => ErrorKind::UpstreamUnavailable,
            Self::NoRatedFilms { .. } => ErrorKind::EmptyResult,
            Self::TimedOut { .. } => ErrorKind::Budget,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Config(_) => ErrorKind::Config,
        }
    }
}

impl From<FetchError> for PipelineError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NotFound { url } => Self::Upstream {
                url,
                reason: "not found".to_string(),
            },
            FetchError::Unavailable { url, reason } => Self::Upstream { url, reason },
            FetchError::Client(e) => Self::Upstream {
                url: e.url().map(ToString::to_string).unwrap_or_default(),
                reason: e.to_string(),
            },
        }
    }
}
