//! Pipeline configuration.
//!
//! [`PipelineConfig`] is an explicit value handed to each
//! [`crate::Pipeline`], so concurrent runs (and tests) never share
//! tunables. Without a file the bundled `config/default.toml` is parsed;
//! a TOML file only needs to name the fields it changes.

use std::path::{Path, PathBuf};

use dissident_film_models::{ListingOrder, SampleCategory};
use dissident_scraper::FetcherConfig;
use serde::Deserialize;
use strum::IntoEnumIterator as _;
use strum_macros::{AsRefStr, Display, EnumString};

/// Environment variable naming a TOML config file.
pub const CONFIG_ENV_VAR: &str = "DISSIDENT_CONFIG";

/// The bundled default configuration. [`PipelineConfig::load`] parses it
/// when no file is named.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

/// Errors loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The TOML did not parse into a config.
    #[error("Invalid config TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("Invalid config: {message}")]
    Invalid {
        /// What is wrong.
        message: String,
    },
}

/// Which derived metric a run computes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Metric {
    /// List films by the user's own rating; no scoring.
    #[default]
    Plain,
    /// List films by community rating and score each against its position.
    Dissident,
}

impl Metric {
    /// The listing ordering paged through for this metric.
    #[must_use]
    pub const fn listing_order(self) -> ListingOrder {
        match self {
            Self::Plain => ListingOrder::EntryRating,
            Self::Dissident => ListingOrder::CommunityRating,
        }
    }

    /// Whether films are scored after paging.
    #[must_use]
    pub const fn scores(self) -> bool {
        matches!(self, Self::Dissident)
    }

    /// Samples this metric always collects.
    #[must_use]
    pub fn implied_samples(self) -> &'static [SampleCategory] {
        match self {
            Self::Plain => &[],
            Self::Dissident => &[SampleCategory::LeastPopular],
        }
    }
}

/// Tunables for one scrape run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Posters per listing page.
    pub records_per_page: u32,
    /// Hard cap on pages fetched.
    pub max_pages: u32,
    /// Pause between sequential fetches, in milliseconds.
    pub page_delay_ms: u64,
    /// Progress percentage once the count is known.
    pub progress_baseline: f64,
    /// Progress percentage spread over the paging phase.
    pub progress_span: f64,
    /// Wall-clock budget for a run, in seconds.
    pub overall_timeout_secs: u64,
    /// Derived metric.
    pub metric: Metric,
    /// Additional samples to collect after paging.
    pub samples: Vec<SampleCategory>,
    /// Films per sample.
    pub sample_size: usize,
    /// Network settings.
    pub fetcher: FetcherConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            records_per_page: dissident_letterboxd::RECORDS_PER_PAGE,
            max_pages: 20,
            page_delay_ms: 100,
            progress_baseline: 5.0,
            progress_span: 85.0,
            overall_timeout_secs: 300,
            metric: Metric::Plain,
            samples: Vec::new(),
            sample_size: 5,
            fetcher: FetcherConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the TOML is malformed or a value is out
    /// of range.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the config from `path`, else from [`CONFIG_ENV_VAR`], else
    /// from the bundled [`DEFAULT_CONFIG_TOML`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a named file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));

        let Some(path) = path else {
            log::debug!("No config file given, using bundled defaults");
            return Self::from_toml_str(DEFAULT_CONFIG_TOML);
        };

        log::info!("Loading config from {}", path.display());
        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Checks ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: &str| {
            Err(ConfigError::Invalid {
                message: message.to_string(),
            })
        };

        if self.records_per_page == 0 {
            return invalid("records_per_page must be at least 1");
        }
        if self.max_pages == 0 {
            return invalid("max_pages must be at least 1");
        }
        if self.progress_baseline < 0.0 || self.progress_span < 0.0 {
            return invalid("progress_baseline and progress_span must be non-negative");
        }
        if self.progress_baseline + self.progress_span > 100.0 {
            return invalid("progress_baseline + progress_span must not exceed 100");
        }
        if self.overall_timeout_secs == 0 {
            return invalid("overall_timeout_secs must be at least 1");
        }
        Ok(())
    }

    /// Samples to collect: the configured ones plus those the metric
    /// implies, without duplicates, in configuration order.
    #[must_use]
    pub fn effective_samples(&self) -> Vec<SampleCategory> {
        let mut samples = self.samples.clone();
        for implied in self.metric.implied_samples() {
            if !samples.contains(implied) {
                samples.push(*implied);
            }
        }
        samples
    }

    /// Percentage at which post-processing starts.
    #[must_use]
    pub fn post_processing_start(&self) -> f64 {
        self.progress_baseline + self.progress_span
    }
}

/// Parses a sample list: `all`, `none`, or comma-separated category
/// names such as `most_popular,worst_user_rate`.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] naming the first unknown category.
pub fn parse_samples(list: &str) -> Result<Vec<SampleCategory>, ConfigError> {
    match list.trim() {
        "" | "none" => Ok(Vec::new()),
        "all" => Ok(SampleCategory::iter().collect()),
        names => names
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| {
                name.parse().map_err(|_| ConfigError::Invalid {
                    message: format!("unknown sample category '{name}'"),
                })
            })
            .collect(),
    }
}
