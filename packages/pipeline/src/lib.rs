#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Letterboxd scrape pipeline.
//!
//! Ties the fetcher, the markup layer and the analytics together:
//! a [`Pipeline`] is built from a shared [`dissident_scraper::Fetcher`] and
//! an owned [`PipelineConfig`], and reports progress through a
//! [`progress::ProgressSink`] chosen by the caller.

pub mod config;
pub mod driver;
pub mod error;
pub mod outcome;
pub mod pagination;
pub mod progress;

pub use config::{ConfigError, Metric, PipelineConfig, parse_samples};
pub use driver::Pipeline;
pub use error::{ErrorKind, PipelineError};
pub use outcome::{CountOutcome, ScrapeOutcome, UserCheck};
pub use progress::{CollectingSink, NullSink, ProgressEvent, ProgressSink, SinkClosed};
