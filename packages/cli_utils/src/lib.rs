#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared CLI utilities for the dissident score tools.
//!
//! Provides an `indicatif`-backed progress bar behind the
//! [`ProgressSink`] trait, plus [`init_logger`] which sets up
//! `indicatif-log-bridge` so that `log::info!` and friends are suspended
//! while progress bars redraw.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use dissident_pipeline::{ProgressEvent, ProgressSink, SinkClosed};
use indicatif::{ProgressBar, ProgressStyle};

pub use indicatif::MultiProgress;

/// Bar positions per percentage point, so one-decimal progress is visible.
const TICKS_PER_PERCENT: f64 = 10.0;

/// An `indicatif` [`ProgressBar`] that implements [`ProgressSink`].
pub struct IndicatifProgress {
    bar: ProgressBar,
    /// Style to switch to once the run reports real progress.
    bar_style: ProgressStyle,
    started: AtomicBool,
}

impl IndicatifProgress {
    /// Creates a progress bar that starts as a spinner while the profile is
    /// looked up and turns into a percentage bar once pages are being read.
    #[must_use]
    pub fn scrape_bar(multi: &MultiProgress, message: &str) -> Self {
        let bar = multi.add(ProgressBar::new_spinner());
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());

        let bar_style = ProgressStyle::with_template(
            "  {msg} {wide_bar:.cyan/dim} {percent}% [{elapsed_precise}]",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");

        Self {
            bar,
            bar_style,
            started: AtomicBool::new(false),
        }
    }

    /// Current bar position, in tenths of a percent.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Completes the bar with a final message.
    pub fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }

    /// Removes the bar from the terminal.
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for IndicatifProgress {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn send(&self, event: ProgressEvent) -> Result<(), SinkClosed> {
        if self.bar.is_finished() {
            return Err(SinkClosed);
        }

        if event.percent > 0.0 && !self.started.swap(true, Ordering::Relaxed) {
            self.bar.set_length((100.0 * TICKS_PER_PERCENT) as u64);
            // Switch from spinner to bar style now that progress is measurable.
            self.bar.set_style(self.bar_style.clone());
        }

        self.bar
            .set_position((event.percent.clamp(0.0, 100.0) * TICKS_PER_PERCENT).round() as u64);
        self.bar.set_message(event.message);

        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.bar.is_finished()
    }
}

/// Initializes the global logger wrapped in `indicatif-log-bridge` so that
/// `log::info!` and friends are suspended while progress bars redraw.
///
/// Returns the [`MultiProgress`] that all progress bars must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    // Build the pretty-env-logger logger manually so we can wrap it.
    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok(); // Ignore error if logger was already set (e.g., in tests)

    log::set_max_level(level);

    multi
}
