//! Results of pipeline operations.

use std::collections::BTreeMap;
use std::time::Duration;

use dissident_film_models::{FilmEntry, SampleCategory};
use dissident_letterboxd::Username;
use dissident_letterboxd::count::CountMatch;

use crate::config::Metric;

/// Everything a successful scrape produced.
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    /// Sanitized username.
    pub username: Username,
    /// Metric the run computed.
    pub metric: Metric,
    /// Film count from the profile page, 0 if none was found.
    pub total_movies: u64,
    /// Extractor that found `total_movies`.
    pub count_source: Option<&'static str>,
    /// Pages the run planned to fetch, 0 when the count was unknown.
    pub total_pages: u32,
    /// Pages that yielded records.
    pub pages_scraped: u32,
    /// Every record, in listing order.
    pub films: Vec<FilmEntry>,
    /// Per-category samples, present for each requested category.
    pub samples: BTreeMap<SampleCategory, Vec<FilmEntry>>,
    /// Mean dissident score over `films`, for scored runs.
    pub mean_dissident_score: Option<f64>,
    /// Wall-clock time of the run.
    pub elapsed: Duration,
}

impl ScrapeOutcome {
    /// Number of records collected.
    #[must_use]
    pub fn count(&self) -> usize {
        self.films.len()
    }

    /// Share of planned pages that were scraped, one decimal place.
    ///
    /// Runs without a planned total report 100.
    #[must_use]
    pub fn progress_percentage(&self) -> f64 {
        if self.total_pages == 0 {
            return 100.0;
        }
        let ratio = f64::from(self.pages_scraped) / f64::from(self.total_pages);
        ((ratio * 1000.0).round() / 10.0).min(100.0)
    }

    /// [`Self::elapsed`] in milliseconds.
    #[must_use]
    pub fn execution_time_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Result of a count-only lookup.
#[derive(Debug, Clone)]
pub struct CountOutcome {
    /// Sanitized username.
    pub username: Username,
    /// The count and its source, if any extractor matched.
    pub found: Option<CountMatch>,
    /// Wall-clock time of the lookup.
    pub elapsed: Duration,
}

impl CountOutcome {
    /// The count, 0 when nothing matched.
    #[must_use]
    pub fn total_movies(&self) -> u64 {
        self.found.map_or(0, |m| m.count)
    }

    /// [`Self::elapsed`] in milliseconds.
    #[must_use]
    pub fn execution_time_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Result of a profile existence check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCheck {
    /// Whether the profile answered 200.
    pub exists: bool,
    /// The profile URL that was probed.
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(total_pages: u32, pages_scraped: u32) -> ScrapeOutcome {
        ScrapeOutcome {
            username: Username::parse("fixture").unwrap(),
            metric: Metric::Plain,
            total_movies: 0,
            count_source: None,
            total_pages,
            pages_scraped,
            films: Vec::new(),
            samples: BTreeMap::new(),
            mean_dissident_score: None,
            elapsed: Duration::from_millis(1_234),
        }
    }

    #[test]
    fn progress_percentage_is_share_of_planned_pages() {
        assert!((outcome(4, 4).progress_percentage() - 100.0).abs() < f64::EPSILON);
        assert!((outcome(3, 1).progress_percentage() - 33.3).abs() < 1e-9);
    }

    #[test]
    fn progress_percentage_never_divides_by_zero() {
        assert!((outcome(0, 5).progress_percentage() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn execution_time_is_in_millis() {
        assert_eq!(outcome(1, 1).execution_time_ms(), 1_234);
    }
}
