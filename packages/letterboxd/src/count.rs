//! Film-count extraction from a profile page.
//!
//! The profile page does not expose the count in one stable place, so a
//! ranked list of [`CountExtractor`]s is tried in order and the first
//! non-zero match wins. Each extractor is independent and can be tested on
//! its own.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

use crate::selectors;

static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d[\d,]*)").unwrap_or_else(|_| unreachable!()));

static FILMS_RATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d,]*)\s+films?\s+rated").unwrap_or_else(|_| unreachable!())
});

static FILMS_WATCHED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d,]*)\s+films?\s+watched").unwrap_or_else(|_| unreachable!())
});

/// One strategy for finding the film count on a profile page.
pub trait CountExtractor: Send + Sync {
    /// Short identifier reported as the count's `source`.
    fn name(&self) -> &'static str;

    /// Returns the count if this strategy finds one.
    fn extract(&self, html: &str) -> Option<u64>;
}

/// Text of the profile link to the by-entry-rating listing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryRatingLink;

impl CountExtractor for EntryRatingLink {
    fn name(&self) -> &'static str {
        "entry_rating_link"
    }

    fn extract(&self, html: &str) -> Option<u64> {
        let document = Html::parse_document(html);
        document
            .select(&selectors::ENTRY_RATING_LINK)
            .find_map(|link| {
                let text = link.text().collect::<String>();
                first_capture(&FIRST_NUMBER, &text)
            })
    }
}

/// "`<n>` films rated" inside the ratings histogram section.
#[derive(Debug, Clone, Copy, Default)]
pub struct RatingsHistogram;

impl CountExtractor for RatingsHistogram {
    fn name(&self) -> &'static str {
        "ratings_histogram"
    }

    fn extract(&self, html: &str) -> Option<u64> {
        let document = Html::parse_document(html);
        let section = document.select(&selectors::RATINGS_HISTOGRAM).next()?;
        let text = section.text().collect::<Vec<_>>().join(" ");
        first_capture(&FILMS_RATED, &text)
    }
}

/// "`<n>` films watched" anywhere in the raw page.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilmsWatched;

impl CountExtractor for FilmsWatched {
    fn name(&self) -> &'static str {
        "films_watched"
    }

    fn extract(&self, html: &str) -> Option<u64> {
        first_capture(&FILMS_WATCHED, html)
    }
}

/// A count and the extractor that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountMatch {
    /// The film count.
    pub count: u64,
    /// [`CountExtractor::name`] of the strategy that matched.
    pub source: &'static str,
}

/// The extractors in priority order.
#[must_use]
pub fn default_extractors() -> Vec<Box<dyn CountExtractor>> {
    vec![
        Box::new(EntryRatingLink),
        Box::new(RatingsHistogram),
        Box::new(FilmsWatched),
    ]
}

/// Runs `extractors` in order and returns the first non-zero count.
#[must_use]
pub fn extract_count(html: &str, extractors: &[Box<dyn CountExtractor>]) -> Option<CountMatch> {
    extractors.iter().find_map(|extractor| {
        let count = extractor.extract(html).filter(|n| *n > 0)?;
        log::debug!("Film count {count} found by {}", extractor.name());
        Some(CountMatch {
            count,
            source: extractor.name(),
        })
    })
}

/// Parses the first capture group of `re` in `text` as a number, ignoring
/// thousands separators.
fn first_capture(re: &Regex, text: &str) -> Option<u64> {
    let captures = re.captures(text)?;
    captures.get(1)?.as_str().replace(',', "").parse().ok()
}
