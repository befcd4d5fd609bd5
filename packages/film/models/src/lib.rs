#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Film record types shared across the dissident toolchain.
//!
//! A [`FilmRecord`] is what the listing parser extracts from one poster
//! container. Derived data (the numeric star rating and the dissident score)
//! is layered on top by wrapping records rather than mutating them, so the
//! scraped sequence stays exactly as it was fetched.

use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// Full-star glyph used in rating text.
pub const FULL_STAR: char = '★';

/// Half-star glyph used in rating text.
pub const HALF_STAR: char = '½';

/// Highest rating a user can give.
pub const MAX_RATING: f64 = 5.0;

/// Rounds to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Serializes an `f64` rounded to two decimal places.
///
/// # Errors
///
/// Propagates the serializer's error.
#[allow(clippy::trivially_copy_pass_by_ref)]
pub fn serialize_round2<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round2(*value))
}

/// One film as it appears on a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilmRecord {
    /// Display title (the poster image's `alt` text).
    pub title: String,
    /// Absolute URL of the film page.
    pub url: String,
    /// Star glyphs as rendered on the page, e.g. `"★★★½"`. May be empty.
    #[serde(rename = "user_rating")]
    pub rating_text: String,
}

impl FilmRecord {
    /// Creates a record, or `None` when the title or url is blank.
    #[must_use]
    pub fn new(title: &str, url: &str, rating_text: &str) -> Option<Self> {
        let title = title.trim();
        let url = url.trim();
        if title.is_empty() || url.is_empty() {
            return None;
        }
        Some(Self {
            title: title.to_string(),
            url: url.to_string(),
            rating_text: rating_text.trim().to_string(),
        })
    }

    /// Whether the listing showed a rating for this film.
    #[must_use]
    pub const fn is_rated(&self) -> bool {
        !self.rating_text.is_empty()
    }

    /// The numeric value of [`Self::rating_text`].
    #[must_use]
    pub fn numeric_rating(&self) -> NumericRating {
        NumericRating::parse(&self.rating_text)
    }
}

/// A star rating in `[0.0, 5.0]`, in half-star steps.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NumericRating(f64);

impl NumericRating {
    /// Parses rating text by counting glyphs: every `★` is worth one point
    /// and a `½` anywhere adds half a point. Text without glyphs is `0.0`.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let stars = text.chars().filter(|c| *c == FULL_STAR).count();
        let half = if text.contains(HALF_STAR) { 0.5 } else { 0.0 };
        #[allow(clippy::cast_precision_loss)]
        let value = stars as f64 + half;
        Self(value.min(MAX_RATING))
    }

    /// Returns the rating as a float.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for NumericRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// Derived fields of a film scored against its community position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DissidentScore {
    /// The user's own rating.
    pub user_score: NumericRating,
    /// 1-based rank of the film in the ordering used as community proxy.
    pub community_position: u32,
    /// Score the film "should" have at its position.
    #[serde(serialize_with = "serialize_round2")]
    pub expected_score: f64,
    /// `user_score - expected_score`, rounded to two decimals.
    pub dissident_score: f64,
}

/// A [`FilmRecord`] together with its [`DissidentScore`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredFilmRecord {
    /// The scraped record, untouched.
    #[serde(flatten)]
    pub film: FilmRecord,
    /// Derived fields.
    #[serde(flatten)]
    pub score: DissidentScore,
}

/// Output element of a scrape run.
///
/// Plain runs leave `score` empty; dissident runs fill it in. Both shapes
/// serialize as one flat JSON object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilmEntry {
    /// The scraped record.
    #[serde(flatten)]
    pub film: FilmRecord,
    /// Derived fields, when the run computed them.
    #[serde(flatten)]
    pub score: Option<DissidentScore>,
}

impl From<FilmRecord> for FilmEntry {
    fn from(film: FilmRecord) -> Self {
        Self { film, score: None }
    }
}

impl From<ScoredFilmRecord> for FilmEntry {
    fn from(scored: ScoredFilmRecord) -> Self {
        Self {
            film: scored.film,
            score: Some(scored.score),
        }
    }
}

/// Reduced shape used by the "simple" listing: a name and a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleFilm {
    /// Film title.
    pub name: String,
    /// Numeric rating.
    pub rating: NumericRating,
}

impl From<&FilmRecord> for SimpleFilm {
    fn from(film: &FilmRecord) -> Self {
        Self {
            name: film.title.clone(),
            rating: film.numeric_rating(),
        }
    }
}

/// Orderings a user's film listing can be fetched in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub enum ListingOrder {
    /// By the user's own rating, best first.
    EntryRating,
    /// By community average rating, best first.
    CommunityRating,
    /// By popularity, most popular first.
    Popular,
    /// By the date the user logged the film, newest first.
    Date,
    /// Default listing order, newest release first.
    Release,
}

/// Which end of a listing a sample is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEnd {
    /// The first entries of page 1.
    Head,
    /// The last entries of the last page.
    Tail,
}

/// Small per-category samples reported alongside the full listing.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SampleCategory {
    MostPopular,
    LeastPopular,
    MostRecentRated,
    LeastRecentRated,
    MostRecentRelease,
    LeastRecentRelease,
    BestCommunityRate,
    WorstCommunityRate,
    BestUserRate,
    WorstUserRate,
}

impl SampleCategory {
    /// The listing ordering this sample is drawn from.
    #[must_use]
    pub const fn order(self) -> ListingOrder {
        match self {
            Self::MostPopular | Self::LeastPopular => ListingOrder::Popular,
            Self::MostRecentRated | Self::LeastRecentRated => ListingOrder::Date,
            Self::MostRecentRelease | Self::LeastRecentRelease => ListingOrder::Release,
            Self::BestCommunityRate | Self::WorstCommunityRate => ListingOrder::CommunityRating,
            Self::BestUserRate | Self::WorstUserRate => ListingOrder::EntryRating,
        }
    }

    /// Which end of the listing the sample comes from.
    #[must_use]
    pub const fn end(self) -> SampleEnd {
        match self {
            Self::MostPopular
            | Self::MostRecentRated
            | Self::MostRecentRelease
            | Self::BestCommunityRate
            | Self::BestUserRate => SampleEnd::Head,
            Self::LeastPopular
            | Self::LeastRecentRated
            | Self::LeastRecentRelease
            | Self::WorstCommunityRate
            | Self::WorstUserRate => SampleEnd::Tail,
        }
    }

    /// Only the most-popular sample keeps films the user did not rate.
    #[must_use]
    pub const fn allows_unrated(self) -> bool {
        matches!(self, Self::MostPopular)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use strum::IntoEnumIterator as _;

    use super::*;

    #[test]
    fn parses_three_and_a_half_stars() {
        assert!((NumericRating::parse("★★★½").value() - 3.5).abs() < f64::EPSILON);
    }

    #[test]
    fn parses_lone_half_star() {
        assert!((NumericRating::parse("½").value() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_rating_is_zero() {
        assert!(NumericRating::parse("").value().abs() < f64::EPSILON);
        assert!(NumericRating::parse("  ").value().abs() < f64::EPSILON);
    }

    #[test]
    fn rating_is_capped_at_five() {
        assert!((NumericRating::parse("★★★★★★").value() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_blank_title_or_url() {
        assert!(FilmRecord::new("", "https://letterboxd.com/film/x/", "★").is_none());
        assert!(FilmRecord::new("Heat", "  ", "★").is_none());
        let film = FilmRecord::new(" Heat ", "https://letterboxd.com/film/heat-1995/", "").unwrap();
        assert_eq!(film.title, "Heat");
        assert!(!film.is_rated());
    }

    #[test]
    fn round2_rounds_half_away_from_zero() {
        assert!((round2(1.005_000_1) - 1.01).abs() < 1e-9);
        assert!((round2(-2.333) - -2.33).abs() < 1e-9);
    }

    #[test]
    fn plain_entry_serializes_without_score_fields() {
        let film = FilmRecord::new("Heat", "https://letterboxd.com/film/heat-1995/", "★★★★").unwrap();
        let value = serde_json::to_value(FilmEntry::from(film)).unwrap();
        assert_eq!(value["title"], "Heat");
        assert_eq!(value["user_rating"], "★★★★");
        assert!(value.get("dissident_score").is_none());
    }

    #[test]
    fn scored_entry_serializes_flat() {
        let film = FilmRecord::new("Heat", "https://letterboxd.com/film/heat-1995/", "★★").unwrap();
        let entry = FilmEntry::from(ScoredFilmRecord {
            film,
            score: DissidentScore {
                user_score: NumericRating::parse("★★"),
                community_position: 2,
                expected_score: 10.0 / 3.0,
                dissident_score: -1.33,
            },
        });
        let value = serde_json::to_value(entry).unwrap();
        assert_eq!(value["community_position"], 2);
        assert_eq!(value["expected_score"], 3.33);
        assert_eq!(value["user_score"], 2.0);
    }

    #[test]
    fn sample_categories_round_trip_through_strum() {
        for category in SampleCategory::iter() {
            assert_eq!(SampleCategory::from_str(category.as_ref()).unwrap(), category);
        }
        assert_eq!(SampleCategory::LeastPopular.to_string(), "least_popular");
    }

    #[test]
    fn only_most_popular_allows_unrated() {
        let allowed: Vec<_> = SampleCategory::iter().filter(|c| c.allows_unrated()).collect();
        assert_eq!(allowed, vec![SampleCategory::MostPopular]);
    }
}
