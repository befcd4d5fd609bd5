#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dissident-score aggregation.
//!
//! Films fetched in a community ordering (best community rating first) are
//! assigned an expected score that falls linearly from 5 at position 1 to 1
//! at the last position. A film's dissident score is how far the user's
//! own rating sits above or below that line.
//!
//! Everything here is pure: no I/O, input order preserved.

pub mod samples;

use dissident_film_models::{DissidentScore, FilmRecord, ScoredFilmRecord, round2};

/// Expected score at the top of the ordering.
pub const TOP_SCORE: f64 = 5.0;

/// Expected score at the bottom of the ordering.
pub const BOTTOM_SCORE: f64 = 1.0;

/// Expected score for a lone film, where the interpolation has no slope.
pub const SINGLE_FILM_SCORE: f64 = TOP_SCORE;

/// Linear interpolation of the expected score at 1-based `position` of
/// `total`. Positions outside `[1, total]` are clamped.
#[must_use]
pub fn expected_score(position: u32, total: u32) -> f64 {
    if total <= 1 {
        return SINGLE_FILM_SCORE;
    }
    let position = position.clamp(1, total);
    let span = TOP_SCORE - BOTTOM_SCORE;
    TOP_SCORE - span * f64::from(position - 1) / f64::from(total - 1)
}

/// Scores `film` at `position` of `total`.
#[must_use]
pub fn score_film(film: &FilmRecord, position: u32, total: u32) -> ScoredFilmRecord {
    let user_score = film.numeric_rating();
    let expected = expected_score(position, total);

    ScoredFilmRecord {
        film: film.clone(),
        score: DissidentScore {
            user_score,
            community_position: position,
            expected_score: expected,
            dissident_score: round2(user_score.value() - expected),
        },
    }
}

/// Scores every film by its 1-based index in `films`.
///
/// `films` must already be in the ordering treated as community position.
#[must_use]
pub fn aggregate(films: &[FilmRecord]) -> Vec<ScoredFilmRecord> {
    let total = count_u32(films.len());

    films
        .iter()
        .zip(1..=total)
        .map(|(film, position)| score_film(film, position, total))
        .collect()
}

/// Scores a sample taken from the end of an ordering of `total_known`
/// films.
///
/// The interpolation runs over the sample itself, while
/// `community_position` reports where each film sits in the full ordering.
#[must_use]
pub fn aggregate_tail(films: &[FilmRecord], total_known: u64) -> Vec<ScoredFilmRecord> {
    let len = count_u32(films.len());
    let total_known = u32::try_from(total_known).unwrap_or(u32::MAX).max(len);

    films
        .iter()
        .zip(1..=len)
        .map(|(film, index)| {
            let mut scored = score_film(film, index, len);
            scored.score.community_position = (total_known - len + index).max(1);
            scored
        })
        .collect()
}

/// Mean dissident score, or `None` for an empty slice.
#[must_use]
pub fn mean_dissidence(scored: &[ScoredFilmRecord]) -> Option<f64> {
    if scored.is_empty() {
        return None;
    }
    let sum: f64 = scored.iter().map(|s| s.score.dissident_score).sum();
    #[allow(clippy::cast_precision_loss)]
    Some(round2(sum / scored.len() as f64))
}

fn count_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| {
        log::warn!("Film list of {len} entries truncated for scoring");
        u32::MAX
    })
}
