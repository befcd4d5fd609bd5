//! Per-category samples drawn from one listing page.

use dissident_film_models::{FilmRecord, SampleCategory, SampleEnd};

/// Picks up to `size` films for `category` from a page of that category's
/// listing: the first films for head categories, the last for tail ones.
/// Unrated films are skipped unless the category allows them.
#[must_use]
pub fn select_sample(films: &[FilmRecord], category: SampleCategory, size: usize) -> Vec<FilmRecord> {
    let eligible: Vec<&FilmRecord> = films
        .iter()
        .filter(|film| category.allows_unrated() || film.is_rated())
        .collect();

    let picked = match category.end() {
        SampleEnd::Head => &eligible[..size.min(eligible.len())],
        SampleEnd::Tail => &eligible[eligible.len().saturating_sub(size)..],
    };

    picked.iter().map(|film| (*film).clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Vec<FilmRecord> {
        [
            ("A", "★★★"),
            ("B", ""),
            ("C", "★"),
            ("D", "★★½"),
            ("E", ""),
            ("F", "★★★★"),
        ]
        .iter()
        .map(|(title, rating)| {
            FilmRecord::new(title, &format!("https://letterboxd.com/film/{title}/"), rating).unwrap()
        })
        .collect()
    }

    fn titles(films: &[FilmRecord]) -> Vec<&str> {
        films.iter().map(|f| f.title.as_str()).collect()
    }

    #[test]
    fn head_keeps_unrated_for_most_popular() {
        let sample = select_sample(&page(), SampleCategory::MostPopular, 3);
        assert_eq!(titles(&sample), vec!["A", "B", "C"]);
    }

    #[test]
    fn head_skips_unrated_elsewhere() {
        let sample = select_sample(&page(), SampleCategory::BestUserRate, 3);
        assert_eq!(titles(&sample), vec!["A", "C", "D"]);
    }

    #[test]
    fn tail_takes_last_rated() {
        let sample = select_sample(&page(), SampleCategory::LeastPopular, 2);
        assert_eq!(titles(&sample), vec!["D", "F"]);
    }

    #[test]
    fn oversized_sample_returns_everything_eligible() {
        let sample = select_sample(&page(), SampleCategory::WorstUserRate, 50);
        assert_eq!(titles(&sample), vec!["A", "C", "D", "F"]);
    }

    #[test]
    fn zero_size_is_empty() {
        assert!(select_sample(&page(), SampleCategory::MostRecentRated, 0).is_empty());
        assert!(select_sample(&page(), SampleCategory::LeastRecentRated, 0).is_empty());
    }
}
