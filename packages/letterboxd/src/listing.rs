//! Listing page parser.
//!
//! A listing page holds one `ul.poster-list`; each `li.poster-container`
//! inside it is one film. Missing or reshuffled markup never errors: the
//! parser returns whatever it could extract, and an empty page is the
//! caller's cue that pagination is over.

use dissident_film_models::FilmRecord;
use scraper::{ElementRef, Html};

use crate::selectors;
use crate::urls::absolutize;

/// Films extracted from one listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Records with both a title and a link, in page order.
    pub films: Vec<FilmRecord>,
    /// Poster containers seen, including ones that were dropped.
    pub container_count: usize,
}

impl ListingPage {
    /// Whether the page yielded no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.films.is_empty()
    }
}

/// Parses one listing page.
///
/// Uses html5ever's error-recovering tree builder, so truncated or invalid
/// markup still yields whatever containers survive.
#[must_use]
pub fn parse_listing(html: &str) -> ListingPage {
    let document = Html::parse_document(html);

    let Some(list) = document.select(&selectors::POSTER_LIST).next() else {
        log::debug!("No poster list on page");
        return ListingPage::default();
    };

    let mut page = ListingPage::default();

    for container in list.select(&selectors::POSTER_CONTAINER) {
        page.container_count += 1;
        if let Some(film) = parse_container(container) {
            page.films.push(film);
        }
    }

    log::trace!(
        "Listing page: {} containers, {} retained",
        page.container_count,
        page.films.len()
    );

    page
}

/// Extracts a record from one poster container.
fn parse_container(container: ElementRef<'_>) -> Option<FilmRecord> {
    let poster = container
        .select(&selectors::FILM_POSTER)
        .next()
        .or_else(|| container.select(&selectors::TARGET_LINK).next())?;

    let url = poster
        .value()
        .attr(selectors::TARGET_LINK_ATTR)
        .and_then(absolutize)?;

    let title = poster
        .select(&selectors::POSTER_IMAGE)
        .next()
        .or_else(|| container.select(&selectors::POSTER_IMAGE).next())
        .and_then(|img| img.value().attr("alt"))
        .unwrap_or_default();

    let rating = container
        .select(&selectors::RATING)
        .next()
        .map(|span| span.text().collect::<String>())
        .unwrap_or_default();

    FilmRecord::new(title, &url, &rating)
}
