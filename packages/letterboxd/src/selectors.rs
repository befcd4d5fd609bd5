//! CSS selectors for Letterboxd markup, compiled once.

use std::sync::LazyLock;

use scraper::Selector;

/// Compiles a selector that is known to be valid at build time.
fn compile(selector: &str) -> Selector {
    Selector::parse(selector).unwrap_or_else(|_| unreachable!("invalid selector {selector}"))
}

/// The single grid holding a page of posters.
pub static POSTER_LIST: LazyLock<Selector> = LazyLock::new(|| compile("ul.poster-list"));

/// One film entry inside [`POSTER_LIST`].
pub static POSTER_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| compile("li.poster-container"));

/// Poster element carrying the film link.
pub static FILM_POSTER: LazyLock<Selector> =
    LazyLock::new(|| compile("div.film-poster[data-target-link]"));

/// Fallback for links carried by any other element in the container.
pub static TARGET_LINK: LazyLock<Selector> = LazyLock::new(|| compile("[data-target-link]"));

/// Attribute holding the (usually site-relative) film link.
pub const TARGET_LINK_ATTR: &str = "data-target-link";

/// Poster image; its `alt` is the film title.
pub static POSTER_IMAGE: LazyLock<Selector> = LazyLock::new(|| compile("img"));

/// The user's star rating under the poster.
pub static RATING: LazyLock<Selector> =
    LazyLock::new(|| compile("p.poster-viewingdata > span.rating"));

/// Profile link to the films-by-entry-rating listing.
pub static ENTRY_RATING_LINK: LazyLock<Selector> =
    LazyLock::new(|| compile(r#"a[href*="/films/by/entry-rating/"]"#));

/// Ratings histogram on the profile sidebar.
pub static RATINGS_HISTOGRAM: LazyLock<Selector> =
    LazyLock::new(|| compile("section.ratings-histogram-chart"));
