//! Letterboxd URL scheme.

use dissident_film_models::ListingOrder;

use crate::{SITE_ORIGIN, Username};

/// Path segment (relative to the user root) for each listing ordering.
#[must_use]
pub const fn order_path(order: ListingOrder) -> &'static str {
    match order {
        ListingOrder::EntryRating => "films/by/entry-rating/",
        ListingOrder::CommunityRating => "films/by/rating/",
        ListingOrder::Popular => "films/by/popular/",
        ListingOrder::Date => "films/by/date/",
        ListingOrder::Release => "films/",
    }
}

/// The user's profile page, which carries the film count.
#[must_use]
pub fn profile_url(username: &Username) -> String {
    format!("{SITE_ORIGIN}/{username}/")
}

/// One page of a user's film listing. Page 1 has no page suffix.
#[must_use]
pub fn listing_url(username: &Username, order: ListingOrder, page: u32) -> String {
    let base = format!("{SITE_ORIGIN}/{username}/{}", order_path(order));
    if page > 1 {
        format!("{base}page/{page}/")
    } else {
        base
    }
}

/// Resolves a poster link against the site origin.
///
/// Site-relative and protocol-relative links are anchored to
/// [`SITE_ORIGIN`]. Absolute links to any other host yield `None`.
#[must_use]
pub fn absolutize(link: &str) -> Option<String> {
    let link = link.trim();
    if link.is_empty() {
        return None;
    }

    if let Some(rest) = link.strip_prefix("//") {
        return absolutize(&format!("https://{rest}"));
    }

    if link.starts_with("http://") || link.starts_with("https://") {
        let https = link.replacen("http://", "https://", 1);
        let on_site = https
            .strip_prefix(SITE_ORIGIN)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
        return on_site.then_some(https);
    }

    if link.starts_with('/') {
        Some(format!("{SITE_ORIGIN}{link}"))
    } else {
        Some(format!("{SITE_ORIGIN}/{link}"))
    }
}
