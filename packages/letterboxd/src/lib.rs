#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Everything that depends on Letterboxd's markup and URL layout.
//!
//! The site is versionless and outside our control, so all structure
//! coupling is kept here: CSS selectors ([`selectors`]), the listing page
//! parser ([`listing`]), the ranked film-count extractors ([`count`]) and
//! the URL scheme ([`urls`]). A markup change should only ever require
//! touching this crate. [`self_test`] runs the parser against a bundled
//! fixture so breakage shows up before a real scrape does.

pub mod count;
pub mod listing;
pub mod selectors;
pub mod urls;
pub mod username;

pub use listing::{ListingPage, parse_listing};
pub use username::{InvalidUsername, Username};

/// Scheme and host every film URL is anchored to.
pub const SITE_ORIGIN: &str = "https://letterboxd.com";

/// Number of posters Letterboxd shows per listing page.
pub const RECORDS_PER_PAGE: u32 = 72;

/// Listing markup the parser is expected to handle.
pub const LISTING_FIXTURE: &str = include_str!("../fixtures/listing.html");

/// Poster containers in [`LISTING_FIXTURE`].
pub const FIXTURE_CONTAINERS: usize = 5;

/// Records [`LISTING_FIXTURE`] should yield (one poster has no title).
pub const FIXTURE_RECORDS: usize = 4;

/// Outcome of [`self_test`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfTestReport {
    /// Poster containers found.
    pub containers: usize,
    /// Records retained.
    pub records: usize,
}

impl SelfTestReport {
    /// Whether the parser produced what the fixture should produce.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.containers == FIXTURE_CONTAINERS && self.records == FIXTURE_RECORDS
    }
}

/// Parses the bundled listing fixture and reports what was found.
#[must_use]
pub fn self_test() -> SelfTestReport {
    let page = parse_listing(LISTING_FIXTURE);
    let report = SelfTestReport {
        containers: page.container_count,
        records: page.films.len(),
    };

    if report.passed() {
        log::debug!("Parser self-test passed: {report:?}");
    } else {
        log::warn!(
            "Parser self-test failed: expected {FIXTURE_CONTAINERS} containers / \
             {FIXTURE_RECORDS} records, got {report:?}"
        );
    }

    report
}
