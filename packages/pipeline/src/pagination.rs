//! Pagination state and run phases.

use strum_macros::Display;

/// Where a run is in its lifecycle.
///
/// `Init → FetchingCount → Paging → Done`; any phase may move to `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    Init,
    FetchingCount,
    Paging,
    Done,
    Error,
}

impl Phase {
    /// Whether moving from `self` to `next` is a legal transition.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Init, Self::FetchingCount)
                | (Self::FetchingCount, Self::Paging)
                | (Self::Paging, Self::Done)
                | (Self::Init | Self::FetchingCount | Self::Paging, Self::Error)
        )
    }

    /// Whether the run has finished, successfully or not.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

/// Page bookkeeping for one run.
///
/// The totals are fixed once, from the profile's film count, and never
/// recomputed while paging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    /// Last page requested, 0 before the first.
    pub current_page: u32,
    /// Pages the run will fetch at most; 0 when the count is unknown.
    pub total_pages: u32,
    /// Film count reported by the profile; 0 when unknown.
    pub total_records_expected: u64,
    /// `ceil(total_records_expected / records_per_page)` before capping.
    pub estimated_pages: u32,
    /// Upper bound on the paging loop.
    pub page_limit: u32,
}

impl PaginationState {
    /// Derives the page totals from a film count.
    #[must_use]
    pub fn new(total_records_expected: u64, records_per_page: u32, max_pages: u32) -> Self {
        let per_page = u64::from(records_per_page.max(1));
        let estimated_pages =
            u32::try_from(total_records_expected.div_ceil(per_page)).unwrap_or(u32::MAX);
        let total_pages = estimated_pages.min(max_pages);
        let page_limit = if total_records_expected == 0 {
            max_pages
        } else {
            total_pages
        };

        Self {
            current_page: 0,
            total_pages,
            total_records_expected,
            estimated_pages,
            page_limit,
        }
    }

    /// The count was larger than `max_pages` pages can hold.
    #[must_use]
    pub const fn is_truncated(&self) -> bool {
        self.estimated_pages > self.total_pages
    }

    /// The count is unknown, so paging runs until an empty page.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.total_records_expected == 0
    }

    /// Percentage to report once `page` has been processed.
    #[must_use]
    pub fn percent_after(&self, page: u32, baseline: f64, span: f64) -> f64 {
        if self.total_pages == 0 {
            return baseline.clamp(0.0, 100.0);
        }
        let fraction = f64::from(page) / f64::from(self.total_pages);
        span.mul_add(fraction, baseline).clamp(0.0, 100.0)
    }
}
