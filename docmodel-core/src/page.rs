//! Paged results and the pagination calculator.
//!
//! A [`PagedResult`] combines one page of data with two derived metadata
//! blocks: page navigation ([`PageInfo`]) and item positions ([`ItemInfo`]).
//! The arithmetic lives in [`compute_metadata`] so it can be checked without
//! a driver.

use serde::{Deserialize, Serialize};

/// Page navigation metadata derived from a count and a window query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// The requested (current) page, 1-based.
    pub current: i64,
    /// The page before the current one; 0 when on the first page.
    pub prev: i64,
    /// Whether `prev` names a page. Kept as `prev != 0`, which is true even
    /// when `prev` is negative; downstream callers rely on this.
    pub has_prev: bool,
    /// The page after the current one.
    pub next: i64,
    /// Whether `next` is within the total page count.
    pub has_next: bool,
    /// Total number of pages.
    pub total: i64,
}

/// Item-window metadata: 1-based positions within the full result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInfo {
    /// The page size the window was computed with.
    pub limit: i64,
    /// 1-based index of the first item on this page, clamped to `total`.
    pub begin: i64,
    /// 1-based index of the last item on this page, clamped to `total`.
    pub end: i64,
    /// Total number of items matching the filter.
    pub total: i64,
}

/// One page of typed results plus the derived metadata blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<M> {
    /// The fetched data slice, in sort order.
    pub data: Vec<M>,
    /// Page navigation metadata.
    pub pages: PageInfo,
    /// Item-window metadata.
    pub items: ItemInfo,
}

/// Derives page and item metadata from a window query and a total count.
///
/// `limit` and `page` are expected to be positive; `total_items` is the count
/// of documents matching the filter. Begin/end are clamped down to
/// `total_items` when the requested window exceeds the available data.
pub fn compute_metadata(limit: i64, page: i64, total_items: i64) -> (PageInfo, ItemInfo) {
    let total_pages = if limit > 0 {
        (total_items + limit - 1) / limit
    } else {
        0
    };
    let next = page + 1;
    let prev = page - 1;

    let pages = PageInfo {
        current: page,
        prev,
        has_prev: prev != 0,
        next,
        has_next: next <= total_pages,
        total: total_pages,
    };

    let mut begin = (page * limit - limit) + 1;
    let mut end = page * limit;
    if begin > total_items {
        begin = total_items;
    }
    if end > total_items {
        end = total_items;
    }

    let items = ItemInfo { limit, begin, end, total: total_items };

    (pages, items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_of_two_pages() {
        let (pages, items) = compute_metadata(2, 1, 3);

        assert_eq!(items.begin, 1);
        assert_eq!(items.end, 2);
        assert_eq!(items.total, 3);
        assert_eq!(pages.total, 2);
        assert!(pages.has_next);
        assert_eq!(pages.next, 2);
        assert_eq!(pages.prev, 0);
        assert!(!pages.has_prev);
    }

    #[test]
    fn last_short_page_clamps_end() {
        let (pages, items) = compute_metadata(2, 2, 3);

        assert_eq!(items.begin, 3);
        assert_eq!(items.end, 3);
        assert!(!pages.has_next);
        assert_eq!(pages.prev, 1);
        assert!(pages.has_prev);
    }

    #[test]
    fn zero_matches_clamp_everything_to_zero() {
        let (pages, items) = compute_metadata(2, 1, 0);

        assert_eq!(items.begin, 0);
        assert_eq!(items.end, 0);
        assert_eq!(items.total, 0);
        assert_eq!(pages.total, 0);
        assert!(!pages.has_next);
    }

    #[test]
    fn window_beyond_the_data_clamps_begin_and_end() {
        let (pages, items) = compute_metadata(10, 5, 7);

        assert_eq!(items.begin, 7);
        assert_eq!(items.end, 7);
        assert_eq!(pages.total, 1);
        assert!(!pages.has_next);
    }

    #[test]
    fn negative_prev_still_reports_has_prev() {
        // Documented edge case: has_prev is `prev != 0`, so page 0 yields
        // prev -1 and has_prev true.
        let (pages, _) = compute_metadata(2, 0, 10);

        assert_eq!(pages.prev, -1);
        assert!(pages.has_prev);
    }

    #[test]
    fn exact_multiple_has_no_next_on_the_last_page() {
        let (pages, items) = compute_metadata(5, 2, 10);

        assert_eq!(items.begin, 6);
        assert_eq!(items.end, 10);
        assert_eq!(pages.total, 2);
        assert!(!pages.has_next);
    }
}
