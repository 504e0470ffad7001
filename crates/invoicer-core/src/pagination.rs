//! # Pagination
//!
//! Normalizes caller-supplied page parameters and derives the pagination
//! block returned alongside a page of invoices.
//!
//! ```text
//! total_items = 23, page_size = 10
//!
//!   page 1          page 2          page 3
//!   [1 .. 10]       [11 .. 20]      [21 .. 23]
//!   prev: None      prev: 1         prev: 2
//!   next: 2         next: 3         next: None
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

// =============================================================================
// Page Request
// =============================================================================

/// A normalized page request. Construction never fails: out-of-range
/// values fall back to defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Normalizes raw page parameters.
    ///
    /// - page absent or ≤ 0 → 1
    /// - page size absent or ≤ 0 → [`DEFAULT_PAGE_SIZE`], capped at [`MAX_PAGE_SIZE`]
    ///
    /// ## Example
    /// ```rust
    /// use invoicer_core::pagination::PageRequest;
    ///
    /// let req = PageRequest::new(Some(0), Some(-5));
    /// assert_eq!((req.page(), req.page_size()), (1, 10));
    /// assert_eq!(PageRequest::new(Some(3), Some(10)).offset(), 20);
    /// ```
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        let page = match page {
            Some(p) if p > 0 => u32::try_from(p).unwrap_or(u32::MAX),
            _ => 1,
        };
        let page_size = match page_size {
            Some(s) if s > 0 => s.min(MAX_PAGE_SIZE as i64) as u32,
            _ => DEFAULT_PAGE_SIZE,
        };
        PageRequest { page, page_size }
    }

    #[inline]
    pub fn page(&self) -> u32 {
        self.page
    }

    #[inline]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Rows to skip: `(page - 1) × page_size`.
    #[inline]
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }

    /// Rows to take.
    #[inline]
    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::new(None, None)
    }
}

// =============================================================================
// Pagination
// =============================================================================

/// Pagination metadata for one page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Pagination {
    /// Rows matching the filter, ignoring limit and offset.
    pub total_items: i64,
    pub total_pages: i64,
    pub current_page: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page: Option<i64>,
    pub page_size: i64,
}

impl Pagination {
    /// Derives pagination for `total_items` matches under `request`.
    pub fn compute(total_items: i64, request: PageRequest) -> Self {
        let page_size = request.page_size() as i64;
        let current_page = request.page() as i64;
        let total_items = total_items.max(0);
        let total_pages = (total_items + page_size - 1) / page_size;

        Pagination {
            total_items,
            total_pages,
            current_page,
            prev_page: (current_page > 1).then(|| current_page - 1),
            next_page: (current_page < total_pages).then(|| current_page + 1),
            page_size,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let req = PageRequest::new(None, None);
        assert_eq!(req.page(), 1);
        assert_eq!(req.page_size(), 10);
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn test_non_positive_values_fall_back() {
        let req = PageRequest::new(Some(-3), Some(0));
        assert_eq!(req.page(), 1);
        assert_eq!(req.page_size(), 10);
    }

    #[test]
    fn test_page_size_is_capped() {
        assert_eq!(PageRequest::new(None, Some(5_000)).page_size(), MAX_PAGE_SIZE);
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest::new(Some(3), Some(25)).offset(), 50);
    }

    #[test]
    fn test_pagination_middle_page() {
        let p = Pagination::compute(23, PageRequest::new(Some(2), Some(10)));
        assert_eq!(p.total_items, 23);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.current_page, 2);
        assert_eq!(p.prev_page, Some(1));
        assert_eq!(p.next_page, Some(3));
        assert_eq!(p.page_size, 10);
    }

    #[test]
    fn test_pagination_boundaries() {
        let first = Pagination::compute(23, PageRequest::new(Some(1), Some(10)));
        assert_eq!(first.prev_page, None);
        assert_eq!(first.next_page, Some(2));

        let last = Pagination::compute(23, PageRequest::new(Some(3), Some(10)));
        assert_eq!(last.prev_page, Some(2));
        assert_eq!(last.next_page, None);
    }

    #[test]
    fn test_pagination_exact_multiple() {
        let p = Pagination::compute(20, PageRequest::new(Some(2), Some(10)));
        assert_eq!(p.total_pages, 2);
        assert_eq!(p.next_page, None);
    }

    #[test]
    fn test_pagination_empty() {
        let p = Pagination::compute(0, PageRequest::default());
        assert_eq!(p.total_items, 0);
        assert_eq!(p.total_pages, 0);
        assert_eq!(p.current_page, 1);
        assert_eq!(p.prev_page, None);
        assert_eq!(p.next_page, None);
    }

    #[test]
    fn test_total_pages_is_ceiling() {
        for total in 0..=45 {
            let p = Pagination::compute(total, PageRequest::new(None, Some(7)));
            let expected = (total as f64 / 7.0).ceil() as i64;
            assert_eq!(p.total_pages, expected, "total={}", total);
        }
    }

    #[test]
    fn test_serialization_omits_absent_links() {
        let p = Pagination::compute(5, PageRequest::default());
        let json = serde_json::to_value(p).unwrap();
        assert!(json.get("prev_page").is_none());
        assert!(json.get("next_page").is_none());
    }
}
