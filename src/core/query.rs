//! Pagination over a filtered, sorted collection

use serde::Serialize;
use std::ops::Range;

/// Number of page links shown around the current page
pub const PAGE_WINDOW: usize = 5;

/// Page cursor of one list view.
///
/// The current page always lies in `[1, max(1, total_pages)]`: whenever the
/// total changes the page is clamped before the next slice is taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
    current_page: usize,
    total_items: usize,
}

impl Paginator {
    /// Create a paginator; a page size of 0 is raised to 1
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            current_page: 1,
            total_items: 0,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    /// `ceil(total / size)`, 0 for an empty result
    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.page_size)
    }

    /// Record a new result size and clamp the current page into range
    pub fn set_total(&mut self, total_items: usize) {
        self.total_items = total_items;
        let total_pages = self.total_pages();
        if self.current_page > total_pages {
            self.current_page = total_pages.max(1);
        }
    }

    /// Jump to a page; out-of-range requests are ignored and return `false`
    pub fn go_to(&mut self, page: usize) -> bool {
        if page >= 1 && page <= self.total_pages() {
            self.current_page = page;
            true
        } else {
            false
        }
    }

    pub fn next(&mut self) -> bool {
        self.go_to(self.current_page + 1)
    }

    pub fn previous(&mut self) -> bool {
        match self.current_page.checked_sub(1) {
            Some(page) => self.go_to(page),
            None => false,
        }
    }

    /// Return to the first page
    pub fn reset(&mut self) {
        self.current_page = 1;
    }

    /// Index range of the current page, `[(page-1)*size, page*size)` capped at the total
    pub fn range(&self) -> Range<usize> {
        let start = ((self.current_page - 1) * self.page_size).min(self.total_items);
        let end = (start + self.page_size).min(self.total_items);
        start..end
    }

    /// Slice the current page out of `items`
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let range = self.range();
        let end = range.end.min(items.len());
        &items[range.start.min(end)..end]
    }

    /// Page numbers to render, at most [`PAGE_WINDOW`] centred on the current page
    pub fn visible_pages(&self) -> Vec<usize> {
        let total = self.total_pages();
        if total == 0 {
            return Vec::new();
        }
        let half = PAGE_WINDOW / 2;
        let mut start = self.current_page.saturating_sub(half).max(1);
        let end = (start + PAGE_WINDOW - 1).min(total);
        if end + 1 - start < PAGE_WINDOW {
            start = end.saturating_sub(PAGE_WINDOW - 1).max(1);
        }
        (start..=end).collect()
    }

    pub fn meta(&self) -> PaginationMeta {
        PaginationMeta::new(self.current_page, self.page_size, self.total_items)
    }
}

/// Pagination metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationMeta {
    /// Current page number (starts at 1)
    pub page: usize,

    /// Number of items per page
    pub limit: usize,

    /// Total number of items (after filters)
    pub total: usize,

    /// Total number of pages
    pub total_pages: usize,

    /// Whether there is a next page
    pub has_next: bool,

    /// Whether there is a previous page
    pub has_prev: bool,
}

impl PaginationMeta {
    /// Create pagination metadata from calculation
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        let total_pages = total.div_ceil(limit);
        let start = (page - 1) * limit;

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: start + limit < total,
            has_prev: page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_meta() {
        let meta = PaginationMeta::new(1, 20, 145);
        assert_eq!(meta.total, 145);
        assert_eq!(meta.total_pages, 8);
        assert!(!meta.has_prev);
        assert!(meta.has_next);
    }

    #[test]
    fn test_empty_result_has_zero_pages_and_page_one() {
        let mut pager = Paginator::new(10);
        pager.set_total(0);
        assert_eq!(pager.total_pages(), 0);
        assert_eq!(pager.current_page(), 1);
        assert_eq!(pager.range(), 0..0);
        assert!(pager.visible_pages().is_empty());
    }

    #[test]
    fn test_go_to_rejects_out_of_range() {
        let mut pager = Paginator::new(10);
        pager.set_total(35);
        assert_eq!(pager.total_pages(), 4);

        assert!(pager.go_to(3));
        assert!(!pager.go_to(0));
        assert_eq!(pager.current_page(), 3);
        assert!(!pager.go_to(5));
        assert_eq!(pager.current_page(), 3);

        assert!(pager.go_to(3));
        assert_eq!(pager.current_page(), 3);
    }

    #[test]
    fn test_next_and_previous_stop_at_bounds() {
        let mut pager = Paginator::new(10);
        pager.set_total(20);
        assert!(!pager.previous());
        assert!(pager.next());
        assert!(!pager.next());
        assert_eq!(pager.current_page(), 2);
        assert!(pager.previous());
        assert_eq!(pager.current_page(), 1);
    }

    #[test]
    fn test_shrinking_total_clamps_page() {
        let mut pager = Paginator::new(10);
        pager.set_total(100);
        pager.go_to(9);

        pager.set_total(25);
        assert_eq!(pager.current_page(), 3);

        pager.set_total(0);
        assert_eq!(pager.current_page(), 1);
    }

    #[test]
    fn test_last_page_is_partial() {
        let items: Vec<u32> = (0..23).collect();
        let mut pager = Paginator::new(10);
        pager.set_total(items.len());
        pager.go_to(3);
        assert_eq!(pager.slice(&items), &[20, 21, 22]);
    }

    #[test]
    fn test_visible_pages_window() {
        let mut pager = Paginator::new(1);
        pager.set_total(12);
        assert_eq!(pager.visible_pages(), vec![1, 2, 3, 4, 5]);

        pager.go_to(7);
        assert_eq!(pager.visible_pages(), vec![5, 6, 7, 8, 9]);

        pager.go_to(12);
        assert_eq!(pager.visible_pages(), vec![8, 9, 10, 11, 12]);

        pager.set_total(3);
        assert_eq!(pager.visible_pages(), vec![1, 2, 3]);
    }
}
