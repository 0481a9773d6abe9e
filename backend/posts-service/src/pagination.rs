//! Fixed-window pagination over ordered post listings.

use serde::{Deserialize, Serialize};

/// Items per page for every listing
pub const PAGE_SIZE: i64 = 10;

/// `?page=N` query parameter.
///
/// Kept as a raw string so that malformed values fall back to the first page
/// instead of failing extraction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// A resolved 1-based page number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    number: i64,
}

impl PageRequest {
    pub fn new(number: i64) -> Self {
        Self {
            number: number.max(1),
        }
    }

    pub fn first() -> Self {
        Self::new(1)
    }

    /// Missing, non-numeric or non-positive values resolve to page 1.
    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.trim().parse::<i64>().ok())
            .map(Self::new)
            .unwrap_or_else(Self::first)
    }

    pub fn number(&self) -> i64 {
        self.number
    }

    pub fn limit(&self) -> i64 {
        PAGE_SIZE
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1).saturating_mul(PAGE_SIZE)
    }
}

impl From<&PageQuery> for PageRequest {
    fn from(query: &PageQuery) -> Self {
        Self::parse(query.page.as_deref())
    }
}

/// One window of a listing plus the metadata a renderer needs for navigation
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: i64,
    pub per_page: i64,
    pub total_count: i64,
    pub num_pages: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_count: i64) -> Self {
        let num_pages = num_pages(total_count);
        Self {
            items,
            number: request.number(),
            per_page: PAGE_SIZE,
            total_count,
            num_pages,
            has_next: request.number() < num_pages,
            has_previous: request.number() > 1,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// An empty listing still has one (empty) page.
fn num_pages(total_count: i64) -> i64 {
    if total_count <= 0 {
        1
    } else {
        (total_count + PAGE_SIZE - 1) / PAGE_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_defaults_to_first_page() {
        assert_eq!(PageRequest::parse(None).number(), 1);
        assert_eq!(PageRequest::parse(Some("abc")).number(), 1);
        assert_eq!(PageRequest::parse(Some("0")).number(), 1);
        assert_eq!(PageRequest::parse(Some("-4")).number(), 1);
        assert_eq!(PageRequest::parse(Some(" 3 ")).number(), 3);
    }

    #[test]
    fn offsets_follow_page_size() {
        assert_eq!(PageRequest::new(1).offset(), 0);
        assert_eq!(PageRequest::new(2).offset(), 10);
        assert_eq!(PageRequest::new(5).limit(), 10);
    }

    #[test]
    fn thirteen_records_span_two_pages() {
        let first: Page<i32> = Page::new((0..10).collect(), PageRequest::new(1), 13);
        assert_eq!(first.num_pages, 2);
        assert!(first.has_next);
        assert!(!first.has_previous);

        let second: Page<i32> = Page::new((0..3).collect(), PageRequest::new(2), 13);
        assert_eq!(second.len(), 3);
        assert!(!second.has_next);
        assert!(second.has_previous);
    }

    #[test]
    fn empty_listing_has_one_page() {
        let page: Page<i32> = Page::new(Vec::new(), PageRequest::first(), 0);
        assert_eq!(page.num_pages, 1);
        assert!(page.is_empty());
        assert!(!page.has_next);
    }

    #[test]
    fn page_past_the_end_is_empty_not_an_error() {
        let page: Page<i32> = Page::new(Vec::new(), PageRequest::new(9), 13);
        assert!(page.is_empty());
        assert_eq!(page.number, 9);
        assert!(!page.has_next);
    }
}
