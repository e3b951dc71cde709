//! Page cursors, load-more accumulation and stale response detection.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use crate::models::Page;

/// Page size used when a caller does not choose one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// A `(page, page_size)` pair. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Build a request, clamping page and size to at least 1.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    /// First page with the given size.
    pub fn first(page_size: u32) -> Self {
        Self::new(1, page_size)
    }

    /// 1-based page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Requested number of results.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// The following page with the same size.
    pub fn next(&self) -> Self {
        Self::new(self.page.saturating_add(1), self.page_size)
    }

    /// The preceding page, or `None` on the first page.
    pub fn previous(&self) -> Option<Self> {
        (self.page > 1).then(|| Self::new(self.page - 1, self.page_size))
    }

    /// Result-count heuristic for endpoints whose continuation is not tracked:
    /// a full page may have a successor.
    pub fn likely_has_next(&self, returned: usize) -> bool {
        returned >= self.page_size as usize
    }
}

/// Accumulates pages for "load more" listings.
#[derive(Debug, Clone)]
pub struct Listing<T> {
    items: Vec<T>,
    request: PageRequest,
    has_more: bool,
    total: u64,
}

impl<T> Listing<T> {
    /// Empty listing that will start at the first page of `page_size`.
    pub fn new(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            request: PageRequest::first(page_size),
            has_more: true,
            total: 0,
        }
    }

    /// Replace the contents with a freshly loaded first page.
    pub fn reset_with(&mut self, page: Page<T>) {
        self.items.clear();
        self.request = PageRequest::first(self.request.page_size());
        self.absorb(page);
    }

    /// Append the page returned for [`Listing::next_request`].
    pub fn append(&mut self, page: Page<T>) {
        self.request = self.request.next();
        self.absorb(page);
    }

    fn absorb(&mut self, page: Page<T>) {
        self.has_more = page.has_next();
        self.total = page.count;
        self.items.extend(page.results);
    }

    /// Request for the page after the last loaded one, if upstream has more.
    pub fn next_request(&self) -> Option<PageRequest> {
        self.has_more.then(|| self.request.next())
    }

    /// Loaded items in upstream order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Whether upstream signalled a further page.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Page number of the last loaded page.
    pub fn page(&self) -> u32 {
        self.request.page()
    }

    /// Total match count reported upstream.
    pub fn total(&self) -> u64 {
        self.total
    }
}

/// Monotonic counter used to discard responses that arrive after a newer request.
#[derive(Debug, Clone, Default)]
pub struct RequestGeneration {
    current: Arc<AtomicU64>,
}

impl RequestGeneration {
    /// Fresh counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new request, invalidating every ticket handed out before.
    pub fn begin(&self) -> Ticket {
        let generation = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        Ticket {
            generation,
            current: Arc::clone(&self.current),
        }
    }

    /// Invalidate outstanding tickets without starting a request.
    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }
}

/// Handle carried alongside an in-flight request.
#[derive(Debug, Clone)]
pub struct Ticket {
    generation: u64,
    current: Arc<AtomicU64>,
}

impl Ticket {
    /// Whether no newer request has started since this ticket was issued.
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }

    /// Generation number of this ticket.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(ids: &[u64], next: bool) -> Page<u64> {
        Page {
            count: 45,
            next: next.then(|| "https://api.rawg.io/api/games?page=next".to_string()),
            previous: None,
            results: ids.to_vec(),
        }
    }

    #[test]
    fn page_request_clamps_and_steps() {
        let request = PageRequest::new(0, 0);
        assert_eq!(request.page(), 1);
        assert_eq!(request.page_size(), 1);
        assert_eq!(request.previous(), None);

        let request = PageRequest::new(2, 20);
        assert_eq!(request.next(), PageRequest::new(3, 20));
        assert_eq!(request.previous(), Some(PageRequest::new(1, 20)));
        assert_eq!(PageRequest::default(), PageRequest::new(1, DEFAULT_PAGE_SIZE));
    }

    #[test]
    fn full_page_heuristic() {
        let request = PageRequest::new(1, 20);
        assert!(request.likely_has_next(20));
        assert!(request.likely_has_next(21));
        assert!(!request.likely_has_next(19));
    }

    #[test]
    fn listing_accumulates_pages() {
        let mut listing = Listing::new(2);
        listing.reset_with(page(&[1, 2], true));
        assert_eq!(listing.items(), &[1, 2]);
        assert_eq!(listing.next_request(), Some(PageRequest::new(2, 2)));

        listing.append(page(&[3, 4], true));
        assert_eq!(listing.items(), &[1, 2, 3, 4]);
        assert_eq!(listing.page(), 2);
        assert_eq!(listing.total(), 45);

        listing.append(page(&[5], false));
        assert_eq!(listing.items(), &[1, 2, 3, 4, 5]);
        assert!(!listing.has_more());
        assert_eq!(listing.next_request(), None);

        listing.reset_with(page(&[9], true));
        assert_eq!(listing.items(), &[9]);
        assert_eq!(listing.page(), 1);
    }

    #[test]
    fn empty_page_stops_listing_even_with_token() {
        let mut listing = Listing::new(20);
        listing.reset_with(page(&[], true));
        assert!(!listing.has_more());
    }

    #[test]
    fn newer_ticket_supersedes_older() {
        let generation = RequestGeneration::new();
        let first = generation.begin();
        assert!(first.is_current());

        let second = generation.begin();
        assert!(!first.is_current());
        assert!(second.is_current());
        assert!(second.generation() > first.generation());

        generation.invalidate();
        assert!(!second.is_current());
    }
}
