//! Per-conversation message cache.
//!
//! Stores pages exactly as the paginated REST contract returns them: page 0
//! is newest, pages append at the tail as the user scrolls back, and the
//! flattened sequence reads newest first. Live events prepend to the head of
//! the first page and never rewrite fetched pages.
//!
//! # Invariants
//!
//! - No two entries share a message id across the flattened sequence.
//! - The first page's head is the most recently known message.
//! - `next_offset` is computed from the page count (`pages * page_size`), so
//!   the newest-first storage contract must hold exactly.

use crate::message::Message;

/// Fixed page size of the paginated message fetch.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Result of a live merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Message was new and is now the head of the first page.
    Merged,
    /// Message id was already cached; the incoming copy was dropped.
    ///
    /// Covers both at-least-once redelivery and the live echo of a message
    /// this client sent and already merged from the REST response.
    Duplicate,
}

/// One conversation's cached history: an ordered sequence of pages, newest
/// first overall.
#[derive(Debug, Clone)]
pub struct MessageCache {
    pages: Vec<Vec<Message>>,
    page_size: usize,
}

impl MessageCache {
    /// Create an empty cache with the given page size.
    pub fn new(page_size: usize) -> Self {
        Self { pages: Vec::new(), page_size }
    }

    /// Number of pages currently held (fetched pages plus a live-seeded one).
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total cached messages across all pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.iter().map(Vec::len).sum()
    }

    /// True if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Offset for the next backward fetch: `pages * page_size`.
    #[must_use]
    pub fn next_offset(&self) -> usize {
        self.pages.len() * self.page_size
    }

    /// True if another page may exist: the last page came back full.
    ///
    /// An empty cache reports `true` (nothing fetched yet); a short last
    /// page signals exhaustion.
    #[must_use]
    pub fn has_more(&self) -> bool {
        match self.pages.last() {
            None => true,
            Some(page) => page.len() >= self.page_size,
        }
    }

    /// True if this message id is anywhere in the flattened sequence.
    #[must_use]
    pub fn contains(&self, message_id: &str) -> bool {
        self.iter_newest_first().any(|m| m.id == message_id)
    }

    /// Merge a live-arrived message.
    ///
    /// Seeds a single page when the cache is empty, drops duplicates by id,
    /// and otherwise prepends to the head of the first page so the
    /// newest-first invariant holds without touching other pages.
    pub fn merge_live(&mut self, message: Message) -> MergeOutcome {
        if self.pages.is_empty() {
            self.pages.push(vec![message]);
            return MergeOutcome::Merged;
        }

        if self.contains(&message.id) {
            return MergeOutcome::Duplicate;
        }

        self.pages[0].insert(0, message);
        MergeOutcome::Merged
    }

    /// Append a fetched page at the tail.
    ///
    /// The REST layer is the sole source of truth for historical pages; the
    /// live path only ever prepends to the head of the first page.
    pub fn push_page(&mut self, page: Vec<Message>) {
        self.pages.push(page);
    }

    /// Flattened view, newest first.
    pub fn iter_newest_first(&self) -> impl Iterator<Item = &Message> {
        self.pages.iter().flatten()
    }

    /// Newest message, if any.
    #[must_use]
    pub fn head(&self) -> Option<&Message> {
        self.iter_newest_first().next()
    }
}
