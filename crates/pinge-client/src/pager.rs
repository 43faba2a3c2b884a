//! Pagination adapter.
//!
//! Fetches one fixed-size page of history at a time and appends it to the
//! conversation's cache. The continuation token is nothing more than
//! `pages_fetched * page_size`, which is why the cache's newest-first page
//! layout is a hard contract. A short page means the history is exhausted.
//!
//! In-flight fetches are never cancelled: a fetch that loses its race (the
//! cache was cleared, or another page landed first) completes and its result
//! is discarded.

use std::sync::{Arc, Mutex};

use pinge_core::{CacheStore, ConversationId, Message};

use crate::rest::{ApiError, MessageApi};

/// Outcome of one [`MessagePager::fetch_next`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFetch {
    /// A page was appended to the cache.
    Fetched {
        /// Messages in the appended page.
        added: usize,
        /// Whether another page may exist.
        has_more: bool,
    },
    /// The cache already saw a short page; nothing left to fetch.
    Exhausted,
    /// The cache changed while the fetch was in flight; result discarded.
    Superseded,
}

/// Backward pager over a conversation's message history.
#[derive(Debug, Clone)]
pub struct MessagePager<A> {
    api: A,
    store: Arc<Mutex<CacheStore>>,
    page_size: usize,
}

impl<A: MessageApi> MessagePager<A> {
    /// Create a pager fetching through `api` into `store`.
    pub fn new(api: A, store: Arc<Mutex<CacheStore>>, page_size: usize) -> Self {
        Self { api, store, page_size }
    }

    /// Fetch the next page backward for a conversation and append it.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the fetch; the cache is untouched on
    /// failure and the same offset will be retried by the next call.
    pub async fn fetch_next(&self, conversation: &ConversationId) -> Result<PageFetch, ApiError> {
        let offset = {
            let mut store = self.lock_store();
            let cache = store.cache_mut(conversation.clone());
            if !cache.has_more() {
                return Ok(PageFetch::Exhausted);
            }
            cache.next_offset()
        };

        let page = self.fetch_page(conversation, offset).await?;

        let mut store = self.lock_store();
        let cache = store.cache_mut(conversation.clone());
        // Someone beat us here or the session was torn down: the offset we
        // fetched no longer lines up, so the result is stale.
        if cache.next_offset() != offset {
            return Ok(PageFetch::Superseded);
        }

        let added = page.len();
        cache.push_page(page);
        Ok(PageFetch::Fetched { added, has_more: cache.has_more() })
    }

    async fn fetch_page(
        &self,
        conversation: &ConversationId,
        offset: usize,
    ) -> Result<Vec<Message>, ApiError> {
        match conversation {
            ConversationId::Contact(contact_id) => {
                let records = self.api.direct_messages(contact_id, self.page_size, offset).await?;
                Ok(records.into_iter().map(Message::from).collect())
            },
            ConversationId::Group(group_id) => {
                let records = self.api.group_messages(group_id, self.page_size, offset).await?;
                Ok(records.into_iter().map(Message::from).collect())
            },
        }
    }

    fn lock_store(&self) -> std::sync::MutexGuard<'_, CacheStore> {
        self.store.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
