//! Pagination flow against an in-memory message API.

#![allow(clippy::unwrap_used)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use pinge_client::{ApiError, MessageApi, MessagePager, PageFetch};
use pinge_core::{CacheStore, ConversationId, Message, DEFAULT_PAGE_SIZE};
use pinge_proto::{DirectMessage, GroupMessage};

/// Serves a fixed-length history, newest first, and counts calls.
struct FakeApi {
    total: usize,
    calls: AtomicUsize,
    /// Runs while a fetch is in flight, before it returns.
    during_fetch: Option<Box<dyn Fn() + Send + Sync>>,
}

impl FakeApi {
    fn with_total(total: usize) -> Self {
        Self { total, calls: AtomicUsize::new(0), during_fetch: None }
    }

    fn slice(&self, limit: usize, offset: usize) -> Vec<(String, String)> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = &self.during_fetch {
            hook();
        }
        (offset..self.total.min(offset + limit))
            .map(|i| (format!("m{i}"), format!("body {i}")))
            .collect()
    }
}

/// Cloneable handle so a test can keep the fake and give the pager a copy.
#[derive(Clone)]
struct SharedApi(Arc<FakeApi>);

impl MessageApi for SharedApi {
    async fn direct_messages(
        &self,
        _contact_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<DirectMessage>, ApiError> {
        Ok(self
            .0
            .slice(limit, offset)
            .into_iter()
            .map(|(id, content)| DirectMessage {
                message_id: id,
                sender_id: "peer".to_string(),
                receiver_id: "me".to_string(),
                content,
                is_read: true,
                sent_at: "2026-08-28T10:00:00Z".to_string(),
            })
            .collect())
    }

    async fn group_messages(
        &self,
        group_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<GroupMessage>, ApiError> {
        Ok(self
            .0
            .slice(limit, offset)
            .into_iter()
            .map(|(id, content)| GroupMessage {
                message_id: id,
                group_id: group_id.to_string(),
                sender_id: "peer".to_string(),
                sender_name: "Peer".to_string(),
                content,
                sent_at: "2026-08-28T10:00:00Z".to_string(),
            })
            .collect())
    }
}

fn store() -> Arc<Mutex<CacheStore>> {
    Arc::new(Mutex::new(CacheStore::new(DEFAULT_PAGE_SIZE)))
}

fn contact() -> ConversationId {
    ConversationId::Contact("peer".to_string())
}

#[tokio::test]
async fn full_page_advances_offset_and_reports_more() {
    let api = Arc::new(FakeApi::with_total(120));
    let store = store();
    let pager =
        MessagePager::new(SharedApi(Arc::clone(&api)), Arc::clone(&store), DEFAULT_PAGE_SIZE);

    let first = pager.fetch_next(&contact()).await.unwrap();
    assert_eq!(first, PageFetch::Fetched { added: 50, has_more: true });

    let second = pager.fetch_next(&contact()).await.unwrap();
    assert_eq!(second, PageFetch::Fetched { added: 50, has_more: true });

    let guard = store.lock().unwrap();
    let cache = guard.cache(&contact()).unwrap();
    assert_eq!(cache.len(), 100);
    assert_eq!(cache.next_offset(), 100);
    // Second call fetched offset 50, not a repeat of 0.
    assert_eq!(cache.iter_newest_first().nth(50).unwrap().id, "m50");
}

#[tokio::test]
async fn short_page_exhausts_pagination() {
    let api = Arc::new(FakeApi::with_total(12));
    let store = store();
    let pager =
        MessagePager::new(SharedApi(Arc::clone(&api)), Arc::clone(&store), DEFAULT_PAGE_SIZE);

    let first = pager.fetch_next(&contact()).await.unwrap();
    assert_eq!(first, PageFetch::Fetched { added: 12, has_more: false });

    // Exhausted without touching the network again.
    let second = pager.fetch_next(&contact()).await.unwrap();
    assert_eq!(second, PageFetch::Exhausted);
    assert_eq!(api.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn exact_boundary_needs_one_empty_page() {
    let api = Arc::new(FakeApi::with_total(50));
    let store = store();
    let pager =
        MessagePager::new(SharedApi(Arc::clone(&api)), Arc::clone(&store), DEFAULT_PAGE_SIZE);

    let first = pager.fetch_next(&contact()).await.unwrap();
    assert_eq!(first, PageFetch::Fetched { added: 50, has_more: true });

    // The full first page cannot prove exhaustion; the empty follow-up does.
    let second = pager.fetch_next(&contact()).await.unwrap();
    assert_eq!(second, PageFetch::Fetched { added: 0, has_more: false });
    assert_eq!(pager.fetch_next(&contact()).await.unwrap(), PageFetch::Exhausted);
}

#[tokio::test]
async fn group_pages_route_to_group_endpoint() {
    let api = Arc::new(FakeApi::with_total(3));
    let store = store();
    let pager =
        MessagePager::new(SharedApi(Arc::clone(&api)), Arc::clone(&store), DEFAULT_PAGE_SIZE);
    let group = ConversationId::Group("team".to_string());

    let fetch = pager.fetch_next(&group).await.unwrap();
    assert_eq!(fetch, PageFetch::Fetched { added: 3, has_more: false });

    let guard = store.lock().unwrap();
    let cache = guard.cache(&group).unwrap();
    assert_eq!(cache.head().unwrap().sender_name.as_deref(), Some("Peer"));
}

#[tokio::test]
async fn fetch_racing_a_cache_change_is_discarded() {
    let store = store();
    let mut api = FakeApi::with_total(120);
    // Another page lands while the fetch is in flight, moving the offset.
    api.during_fetch = Some({
        let store = Arc::clone(&store);
        Box::new(move || {
            store.lock().unwrap().push_page(
                ConversationId::Contact("peer".to_string()),
                vec![Message {
                    id: "interloper".to_string(),
                    sender_id: "peer".to_string(),
                    sender_name: None,
                    content: "raced".to_string(),
                    sent_at: "2026-08-28T10:00:00Z".to_string(),
                }],
            );
        })
    });
    let pager =
        MessagePager::new(SharedApi(Arc::new(api)), Arc::clone(&store), DEFAULT_PAGE_SIZE);

    assert_eq!(pager.fetch_next(&contact()).await.unwrap(), PageFetch::Superseded);
    // Only the racing page is in the cache; the stale result was dropped.
    let guard = store.lock().unwrap();
    assert_eq!(guard.cache(&contact()).unwrap().len(), 1);
}
