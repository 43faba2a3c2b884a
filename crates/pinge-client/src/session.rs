//! Authenticated session wiring.
//!
//! A [`Session`] owns one realtime connection, one REST client and one
//! [`CacheStore`], and installs the standing subscriptions that keep the
//! store reconciled with pushed events. Everything is built from a single
//! [`ClientConfig`]; dropping the session tears the connection down via the
//! subscription guards and the manager's own drop path.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pinge_core::{Aggregate, CacheStore, ConversationId, Message, PushUpdate, StoreEffect};
use pinge_proto::{
    Contact, ContactRequest, DirectMessagePush, EventName, GroupMessagePush, GroupSummary,
    SendDirectMessage, SendGroupMessage, UnreadSummary,
};

use crate::{
    config::ClientConfig,
    manager::WsManager,
    pager::{MessagePager, PageFetch},
    registry::{Registry, Subscription},
    rest::{ApiError, RestClient},
};

/// One authenticated client session.
///
/// Holds the realtime manager, the REST client, the shared cache store and
/// the standing subscriptions that reconcile pushed events into the store.
pub struct Session {
    manager: WsManager,
    rest: RestClient,
    pager: MessagePager<RestClient>,
    store: Arc<Mutex<CacheStore>>,
    token: String,
    _reconcilers: Vec<Subscription>,
}

impl Session {
    /// Build a session for the given token.
    ///
    /// The realtime connection is not opened until [`Session::connect`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Setup`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, token: &str) -> Result<Self, ApiError> {
        let registry = Registry::new();
        let store = Arc::new(Mutex::new(CacheStore::new(config.page_size)));
        let rest = RestClient::new(&config.api_url, token, config.request_timeout)?;
        let pager = MessagePager::new(rest.clone(), Arc::clone(&store), config.page_size);
        let reconcilers = install_reconcilers(&registry, &store);
        let manager = WsManager::new(&config.ws_url, config.reconnect.clone(), registry);
        Ok(Self {
            manager,
            rest,
            pager,
            store,
            token: token.to_string(),
            _reconcilers: reconcilers,
        })
    }

    /// Open the realtime connection (no-op if already open or opening).
    pub fn connect(&self) {
        self.manager.connect(&self.token);
    }

    /// Close the realtime connection and destroy all cached state.
    ///
    /// Logout path: no retry is scheduled and the caches are emptied so the
    /// next session starts cold.
    pub fn shutdown(&self) {
        self.manager.disconnect();
        self.lock_store().clear();
    }

    /// Whether the realtime connection is currently open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.manager.is_connected()
    }

    /// Subscribe to pushed events by name.
    ///
    /// Subscriptions survive reconnects; they are tied to the registry, not
    /// to any one socket.
    pub fn subscribe<F>(&self, event: EventName, handler: F) -> Subscription
    where
        F: Fn(&pinge_proto::Envelope) + Send + Sync + 'static,
    {
        self.manager.registry().subscribe(event, handler)
    }

    /// Send a client frame over the realtime connection.
    ///
    /// Dropped with a warning when the connection is not open.
    pub async fn send<T: serde::Serialize>(&self, kind: &str, payload: &T) {
        self.manager.send(kind, payload).await;
    }

    // Send path

    /// Send a direct message and merge the confirmed record into the cache.
    ///
    /// The merged entry is keyed by the server-assigned id, so the live echo
    /// of this message collapses into it as a duplicate.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`]; nothing is cached on failure.
    pub async fn send_direct(
        &self,
        receiver_id: &str,
        content: &str,
    ) -> Result<Message, ApiError> {
        let record = self
            .rest
            .send_direct(&SendDirectMessage {
                receiver_id: receiver_id.to_string(),
                content: content.to_string(),
            })
            .await?;
        let message = Message::from(record);
        let effects = self
            .lock_store()
            .merge_sent(ConversationId::Contact(receiver_id.to_string()), message.clone());
        log_effects(&effects);
        Ok(message)
    }

    /// Send a group message and merge the confirmed record into the cache.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`]; nothing is cached on failure.
    pub async fn send_group(&self, group_id: &str, content: &str) -> Result<Message, ApiError> {
        let record = self
            .rest
            .send_group(group_id, &SendGroupMessage { content: content.to_string() })
            .await?;
        let message = Message::from(record);
        let effects = self
            .lock_store()
            .merge_sent(ConversationId::Group(group_id.to_string()), message.clone());
        log_effects(&effects);
        Ok(message)
    }

    // History

    /// Fetch the next page of older history for a conversation.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`] from the fetch.
    pub async fn fetch_older(&self, conversation: &ConversationId) -> Result<PageFetch, ApiError> {
        self.pager.fetch_next(conversation).await
    }

    /// Cached newest-first history for a conversation, flattened.
    #[must_use]
    pub fn history(&self, conversation: &ConversationId) -> Vec<Message> {
        self.lock_store()
            .cache(conversation)
            .map(|cache| cache.iter_newest_first().cloned().collect())
            .unwrap_or_default()
    }

    // Aggregates: re-fetched from the server when stale, never incremented
    // locally.

    /// Fetch unread counts from the server and clear their staleness.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`]; the stale flag is kept on failure.
    pub async fn refresh_unread(&self) -> Result<UnreadSummary, ApiError> {
        let summary = self.rest.unread_summary().await?;
        self.lock_store().clear_stale(Aggregate::UnreadCounts);
        Ok(summary)
    }

    /// Fetch the confirmed contact list and clear its staleness.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`]; the stale flag is kept on failure.
    pub async fn refresh_contacts(&self) -> Result<Vec<Contact>, ApiError> {
        let contacts = self.rest.contacts().await?;
        self.lock_store().clear_stale(Aggregate::ContactList);
        Ok(contacts)
    }

    /// Fetch pending contact requests and clear their staleness.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`]; the stale flag is kept on failure.
    pub async fn refresh_contact_requests(&self) -> Result<Vec<ContactRequest>, ApiError> {
        let requests = self.rest.contact_requests().await?;
        self.lock_store().clear_stale(Aggregate::ContactRequests);
        Ok(requests)
    }

    /// Fetch the group list and clear its staleness.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`]; the stale flag is kept on failure.
    pub async fn refresh_groups(&self) -> Result<Vec<GroupSummary>, ApiError> {
        let groups = self.rest.groups().await?;
        self.lock_store().clear_stale(Aggregate::GroupList);
        Ok(groups)
    }

    /// Whether an aggregate needs re-fetching before display.
    #[must_use]
    pub fn is_stale(&self, aggregate: Aggregate) -> bool {
        self.lock_store().is_stale(aggregate)
    }

    // Read state

    /// Mark a direct conversation read and invalidate unread counts.
    ///
    /// Read state exists per direct conversation only; group unread goes
    /// through the aggregate summary.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`]; nothing is invalidated on failure.
    pub async fn mark_contact_read(&self, contact_id: &str) -> Result<(), ApiError> {
        self.rest.mark_contact_read(contact_id).await?;
        self.lock_store().mark_stale(Aggregate::UnreadCounts);
        Ok(())
    }

    // Contact requests

    /// Accept a pending contact request and invalidate the affected lists.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`]; nothing is invalidated on failure.
    pub async fn accept_request(&self, request_id: &str) -> Result<(), ApiError> {
        self.rest.accept_request(request_id).await?;
        let mut store = self.lock_store();
        store.mark_stale(Aggregate::ContactRequests);
        store.mark_stale(Aggregate::ContactList);
        Ok(())
    }

    /// Reject a pending contact request and invalidate the request list.
    ///
    /// # Errors
    ///
    /// Propagates [`ApiError`]; nothing is invalidated on failure.
    pub async fn reject_request(&self, request_id: &str) -> Result<(), ApiError> {
        self.rest.reject_request(request_id).await?;
        self.lock_store().mark_stale(Aggregate::ContactRequests);
        Ok(())
    }

    /// Shared cache store, for direct inspection.
    #[must_use]
    pub fn store(&self) -> &Arc<Mutex<CacheStore>> {
        &self.store
    }

    fn lock_store(&self) -> MutexGuard<'_, CacheStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("connected", &self.is_connected()).finish_non_exhaustive()
    }
}

/// Install the standing subscriptions that reconcile pushed events into the
/// store. The guards keep the handlers alive for the session's lifetime.
fn install_reconcilers(
    registry: &Registry,
    store: &Arc<Mutex<CacheStore>>,
) -> Vec<Subscription> {
    let direct = {
        let store = Arc::clone(store);
        registry.subscribe(EventName::NewDirectMessage, move |envelope| {
            match envelope.payload::<DirectMessagePush>() {
                Ok(push) => apply(&store, PushUpdate::Direct(push)),
                Err(error) => {
                    tracing::warn!(%error, "dropping malformed direct message payload");
                },
            }
        })
    };
    let group = {
        let store = Arc::clone(store);
        registry.subscribe(EventName::NewGroupMessage, move |envelope| {
            match envelope.payload::<GroupMessagePush>() {
                Ok(push) => apply(&store, PushUpdate::Group(push)),
                Err(error) => {
                    tracing::warn!(%error, "dropping malformed group message payload");
                },
            }
        })
    };
    let requested = {
        let store = Arc::clone(store);
        registry.subscribe(EventName::NewContactRequest, move |_| {
            apply(&store, PushUpdate::ContactRequest);
        })
    };
    let accepted = {
        let store = Arc::clone(store);
        registry.subscribe(EventName::ContactRequestAccepted, move |_| {
            apply(&store, PushUpdate::ContactAccepted);
        })
    };
    vec![direct, group, requested, accepted]
}

fn apply(store: &Arc<Mutex<CacheStore>>, update: PushUpdate) {
    let effects = store.lock().unwrap_or_else(PoisonError::into_inner).apply_push(update);
    log_effects(&effects);
}

fn log_effects(effects: &[StoreEffect]) {
    for effect in effects {
        match effect {
            StoreEffect::MessageMerged { conversation, message_id } => {
                tracing::debug!(%conversation, %message_id, "message merged");
            },
            StoreEffect::DuplicateDropped { conversation, message_id } => {
                tracing::debug!(%conversation, %message_id, "duplicate message dropped");
            },
            StoreEffect::AggregateInvalidated(aggregate) => {
                tracing::debug!(?aggregate, "aggregate invalidated");
            },
        }
    }
}
