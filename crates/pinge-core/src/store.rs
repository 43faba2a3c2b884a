//! Cache store and aggregate staleness.
//!
//! Routes typed push updates into the right conversation cache and tracks
//! which derived aggregates (unread counters, contact and group lists) are
//! stale. Aggregates are invalidated rather than incremented: read state can
//! change on another device, so only the server's counts are trusted and
//! consumers re-fetch on next read.
//!
//! Like the other machines in this crate, mutations return effects
//! describing what happened; the driver decides what to log or re-fetch.

use std::collections::{BTreeSet, HashMap};

use pinge_proto::{DirectMessagePush, GroupMessagePush};

use crate::{
    cache::{MergeOutcome, MessageCache},
    message::{ConversationId, Message},
};

/// Derived server-owned state a consumer must re-fetch once stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Aggregate {
    /// Unread totals and per-conversation breakdowns.
    UnreadCounts,
    /// Confirmed contact list.
    ContactList,
    /// Pending contact requests.
    ContactRequests,
    /// Group list and its indicators.
    GroupList,
}

/// A typed push update, decoded from an envelope by the client layer.
#[derive(Debug, Clone)]
pub enum PushUpdate {
    /// `new_direct_message`.
    Direct(DirectMessagePush),
    /// `new_group_message`.
    Group(GroupMessagePush),
    /// `new_contact_request`.
    ContactRequest,
    /// `contact_request_accepted`.
    ContactAccepted,
}

/// What a store mutation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEffect {
    /// A message entered the conversation cache as its new head.
    MessageMerged {
        /// Conversation that changed.
        conversation: ConversationId,
        /// Id of the merged message.
        message_id: String,
    },
    /// An already-cached message id arrived again and was dropped.
    DuplicateDropped {
        /// Conversation whose cache absorbed the duplicate.
        conversation: ConversationId,
        /// Id of the dropped copy.
        message_id: String,
    },
    /// An aggregate became stale and needs re-fetching before display.
    AggregateInvalidated(Aggregate),
}

/// All conversation caches plus aggregate staleness flags.
///
/// Destroyed (cleared) on logout.
#[derive(Debug)]
pub struct CacheStore {
    caches: HashMap<ConversationId, MessageCache>,
    stale: BTreeSet<Aggregate>,
    page_size: usize,
}

impl CacheStore {
    /// Create an empty store whose caches use the given page size.
    pub fn new(page_size: usize) -> Self {
        Self { caches: HashMap::new(), stale: BTreeSet::new(), page_size }
    }

    /// Cached history for a conversation, if any exists.
    #[must_use]
    pub fn cache(&self, conversation: &ConversationId) -> Option<&MessageCache> {
        self.caches.get(conversation)
    }

    /// Cache for a conversation, created empty on first touch.
    pub fn cache_mut(&mut self, conversation: ConversationId) -> &mut MessageCache {
        let page_size = self.page_size;
        self.caches.entry(conversation).or_insert_with(|| MessageCache::new(page_size))
    }

    /// Apply a push update: merge message events into the owning
    /// conversation's cache and invalidate the affected aggregates.
    pub fn apply_push(&mut self, update: PushUpdate) -> Vec<StoreEffect> {
        match update {
            PushUpdate::Direct(push) => {
                let conversation = ConversationId::Contact(push.sender_id.clone());
                let mut effects = self.merge(conversation, Message::from(push));
                // Unread counts go stale on every direct-message event, even
                // a duplicate: the server may have bumped its counter before
                // the redelivery.
                effects.extend(self.invalidate(Aggregate::UnreadCounts));
                effects
            },
            PushUpdate::Group(push) => {
                let conversation = ConversationId::Group(push.group_id.clone());
                let mut effects = self.merge(conversation, Message::from(push));
                effects.extend(self.invalidate(Aggregate::UnreadCounts));
                effects.extend(self.invalidate(Aggregate::GroupList));
                effects
            },
            PushUpdate::ContactRequest | PushUpdate::ContactAccepted => {
                let mut effects = self.invalidate(Aggregate::ContactRequests);
                effects.extend(self.invalidate(Aggregate::ContactList));
                effects
            },
        }
    }

    /// Send-path reconciliation: merge the REST response for a message this
    /// client just sent. Uses the identical merge, so the eventual live echo
    /// collapses into the same entry via the duplicate check.
    pub fn merge_sent(
        &mut self,
        conversation: ConversationId,
        message: Message,
    ) -> Vec<StoreEffect> {
        self.merge(conversation, message)
    }

    /// Append a fetched page to a conversation's cache.
    pub fn push_page(&mut self, conversation: ConversationId, page: Vec<Message>) {
        self.cache_mut(conversation).push_page(page);
    }

    /// Mark one aggregate stale.
    pub fn mark_stale(&mut self, aggregate: Aggregate) -> Vec<StoreEffect> {
        self.invalidate(aggregate)
    }

    /// True if the aggregate must be re-fetched before being trusted.
    #[must_use]
    pub fn is_stale(&self, aggregate: Aggregate) -> bool {
        self.stale.contains(&aggregate)
    }

    /// Clear one staleness flag (the consumer re-fetched it).
    pub fn clear_stale(&mut self, aggregate: Aggregate) {
        self.stale.remove(&aggregate);
    }

    /// Drain all stale aggregates, clearing their flags.
    pub fn take_stale(&mut self) -> Vec<Aggregate> {
        let drained: Vec<_> = self.stale.iter().copied().collect();
        self.stale.clear();
        drained
    }

    /// Drop all caches and staleness (logout).
    pub fn clear(&mut self) {
        self.caches.clear();
        self.stale.clear();
    }

    fn merge(&mut self, conversation: ConversationId, message: Message) -> Vec<StoreEffect> {
        let message_id = message.id.clone();
        match self.cache_mut(conversation.clone()).merge_live(message) {
            MergeOutcome::Merged => vec![StoreEffect::MessageMerged { conversation, message_id }],
            MergeOutcome::Duplicate => {
                vec![StoreEffect::DuplicateDropped { conversation, message_id }]
            },
        }
    }

    fn invalidate(&mut self, aggregate: Aggregate) -> Vec<StoreEffect> {
        self.stale.insert(aggregate);
        vec![StoreEffect::AggregateInvalidated(aggregate)]
    }
}
