//! Normalized message and conversation identity.
//!
//! Messages arrive from two paths with slightly different shapes (push
//! payloads vs REST records); both normalize into [`Message`] before they
//! touch a cache, so the merge logic never cares where a message came from.

use pinge_proto::{DirectMessage, DirectMessagePush, GroupMessage, GroupMessagePush};

/// Identifies one conversation: a direct contact thread or a group thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConversationId {
    /// Direct thread with this contact.
    Contact(String),
    /// Group thread.
    Group(String),
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Contact(id) => write!(f, "contact:{id}"),
            Self::Group(id) => write!(f, "group:{id}"),
        }
    }
}

/// A message as the cache stores it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Server-assigned identifier; the idempotence key for merges.
    pub id: String,
    /// Sending user.
    pub sender_id: String,
    /// Sender's display name, when the source path carried one.
    pub sender_name: Option<String>,
    /// Message body.
    pub content: String,
    /// Server timestamp (RFC 3339).
    pub sent_at: String,
}

impl From<DirectMessagePush> for Message {
    fn from(push: DirectMessagePush) -> Self {
        Self {
            id: push.message_id,
            sender_id: push.sender_id,
            sender_name: Some(push.sender_name),
            content: push.content,
            sent_at: push.sent_at,
        }
    }
}

impl From<GroupMessagePush> for Message {
    fn from(push: GroupMessagePush) -> Self {
        Self {
            id: push.message_id,
            sender_id: push.sender_id,
            sender_name: Some(push.sender_name),
            content: push.content,
            sent_at: push.sent_at,
        }
    }
}

impl From<DirectMessage> for Message {
    fn from(record: DirectMessage) -> Self {
        Self {
            id: record.message_id,
            sender_id: record.sender_id,
            sender_name: None,
            content: record.content,
            sent_at: record.sent_at,
        }
    }
}

impl From<GroupMessage> for Message {
    fn from(record: GroupMessage) -> Self {
        Self {
            id: record.message_id,
            sender_id: record.sender_id,
            sender_name: Some(record.sender_name),
            content: record.content,
            sent_at: record.sent_at,
        }
    }
}
