//! REST record types.
//!
//! These mirror the backend's response schemas. The REST layer is consumed as
//! a fixed contract: paginated fetches return arrays ordered newest first,
//! send endpoints return the created record synchronously, and the unread
//! endpoint returns aggregate totals plus per-conversation breakdowns.

use serde::{Deserialize, Serialize};

/// A direct message as returned by the messages endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectMessage {
    /// Server-assigned identifier.
    pub message_id: String,
    /// Sending user.
    pub sender_id: String,
    /// Receiving user.
    pub receiver_id: String,
    /// Message body.
    pub content: String,
    /// Whether the receiver has read it.
    pub is_read: bool,
    /// Server timestamp (RFC 3339).
    pub sent_at: String,
}

/// A group message as returned by the group messages endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMessage {
    /// Server-assigned identifier.
    pub message_id: String,
    /// Group the message belongs to.
    pub group_id: String,
    /// Sending user.
    pub sender_id: String,
    /// Sender's display name.
    pub sender_name: String,
    /// Message body.
    pub content: String,
    /// Server timestamp (RFC 3339).
    pub sent_at: String,
}

/// Request body for sending a direct message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendDirectMessage {
    /// Receiving user.
    pub receiver_id: String,
    /// Message body.
    pub content: String,
}

/// Request body for sending a group message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendGroupMessage {
    /// Message body.
    pub content: String,
}

/// Unread breakdown for one contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactUnread {
    /// Contact's user id.
    pub contact_id: String,
    /// Contact's display name.
    pub contact_name: String,
    /// Unread messages from this contact.
    pub unread_count: u64,
    /// Timestamp of the newest message, if any.
    pub last_message_at: Option<String>,
}

/// Unread breakdown for one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupUnread {
    /// Group id.
    pub group_id: String,
    /// Group name.
    pub group_name: String,
    /// Unread messages in this group.
    pub unread_count: u64,
    /// Timestamp of the newest message, if any.
    pub last_message_at: Option<String>,
}

/// Aggregate unread state.
///
/// Only the server owns read state (the user may read on another device), so
/// the client treats this as something to re-fetch when stale, never to
/// increment locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadSummary {
    /// Total unread direct messages.
    pub total_unread: u64,
    /// Per-contact breakdown.
    pub contacts_with_unread: Vec<ContactUnread>,
    /// Per-group breakdown.
    pub groups_with_unread: Vec<GroupUnread>,
    /// Total unread group messages.
    pub total_group_unread: u64,
}

/// A confirmed contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Contact's user id.
    pub contact_id: String,
    /// Contact's display name.
    pub username: String,
    /// Contact's email address.
    pub email: String,
}

/// A pending contact request.
///
/// The backend identifies both parties by username/email here, not by user
/// id; accepting or rejecting goes through `request_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRequest {
    /// Request identifier.
    pub request_id: String,
    /// Requesting user's display name.
    pub sender_username: String,
    /// Requesting user's email address.
    pub sender_email: String,
    /// Receiving user's display name.
    pub receiver_username: String,
    /// Receiving user's email address.
    pub receiver_email: String,
    /// `Pending`, `Accepted` or `Rejected`.
    pub status: String,
    /// When the request was sent (RFC 3339).
    pub created_at: String,
}

/// A group this user belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    /// Group id.
    pub group_id: String,
    /// Group name.
    pub name: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// User id of the group's creator.
    pub created_by: String,
    /// When the group was created (RFC 3339).
    pub created_at: String,
}
