//! Typed views of push event payloads.
//!
//! Subscribers decode these from [`crate::Envelope::payload`]. Contact
//! request events carry no fields the client reads (they only trigger
//! invalidation), so they have no typed view here.

use serde::{Deserialize, Serialize};

/// Payload of a `new_direct_message` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectMessagePush {
    /// Server-assigned message identifier.
    pub message_id: String,
    /// Sender's user id; also identifies the conversation for the receiver.
    pub sender_id: String,
    /// Sender's display name.
    pub sender_name: String,
    /// Message body.
    pub content: String,
    /// Server timestamp (RFC 3339).
    pub sent_at: String,
    /// Server's unread total at delivery time. Advisory only: the client
    /// re-fetches the summary instead of trusting a point-in-time count.
    #[serde(default)]
    pub total_unread: Option<u64>,
}

/// Payload of a `new_group_message` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMessagePush {
    /// Server-assigned message identifier.
    pub message_id: String,
    /// Group the message was posted in.
    pub group_id: String,
    /// Sender's user id.
    pub sender_id: String,
    /// Sender's display name.
    pub sender_name: String,
    /// Message body.
    pub content: String,
    /// Server timestamp (RFC 3339).
    pub sent_at: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::Envelope;

    #[test]
    fn direct_push_decodes_from_envelope() {
        let raw = r#"{
            "event": "new_direct_message",
            "data": {
                "message_id": "m1",
                "sender_id": "u2",
                "sender_name": "ada",
                "content": "hi",
                "sent_at": "2026-08-28T10:00:00Z",
                "total_unread": 3
            }
        }"#;
        let push: DirectMessagePush = Envelope::decode(raw).unwrap().payload().unwrap();
        assert_eq!(push.message_id, "m1");
        assert_eq!(push.total_unread, Some(3));
    }

    #[test]
    fn direct_push_tolerates_missing_unread() {
        let raw = r#"{
            "message_id": "m1",
            "sender_id": "u2",
            "sender_name": "ada",
            "content": "hi",
            "sent_at": "2026-08-28T10:00:00Z"
        }"#;
        let push: DirectMessagePush = serde_json::from_str(raw).unwrap();
        assert_eq!(push.total_unread, None);
    }

    #[test]
    fn group_push_rejects_wrong_shape() {
        let envelope = Envelope::decode(r#"{"event":"new_group_message","data":{"bogus":1}}"#)
            .unwrap();
        assert!(envelope.payload::<GroupMessagePush>().is_err());
    }
}
