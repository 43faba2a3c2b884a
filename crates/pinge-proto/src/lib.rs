//! Wire format for the Pinge client.
//!
//! Two external contracts live here:
//!
//! - The realtime channel: every inbound WebSocket frame is a JSON
//!   [`Envelope`] of the form `{event, data}`. The event name selects the
//!   routing; `data` is decoded on demand by whoever subscribed. Outbound
//!   frames are [`ClientFrame`] (`{type, payload}`, fire-and-forget).
//! - The REST contract: record types for paginated message history, sends,
//!   unread summaries, contacts, and groups, matching the backend's
//!   snake_case JSON.
//!
//! # Invariants
//!
//! Each recognized event name maps to exactly one [`EventName`] variant;
//! unrecognized names are preserved verbatim in [`EventName::Unknown`] so the
//! protocol stays forward compatible with server additions. Decoding never
//! panics; malformed frames return [`ProtocolError`].

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod envelope;
mod error;
mod push;
mod records;

pub use envelope::{ClientFrame, Envelope, EventName};
pub use error::ProtocolError;
pub use push::{DirectMessagePush, GroupMessagePush};
pub use records::{
    Contact, ContactRequest, ContactUnread, DirectMessage, GroupMessage, GroupSummary,
    GroupUnread, SendDirectMessage, SendGroupMessage, UnreadSummary,
};
