//! Protocol error types.
//!
//! Malformed frames are a local concern: the connection layer logs and drops
//! them without surfacing anything to subscribers, so these errors never
//! cross the subscription boundary.

use thiserror::Error;

/// Errors produced while decoding or encoding wire data.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Inbound frame was not valid JSON or lacked the `{event, data}` shape.
    #[error("malformed frame: {reason}")]
    Malformed {
        /// Parser diagnostic.
        reason: String,
    },

    /// Event payload did not match the schema the handler expected.
    #[error("invalid payload for {event}: {reason}")]
    InvalidPayload {
        /// Event name the payload arrived under.
        event: String,
        /// Decoder diagnostic.
        reason: String,
    },

    /// Outbound frame could not be serialized.
    #[error("encode failed: {0}")]
    Encode(String),
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed { reason: err.to_string() }
    }
}
