//! Inbound event envelope and outbound client frames.
//!
//! The server pushes frames of the form `{"event": <name>, "data": <value>}`.
//! The envelope validates only that shape; `data` stays a raw JSON value and
//! is shaped defensively by individual subscribers. This keeps the dispatch
//! path independent of any one event's schema.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Recognized server event names, plus a catch-all for names this client
/// version does not know.
///
/// # Invariants
///
/// `EventName::from(name).as_str()` round-trips every recognized name, and
/// `Unknown` preserves unrecognized names byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventName {
    /// A direct message was delivered to this user.
    NewDirectMessage,
    /// A message was posted in a group this user belongs to.
    NewGroupMessage,
    /// Someone sent this user a contact request.
    NewContactRequest,
    /// A contact request this user sent was accepted.
    ContactRequestAccepted,
    /// Event name not recognized by this client version.
    Unknown(String),
}

impl EventName {
    /// Wire representation of this event name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::NewDirectMessage => "new_direct_message",
            Self::NewGroupMessage => "new_group_message",
            Self::NewContactRequest => "new_contact_request",
            Self::ContactRequestAccepted => "contact_request_accepted",
            Self::Unknown(name) => name,
        }
    }
}

impl From<&str> for EventName {
    fn from(name: &str) -> Self {
        match name {
            "new_direct_message" => Self::NewDirectMessage,
            "new_group_message" => Self::NewGroupMessage,
            "new_contact_request" => Self::NewContactRequest,
            "contact_request_accepted" => Self::ContactRequestAccepted,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from(name.as_str()))
    }
}

/// One inbound push frame: the event name that routes it plus its raw data.
///
/// Exists only transiently per frame; handlers that care about `data` decode
/// it into a typed payload themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Event name used for routing.
    pub event: EventName,
    /// Raw payload; schema is the subscriber's concern.
    pub data: serde_json::Value,
}

impl Envelope {
    /// Decode an envelope from one inbound text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Malformed`] if the frame is not JSON or does
    /// not carry the `{event, data}` shape.
    pub fn decode(raw: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Decode `data` into the payload type a subscriber expects.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidPayload`] if `data` does not match
    /// `T`'s schema.
    pub fn payload<T: serde::de::DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        serde_json::from_value(self.data.clone()).map_err(|e| ProtocolError::InvalidPayload {
            event: self.event.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Outbound client frame: `{"type": <name>, "payload": <value>}`.
///
/// Fire-and-forget; no response is awaited over the realtime channel, and
/// nothing is queued when the socket is closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientFrame {
    /// Message type understood by the server.
    #[serde(rename = "type")]
    pub kind: String,
    /// Arbitrary payload.
    pub payload: serde_json::Value,
}

impl ClientFrame {
    /// Build a frame from a type name and any serializable payload.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Encode`] if the payload cannot be serialized.
    pub fn new<T: Serialize>(kind: &str, payload: &T) -> Result<Self, ProtocolError> {
        let payload =
            serde_json::to_value(payload).map_err(|e| ProtocolError::Encode(e.to_string()))?;
        Ok(Self { kind: kind.to_string(), payload })
    }

    /// Serialize to the wire string.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Encode`] on serialization failure.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Encode(e.to_string()))
    }
}
