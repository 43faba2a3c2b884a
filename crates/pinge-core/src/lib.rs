//! Core state machines for the Pinge client.
//!
//! Everything here is Sans-IO and action-based: state machines receive
//! events, mutate their own state, and return actions for a driver to
//! execute. No sockets, no timers, no HTTP. This keeps the policy logic
//! (reconnect backoff, cache reconciliation, staleness tracking) directly
//! testable without an async runtime.
//!
//! # Components
//!
//! - [`Link`]: connection lifecycle policy (single socket, linear-backoff
//!   reconnection, token ownership)
//! - [`MessageCache`]: one conversation's paginated, newest-first message
//!   history with idempotent live merge
//! - [`CacheStore`]: all conversation caches plus aggregate staleness flags

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod cache;
mod connection;
mod message;
mod store;

pub use cache::{MergeOutcome, MessageCache, DEFAULT_PAGE_SIZE};
pub use connection::{
    Link, LinkAction, LinkEvent, LinkState, ReconnectConfig, DEFAULT_BASE_RETRY_DELAY,
    DEFAULT_MAX_RECONNECT_ATTEMPTS,
};
pub use message::{ConversationId, Message};
pub use store::{Aggregate, CacheStore, PushUpdate, StoreEffect};
