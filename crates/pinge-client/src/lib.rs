//! Async driver layer for the Pinge client.
//!
//! Executes the Sans-IO policy machines from [`pinge_core`] against real
//! I/O: a single tokio-tungstenite WebSocket driven by the connection
//! policy, a subscription registry that fans inbound envelopes out to
//! handlers, a reqwest REST adapter for history/sends/aggregates, and the
//! paginated fetch adapter patching pages into the cache store.
//!
//! # Components
//!
//! - [`Registry`]: event-name pub/sub with explicit [`Subscription`] guards
//! - [`WsManager`]: owns the one socket, reconnects per the core policy
//! - [`RestClient`]: typed REST calls behind the [`MessageApi`] seam
//! - [`MessagePager`]: backward pagination into a conversation's cache
//! - [`Session`]: wires everything to one authenticated session

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod manager;
mod pager;
mod registry;
mod rest;
mod session;

pub use config::ClientConfig;
pub use manager::WsManager;
pub use pager::{MessagePager, PageFetch};
pub use registry::{Registry, Subscription};
pub use rest::{ApiError, MessageApi, RestClient};
pub use session::Session;
