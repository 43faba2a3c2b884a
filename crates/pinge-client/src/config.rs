//! Client configuration.
//!
//! Everything tunable lives here and is injected by the caller; the library
//! reads no environment and keeps no globals. Defaults match the deployed
//! backend's development setup.

use std::time::Duration;

use pinge_core::{ReconnectConfig, DEFAULT_PAGE_SIZE};

/// Configuration for one client instance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket base URL; the token is attached as `/ws?token=...`.
    pub ws_url: String,
    /// REST API base URL.
    pub api_url: String,
    /// Reconnection policy for the realtime channel.
    pub reconnect: ReconnectConfig,
    /// Page size for paginated message fetches.
    pub page_size: usize,
    /// Bound on each REST request; a timeout surfaces exactly like a
    /// network error, with no retry at this layer.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://localhost:8000".to_string(),
            api_url: "http://localhost:8000/api".to_string(),
            reconnect: ReconnectConfig::default(),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: Duration::from_secs(10),
        }
    }
}
