//! Connection lifecycle state machine.
//!
//! Manages the single logical link to the server for an authenticated
//! session: open, linear-backoff reconnection on transient loss, and
//! teardown on logout. Uses the action pattern: [`Link::handle`] takes an
//! event and returns actions for the driver to execute (open a socket,
//! schedule a retry, close). This keeps the policy pure and makes the
//! reconnect behavior testable without timers.
//!
//! # State Machine
//!
//! ```text
//! ┌──────┐ ConnectRequested ┌────────────┐ SocketOpened ┌──────┐
//! │ Idle │─────────────────>│ Connecting │─────────────>│ Open │
//! └──────┘                  └────────────┘              └──────┘
//!     ↑                           ↑                        │
//!     │ DisconnectRequested       │ RetryElapsed           │ SocketClosed
//!     │ (from any state)          │                        ↓
//!     │                     ┌──────────────┐  ceiling  ┌────────┐
//!     └─────────────────────│ WaitingRetry │──────────>│ Failed │
//!                           └──────────────┘           └────────┘
//! ```
//!
//! # Invariants
//!
//! - At most one live socket: `ConnectRequested` while a socket exists
//!   (Connecting or Open) produces no actions.
//! - The attempt counter resets only on `SocketOpened`, never on the connect
//!   call itself.
//! - Once the token is cleared, no retry is ever scheduled, even if a close
//!   or an elapsed timer races the logout.

use std::time::Duration;

/// Reconnection ceiling. Tunable; the value is inherited policy, not a
/// load-bearing design decision.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Base retry delay. Attempt `n` waits `base * n` (linear, not exponential).
pub const DEFAULT_BASE_RETRY_DELAY: Duration = Duration::from_millis(2000);

/// Reconnection policy parameters.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Attempts after which reconnection is abandoned.
    pub max_attempts: u32,
    /// Base delay for the linear backoff.
    pub base_delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            base_delay: DEFAULT_BASE_RETRY_DELAY,
        }
    }
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No socket and nothing pending.
    Idle,
    /// Socket open requested, not yet confirmed.
    Connecting,
    /// Socket confirmed open.
    Open,
    /// Socket lost; a retry timer is pending.
    WaitingRetry,
    /// Retry ceiling reached; stays disconnected until an explicit connect.
    Failed,
}

/// Events fed into the link by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// Application requested a connection with this session token.
    ConnectRequested {
        /// Session credential attached to the socket URL.
        token: String,
    },
    /// The driver confirmed the socket is open.
    SocketOpened,
    /// The socket closed, failed to open, or failed to even construct.
    SocketClosed,
    /// A previously scheduled retry timer elapsed.
    RetryElapsed,
    /// Application requested disconnect (logout).
    DisconnectRequested,
}

/// Actions the driver executes on behalf of the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkAction {
    /// Open a socket with the token as a query credential.
    OpenSocket {
        /// Session token to attach.
        token: String,
    },
    /// Arm a retry timer; fire `RetryElapsed` when it lapses.
    ScheduleRetry {
        /// Time to wait before retrying.
        delay: Duration,
    },
    /// Close the current socket if one exists.
    CloseSocket,
}

/// The connection lifecycle policy.
///
/// Owns the session token and the reconnect-attempt counter. The driver owns
/// the actual socket and timers and reports their outcomes back as events.
#[derive(Debug, Clone)]
pub struct Link {
    state: LinkState,
    config: ReconnectConfig,
    token: Option<String>,
    attempts: u32,
}

impl Link {
    /// Create an idle link with the given policy.
    pub fn new(config: ReconnectConfig) -> Self {
        Self { state: LinkState::Idle, config, token: None, attempts: 0 }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// True iff the socket is confirmed open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == LinkState::Open
    }

    /// Reconnect attempts consumed since the last successful open.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Session token, if one is set.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Process an event and return the actions to execute.
    pub fn handle(&mut self, event: LinkEvent) -> Vec<LinkAction> {
        match event {
            LinkEvent::ConnectRequested { token } => self.handle_connect(token),
            LinkEvent::SocketOpened => {
                // An open confirmation is only meaningful while one is
                // pending; one racing a logout is ignored.
                if self.state == LinkState::Connecting {
                    self.attempts = 0;
                    self.state = LinkState::Open;
                }
                vec![]
            },
            LinkEvent::SocketClosed => self.schedule_retry(),
            LinkEvent::RetryElapsed => self.handle_retry_elapsed(),
            LinkEvent::DisconnectRequested => self.handle_disconnect(),
        }
    }

    fn handle_connect(&mut self, token: String) -> Vec<LinkAction> {
        // A socket already exists (open or being opened): single-socket
        // invariant makes this a no-op.
        if matches!(self.state, LinkState::Open | LinkState::Connecting) {
            return vec![];
        }

        self.token = Some(token.clone());
        self.state = LinkState::Connecting;
        vec![LinkAction::OpenSocket { token }]
    }

    fn schedule_retry(&mut self) -> Vec<LinkAction> {
        if self.token.is_none() {
            // Logout already tore the session down.
            self.state = LinkState::Idle;
            return vec![];
        }

        if self.attempts >= self.config.max_attempts {
            self.state = LinkState::Failed;
            return vec![];
        }

        self.attempts += 1;
        self.state = LinkState::WaitingRetry;
        let delay = self.config.base_delay * self.attempts;
        vec![LinkAction::ScheduleRetry { delay }]
    }

    fn handle_retry_elapsed(&mut self) -> Vec<LinkAction> {
        if self.state != LinkState::WaitingRetry {
            return vec![];
        }

        match self.token.clone() {
            Some(token) => {
                self.state = LinkState::Connecting;
                vec![LinkAction::OpenSocket { token }]
            },
            // Logout raced the pending retry.
            None => {
                self.state = LinkState::Idle;
                vec![]
            },
        }
    }

    fn handle_disconnect(&mut self) -> Vec<LinkAction> {
        self.token = None;
        // Forcing the counter to the ceiling suppresses any close event that
        // arrives after this point.
        self.attempts = self.config.max_attempts;

        let had_socket = matches!(self.state, LinkState::Open | LinkState::Connecting);
        self.state = LinkState::Idle;

        if had_socket { vec![LinkAction::CloseSocket] } else { vec![] }
    }
}

impl Default for Link {
    fn default() -> Self {
        Self::new(ReconnectConfig::default())
    }
}
