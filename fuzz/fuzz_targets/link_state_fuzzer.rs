//! Fuzz target for the Link connection state machine
//!
//! Drives the connection policy with arbitrary event sequences, tracking
//! what a driver would do with the returned actions.
//!
//! # Invariants
//!
//! - At most one live socket: an `OpenSocket` action never arrives while a
//!   previous one is still unresolved
//! - Retry delays are linear in the attempt number and the attempt counter
//!   never exceeds the ceiling
//! - After a disconnect, nothing is scheduled until the next connect

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pinge_core::{Link, LinkAction, LinkEvent, ReconnectConfig};

#[derive(Debug, Clone, Arbitrary)]
enum LinkOp {
    Connect { token_tag: u8 },
    SocketOpened,
    SocketClosed,
    RetryElapsed,
    Disconnect,
}

fuzz_target!(|ops: Vec<LinkOp>| {
    let config = ReconnectConfig::default();
    let base = config.base_delay;
    let max_attempts = config.max_attempts;
    let mut link = Link::new(config);

    // True between an OpenSocket action and the close/open event resolving it.
    let mut socket_live = false;
    let mut logged_out = true;

    for op in ops {
        let event = match op {
            LinkOp::Connect { token_tag } => {
                logged_out = false;
                LinkEvent::ConnectRequested { token: format!("tkn-{token_tag}") }
            }
            LinkOp::SocketOpened => {
                if !socket_live {
                    continue;
                }
                LinkEvent::SocketOpened
            }
            LinkOp::SocketClosed => {
                if !socket_live {
                    continue;
                }
                socket_live = false;
                LinkEvent::SocketClosed
            }
            LinkOp::RetryElapsed => LinkEvent::RetryElapsed,
            LinkOp::Disconnect => {
                logged_out = true;
                LinkEvent::DisconnectRequested
            }
        };

        let actions = link.handle(event);
        assert!(link.attempts() <= max_attempts);

        for action in actions {
            match action {
                LinkAction::OpenSocket { token } => {
                    if socket_live {
                        panic!("second OpenSocket while a socket is live");
                    }
                    assert!(!token.is_empty());
                    socket_live = true;
                }
                LinkAction::ScheduleRetry { delay } => {
                    if logged_out {
                        panic!("retry scheduled after disconnect");
                    }
                    let attempt = link.attempts();
                    assert!(attempt >= 1);
                    assert_eq!(delay, base * attempt);
                }
                LinkAction::CloseSocket => {
                    socket_live = false;
                }
            }
        }
    }
});
