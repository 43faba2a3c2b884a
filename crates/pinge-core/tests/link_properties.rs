//! Property-based tests for the connection lifecycle policy.
//!
//! Feeds the link arbitrary event sequences and checks the reconnect
//! policy invariants hold on every path, not just the scripted ones.

use pinge_core::{
    Link, LinkAction, LinkEvent, LinkState, ReconnectConfig, DEFAULT_BASE_RETRY_DELAY,
    DEFAULT_MAX_RECONNECT_ATTEMPTS,
};
use proptest::prelude::*;

fn event_strategy() -> impl Strategy<Value = LinkEvent> {
    prop_oneof![
        2 => Just(LinkEvent::ConnectRequested { token: "tok".to_string() }),
        2 => Just(LinkEvent::SocketOpened),
        3 => Just(LinkEvent::SocketClosed),
        2 => Just(LinkEvent::RetryElapsed),
        1 => Just(LinkEvent::DisconnectRequested),
    ]
}

proptest! {
    /// Between two successful opens, at most `max_attempts` retries are
    /// scheduled, and every scheduled delay follows the linear formula.
    #[test]
    fn retries_are_linear_and_bounded(events in prop::collection::vec(event_strategy(), 0..60)) {
        let mut link = Link::new(ReconnectConfig::default());
        let mut retries_since_open = 0u32;

        for event in events {
            let was_open = matches!(event, LinkEvent::SocketOpened);
            let actions = link.handle(event);

            if was_open {
                retries_since_open = 0;
            }
            for action in &actions {
                if let LinkAction::ScheduleRetry { delay } = action {
                    retries_since_open += 1;
                    prop_assert!(retries_since_open <= DEFAULT_MAX_RECONNECT_ATTEMPTS);
                    prop_assert_eq!(*delay, DEFAULT_BASE_RETRY_DELAY * link.attempts());
                }
            }
        }
    }

    /// An open state always implies a token, and a cleared token never
    /// coexists with a socket-holding state.
    #[test]
    fn open_implies_token(events in prop::collection::vec(event_strategy(), 0..60)) {
        let mut link = Link::new(ReconnectConfig::default());
        for event in events {
            let _ = link.handle(event);
            if matches!(link.state(), LinkState::Open | LinkState::Connecting) {
                prop_assert!(link.token().is_some());
            }
        }
    }

    /// No event sequence produces two `OpenSocket` actions without a close
    /// (in whatever form) in between: the single-socket invariant.
    #[test]
    fn never_two_sockets(events in prop::collection::vec(event_strategy(), 0..60)) {
        let mut link = Link::new(ReconnectConfig::default());
        let mut socket_live = false;

        for event in events {
            let closes = matches!(
                event,
                LinkEvent::SocketClosed | LinkEvent::DisconnectRequested
            );
            let actions = link.handle(event);
            if closes {
                socket_live = false;
            }
            for action in &actions {
                if matches!(action, LinkAction::OpenSocket { .. }) {
                    prop_assert!(!socket_live);
                    socket_live = true;
                }
            }
        }
    }
}
