//! Subscription registry.
//!
//! Routes inbound envelopes to handlers by event name. The registry lives
//! outside the socket, so subscriptions survive reconnects without any
//! resubscription. Dispatch snapshots the handler list before iterating, so
//! subscribing or unsubscribing from inside a handler is safe, and each
//! handler runs isolated: a panicking handler is logged and dropped without
//! breaking the chain or the connection.

use std::{
    collections::HashMap,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{Arc, Mutex, Weak},
};

use pinge_proto::{Envelope, EventName};

type Handler = Arc<dyn Fn(&Envelope) + Send + Sync>;

#[derive(Default)]
struct Inner {
    next_id: u64,
    handlers: HashMap<EventName, Vec<(u64, Handler)>>,
}

/// Event-name keyed pub/sub registry. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<Mutex<Inner>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an event name.
    ///
    /// Returns a [`Subscription`] guard; the handler receives every matching
    /// envelope until the guard is dropped or explicitly unsubscribed.
    /// Multiple independent subscribers to the same event are all invoked,
    /// in no guaranteed order.
    pub fn subscribe<F>(&self, event: EventName, handler: F) -> Subscription
    where
        F: Fn(&Envelope) + Send + Sync + 'static,
    {
        let id = {
            let mut inner = self.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.handlers.entry(event.clone()).or_default().push((id, Arc::new(handler)));
            id
        };
        Subscription { event, id, inner: Arc::downgrade(&self.inner) }
    }

    /// Dispatch an envelope to every handler subscribed to its event name.
    ///
    /// Unknown event names dispatch to nobody and are silently ignored.
    pub fn dispatch(&self, envelope: &Envelope) {
        // Snapshot under the lock, invoke outside it: handlers may
        // subscribe or unsubscribe while we iterate.
        let snapshot: Vec<Handler> = {
            let inner = self.lock();
            match inner.handlers.get(&envelope.event) {
                Some(entries) => entries.iter().map(|(_, h)| Arc::clone(h)).collect(),
                None => return,
            }
        };

        for handler in snapshot {
            if catch_unwind(AssertUnwindSafe(|| handler(envelope))).is_err() {
                tracing::warn!(event = %envelope.event, "subscriber panicked; continuing dispatch");
            }
        }
    }

    /// Number of live handlers for an event name.
    #[must_use]
    pub fn handler_count(&self, event: &EventName) -> usize {
        self.lock().handlers.get(event).map_or(0, Vec::len)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned registry lock only means a panic elsewhere; the map
        // itself is still coherent.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").finish_non_exhaustive()
    }
}

/// Guard for one registered handler.
///
/// Dropping it (or calling [`Subscription::unsubscribe`]) removes exactly
/// that handler; it then receives zero further events, reconnects included.
#[derive(Debug)]
pub struct Subscription {
    event: EventName,
    id: u64,
    inner: Weak<Mutex<Inner>>,
}

impl Subscription {
    /// Remove the handler now instead of at drop time.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Event name this subscription is registered under.
    #[must_use]
    pub fn event(&self) -> &EventName {
        &self.event
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(inner) = self.inner.upgrade() else { return };
        let mut inner = inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(entries) = inner.handlers.get_mut(&self.event) {
            entries.retain(|(id, _)| *id != self.id);
            if entries.is_empty() {
                inner.handlers.remove(&self.event);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn envelope(event: &str) -> Envelope {
        Envelope { event: EventName::from(event), data: serde_json::Value::Null }
    }

    #[test]
    fn all_subscribers_receive_the_event() {
        let registry = Registry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let subs: Vec<_> = (0..3)
            .map(|_| {
                let hits = Arc::clone(&hits);
                registry.subscribe(EventName::NewDirectMessage, move |_| {
                    hits.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        registry.dispatch(&envelope("new_direct_message"));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        drop(subs);
    }

    #[test]
    fn unsubscribed_handler_receives_nothing() {
        let registry = Registry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = Arc::clone(&hits);
        let sub = registry.subscribe(EventName::NewDirectMessage, move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        registry.dispatch(&envelope("new_direct_message"));
        sub.unsubscribe();
        registry.dispatch(&envelope("new_direct_message"));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(registry.handler_count(&EventName::NewDirectMessage), 0);
    }

    #[test]
    fn events_route_by_name_only() {
        let registry = Registry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = Arc::clone(&hits);
        let _sub = registry.subscribe(EventName::NewGroupMessage, move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        registry.dispatch(&envelope("new_direct_message"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        registry.dispatch(&envelope("new_group_message"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_events_are_silently_ignored() {
        let registry = Registry::new();
        registry.dispatch(&envelope("some_future_event"));
    }

    #[test]
    #[allow(clippy::panic)]
    fn panicking_handler_does_not_break_the_chain() {
        let registry = Registry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let _bad = registry.subscribe(EventName::NewDirectMessage, |_| {
            panic!("handler fault");
        });
        let hits_clone = Arc::clone(&hits);
        let _good = registry.subscribe(EventName::NewDirectMessage, move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        registry.dispatch(&envelope("new_direct_message"));
        // Subsequent frames still dispatch to everyone.
        registry.dispatch(&envelope("new_direct_message"));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unsubscribe_from_inside_a_handler_is_safe() {
        let registry = Registry::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let slot_clone = Arc::clone(&slot);
        let sub = registry.subscribe(EventName::NewDirectMessage, move |_| {
            // Triggers removal of this very handler mid-dispatch.
            *slot_clone.lock().unwrap() = None;
        });
        *slot.lock().unwrap() = Some(sub);

        registry.dispatch(&envelope("new_direct_message"));
        registry.dispatch(&envelope("new_direct_message"));
        assert_eq!(registry.handler_count(&EventName::NewDirectMessage), 0);
    }
}
