//! WebSocket connection manager.
//!
//! Thin driver around the [`pinge_core::Link`] policy machine: the machine
//! decides, the manager executes. Opening sockets, arming retry timers, and
//! closing are the three actions the policy can request; everything the
//! socket reports (opened, closed, failed to construct) is fed back as an
//! event. Inbound text frames decode into envelopes and fan out through the
//! shared [`Registry`]; malformed frames are logged and dropped without
//! reaching subscribers or disturbing the connection.
//!
//! Outbound traffic is fire-and-forget: [`WsManager::send`] drops the frame
//! with a warning when the socket is not open. Nothing is queued and nothing
//! is replayed after a reconnect.

use std::sync::{Arc, Mutex as StdMutex};

use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use pinge_core::{Link, LinkAction, LinkEvent, ReconnectConfig};
use pinge_proto::{ClientFrame, Envelope};
use tokio::net::TcpStream;
use tokio::sync::Mutex as AsyncMutex;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message as WsMessage, MaybeTlsStream, WebSocketStream,
};

use crate::registry::Registry;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;

struct Inner {
    ws_url: String,
    registry: Registry,
    link: StdMutex<Link>,
    sink: AsyncMutex<Option<WsSink>>,
    reader: StdMutex<Option<tokio::task::AbortHandle>>,
}

/// Owns the single WebSocket connection for a session.
///
/// Explicitly constructed and explicitly owned; pass it (or clones of it) to
/// whatever needs the realtime channel. Clones share the same connection.
#[derive(Clone)]
pub struct WsManager {
    inner: Arc<Inner>,
}

impl WsManager {
    /// Create a manager for the given endpoint. No socket is opened until
    /// [`WsManager::connect`] is called.
    pub fn new(ws_url: &str, reconnect: ReconnectConfig, registry: Registry) -> Self {
        Self {
            inner: Arc::new(Inner {
                ws_url: ws_url.trim_end_matches('/').to_string(),
                registry,
                link: StdMutex::new(Link::new(reconnect)),
                sink: AsyncMutex::new(None),
                reader: StdMutex::new(None),
            }),
        }
    }

    /// Connect with the given session token.
    ///
    /// No-op if the socket is already open or opening. Must be called from
    /// within a tokio runtime; the socket runs on a spawned task.
    pub fn connect(&self, token: &str) {
        apply(&self.inner, LinkEvent::ConnectRequested { token: token.to_string() });
    }

    /// Disconnect and clear the session token. Idempotent; suppresses any
    /// pending reconnect.
    pub fn disconnect(&self) {
        apply(&self.inner, LinkEvent::DisconnectRequested);
    }

    /// True iff the socket is confirmed open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        lock_link(&self.inner).is_open()
    }

    /// Registry this manager dispatches through.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Send a `{type, payload}` frame if the socket is open.
    ///
    /// Dropped with a warning otherwise: the realtime channel makes no
    /// client-to-server delivery promises.
    pub async fn send<T: serde::Serialize>(&self, kind: &str, payload: &T) {
        // The policy state is authoritative: a sink can briefly outlive a
        // disconnect that raced the open, and must not be written to.
        if !self.is_connected() {
            tracing::warn!(%kind, "cannot send, not connected; frame dropped");
            return;
        }

        let wire = match ClientFrame::new(kind, payload).and_then(|f| f.encode()) {
            Ok(wire) => wire,
            Err(error) => {
                tracing::warn!(%kind, %error, "dropping unserializable outbound frame");
                return;
            },
        };

        let mut sink = self.inner.sink.lock().await;
        match sink.as_mut() {
            Some(sink) => {
                if let Err(error) = sink.send(WsMessage::Text(wire)).await {
                    tracing::warn!(%kind, %error, "send failed; frame dropped");
                }
            },
            None => tracing::warn!(%kind, "cannot send, not connected; frame dropped"),
        }
    }
}

impl std::fmt::Debug for WsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsManager")
            .field("ws_url", &self.inner.ws_url)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

fn lock_link(inner: &Inner) -> std::sync::MutexGuard<'_, Link> {
    inner.link.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Feed one event into the policy machine and execute whatever it returns.
fn apply(inner: &Arc<Inner>, event: LinkEvent) {
    let actions = lock_link(inner).handle(event);
    execute(inner, actions);
}

fn execute(inner: &Arc<Inner>, actions: Vec<LinkAction>) {
    for action in actions {
        match action {
            LinkAction::OpenSocket { token } => {
                let task = tokio::spawn(run_socket(Arc::clone(inner), token));
                let previous = lock_reader(inner).replace(task.abort_handle());
                if let Some(previous) = previous {
                    previous.abort();
                }
            },
            LinkAction::ScheduleRetry { delay } => {
                let inner = Arc::clone(inner);
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    apply(&inner, LinkEvent::RetryElapsed);
                });
            },
            LinkAction::CloseSocket => {
                let inner = Arc::clone(inner);
                if let Some(reader) = lock_reader(&inner).take() {
                    reader.abort();
                }
                tokio::spawn(async move {
                    if let Some(mut sink) = inner.sink.lock().await.take() {
                        let _ = sink.close().await;
                    }
                });
            },
        }
    }
}

fn lock_reader(inner: &Inner) -> std::sync::MutexGuard<'_, Option<tokio::task::AbortHandle>> {
    inner.reader.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Socket endpoint with the token attached as a query credential.
fn socket_url(base: &str, token: &str) -> Result<url::Url, url::ParseError> {
    let mut url = url::Url::parse(&format!("{base}/ws"))?;
    url.query_pairs_mut().append_pair("token", token);
    Ok(url)
}

/// One socket's lifetime: open, read until close, report back.
async fn run_socket(inner: Arc<Inner>, token: String) {
    let url = match socket_url(&inner.ws_url, &token) {
        Ok(url) => url,
        Err(error) => {
            tracing::warn!(%error, "invalid websocket endpoint");
            apply(&inner, LinkEvent::SocketClosed);
            return;
        },
    };

    let stream = match connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(error) => {
            // Failing to even construct the socket follows the same
            // reconnect policy as a close.
            tracing::warn!(%error, "websocket connect failed");
            apply(&inner, LinkEvent::SocketClosed);
            return;
        },
    };

    tracing::debug!("websocket connected");
    let (sink, mut read) = stream.split();
    *inner.sink.lock().await = Some(sink);
    apply(&inner, LinkEvent::SocketOpened);

    // A disconnect racing the open leaves the machine not-open and the
    // confirmation ignored; the sink stored above is then stale and must
    // not be left for `send` to find.
    if !lock_link(&inner).is_open() {
        if let Some(mut sink) = inner.sink.lock().await.take() {
            let _ = sink.close().await;
        }
        return;
    }

    while let Some(frame) = read.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => match Envelope::decode(&text) {
                Ok(envelope) => inner.registry.dispatch(&envelope),
                Err(error) => {
                    tracing::warn!(%error, "dropping malformed frame");
                },
            },
            Ok(WsMessage::Close(_)) => break,
            // Pings are answered by the protocol layer; binary frames are
            // not part of the contract.
            Ok(_) => {},
            Err(error) => {
                tracing::warn!(%error, "websocket read error");
                break;
            },
        }
    }

    tracing::debug!("websocket disconnected");
    inner.sink.lock().await.take();
    apply(&inner, LinkEvent::SocketClosed);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn socket_url_attaches_token_as_query() {
        let url = socket_url("ws://localhost:8000", "abc123").unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8000/ws?token=abc123");
    }

    #[test]
    fn socket_url_percent_encodes_the_token() {
        let url = socket_url("wss://chat.example.com", "a b&c").unwrap();
        assert_eq!(url.query(), Some("token=a+b%26c"));
    }

    #[test]
    fn socket_url_rejects_garbage() {
        assert!(socket_url("not a url", "tkn").is_err());
    }
}
