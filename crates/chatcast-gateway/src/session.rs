//! One `/chat/events` connection: subscribe on open, relay payloads as SSE
//! events, unsubscribe on close.
//!
//! ```text
//! INIT ─► SUBSCRIBED ─► STREAMING ─┬─ payload ──► yield event ─┐
//!                          ▲        │                            │
//!                          └────────┴────────────────────────────┘
//!                                   ├─ shutdown token ─┐
//!                                   ├─ outbox closed ──┼─► CLOSING ─► CLOSED
//!                                   └─ stream dropped ─┘   (unsubscribe)
//! ```
//!
//! Peer disconnects and write errors surface as the transport dropping the
//! event stream. The stream owns the session, and the session owns the
//! [`Subscription`], so every exit path releases the registry entry.

use std::convert::Infallible;
use std::sync::Arc;

use axum::response::sse::Event;
use bytes::Bytes;
use chatcast_broadcast::{Registry, SubscriberId, Subscription};
use futures_util::Stream;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Why a session stopped streaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The transport dropped the stream: peer went away or a write failed.
    Disconnected,
    /// Server shutdown was requested.
    Shutdown,
    /// The subscriber was removed from the registry by someone else.
    OutboxClosed,
}

impl CloseReason {
    pub fn as_str(self) -> &'static str {
        match self {
            CloseReason::Disconnected => "disconnected",
            CloseReason::Shutdown => "shutdown",
            CloseReason::OutboxClosed => "outbox_closed",
        }
    }
}

pub struct StreamSession {
    subscription: Subscription,
    shutdown: CancellationToken,
    reason: CloseReason,
}

impl StreamSession {
    /// Subscribe immediately, so anything published after this returns is
    /// queued for the session even before the stream is first polled.
    pub fn open(registry: &Arc<Registry>, shutdown: CancellationToken) -> Self {
        let subscription = registry.acquire();
        info!(subscriber = %subscription.id(), "client connected");
        Self {
            subscription,
            shutdown,
            reason: CloseReason::Disconnected,
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.subscription.id()
    }

    /// Wait for the next payload to forward.
    ///
    /// Returns `None` when the session should end, recording the reason.
    pub async fn next_payload(&mut self) -> Option<Bytes> {
        tokio::select! {
            biased;

            _ = self.shutdown.cancelled() => {
                self.reason = CloseReason::Shutdown;
                None
            }

            payload = self.subscription.recv() => {
                if payload.is_none() {
                    self.reason = CloseReason::OutboxClosed;
                }
                payload
            }
        }
    }

    /// Turn the session into an SSE event stream.
    ///
    /// Each payload becomes one `data:` event, written and flushed as its own
    /// chunk by the transport. Dropping the stream closes the session.
    pub fn into_events(self) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
        async_stream::stream! {
            let mut session = self;
            while let Some(payload) = session.next_payload().await {
                match sse_event(&payload) {
                    Some(event) => yield Ok(event),
                    None => {
                        warn!(
                            subscriber = %session.id(),
                            bytes = payload.len(),
                            "skipping payload that cannot be framed as SSE data"
                        );
                    }
                }
            }
        }
    }

    pub fn close_reason(&self) -> CloseReason {
        self.reason
    }
}

/// Frame one payload as a `data:` event.
///
/// SSE is a text protocol: payloads must be UTF-8, and a bare `\r` would be
/// read by the client as a line break. Newlines are fine, each line becomes
/// its own `data:` field.
fn sse_event(payload: &[u8]) -> Option<Event> {
    let text = std::str::from_utf8(payload).ok()?;
    if text.contains('\r') {
        return None;
    }
    Some(Event::default().data(text))
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        // `subscription` is dropped right after this and unsubscribes.
        info!(
            subscriber = %self.subscription.id(),
            reason = self.reason.as_str(),
            "client disconnected"
        );
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;

    use super::*;

    fn open() -> (Arc<Registry>, CancellationToken, StreamSession) {
        let registry = Arc::new(Registry::new());
        let shutdown = CancellationToken::new();
        let session = StreamSession::open(&registry, shutdown.child_token());
        (registry, shutdown, session)
    }

    #[tokio::test]
    async fn open_registers_subscriber() {
        let (registry, _shutdown, session) = open();
        assert!(registry.contains(session.id()));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn relays_payloads_in_order() {
        let (registry, _shutdown, mut session) = open();

        registry.publish(Bytes::from_static(b"m1"));
        registry.publish(Bytes::from_static(b"m2"));

        assert_eq!(session.next_payload().await.unwrap(), Bytes::from_static(b"m1"));
        assert_eq!(session.next_payload().await.unwrap(), Bytes::from_static(b"m2"));
    }

    #[tokio::test]
    async fn shutdown_ends_session() {
        let (registry, shutdown, mut session) = open();

        shutdown.cancel();
        assert!(session.next_payload().await.is_none());
        assert_eq!(session.close_reason(), CloseReason::Shutdown);

        let id = session.id();
        drop(session);
        assert!(!registry.contains(id));
    }

    #[tokio::test]
    async fn external_unsubscribe_ends_session_cleanly() {
        let (registry, _shutdown, mut session) = open();

        registry.unsubscribe(session.id());
        assert!(session.next_payload().await.is_none());
        assert_eq!(session.close_reason(), CloseReason::OutboxClosed);
        drop(session);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn dropping_event_stream_unsubscribes() {
        let (registry, _shutdown, session) = open();

        let mut events = Box::pin(session.into_events());
        registry.publish(Bytes::from_static(br#"{"user_id":"u1","message":"hi"}"#));
        assert!(events.next().await.is_some());
        assert_eq!(registry.len(), 1);

        drop(events);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn shutdown_takes_precedence_over_queued_payloads() {
        let (registry, shutdown, session) = open();

        registry.publish(Bytes::from_static(b"m1"));
        registry.publish(Bytes::from_static(b"m2"));
        shutdown.cancel();

        // biased select sees the cancelled token before the queued payloads
        let events: Vec<_> = session.into_events().collect().await;
        assert!(events.is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn unframeable_payloads_are_rejected() {
        assert!(sse_event(br#"{"user_id":"u1","message":"hi"}"#).is_some());
        assert!(sse_event(b"two\nlines").is_some());
        assert!(sse_event(&[0xff, 0xfe]).is_none());
        assert!(sse_event(b"carriage\rreturn").is_none());
    }

    #[tokio::test]
    async fn event_stream_yields_one_event_per_valid_payload() {
        let (registry, _shutdown, session) = open();

        registry.publish(Bytes::from_static(&[0xff, 0xfe]));
        registry.publish(Bytes::from_static(b"bad\r"));
        registry.publish(Bytes::from_static(b"ok"));
        let id = session.id();
        registry.unsubscribe(id);

        let events: Vec<_> = session.into_events().collect().await;
        assert_eq!(events.len(), 1);
    }
}
