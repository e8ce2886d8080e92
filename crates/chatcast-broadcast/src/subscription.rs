//! Scoped ownership of one registry subscription.

use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use crate::registry::{Registry, Subscriber, SubscriberId};

/// A live subscription that unsubscribes itself when dropped.
///
/// Whatever ends the owner (stream finished, peer gone, task aborted, panic
/// unwinding) ends up in `Drop`, so every `subscribe` is matched by exactly
/// one `unsubscribe`.
pub struct Subscription {
    id: SubscriberId,
    outbox: mpsc::UnboundedReceiver<Bytes>,
    registry: Arc<Registry>,
}

impl Subscription {
    pub(crate) fn new(registry: Arc<Registry>, subscriber: Subscriber) -> Self {
        Self {
            id: subscriber.id,
            outbox: subscriber.outbox,
            registry,
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next payload.
    ///
    /// Returns `None` once the outbox is closed and drained, e.g. when the
    /// subscriber was removed from the registry by someone else.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.outbox.recv().await
    }

    pub fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<Bytes>> {
        self.outbox.poll_recv(cx)
    }

    pub fn try_recv(&mut self) -> Result<Bytes, TryRecvError> {
        self.outbox.try_recv()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.unsubscribe(self.id);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_unsubscribes() {
        let registry = Arc::new(Registry::new());
        let sub = registry.acquire();
        let id = sub.id();
        assert!(registry.contains(id));

        drop(sub);
        assert!(!registry.contains(id));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn recv_yields_published_payloads() {
        let registry = Arc::new(Registry::new());
        let mut sub = registry.acquire();

        registry.publish(Bytes::from_static(b"hello"));
        assert_eq!(sub.recv().await.unwrap(), Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn external_unsubscribe_ends_recv_cleanly() {
        let registry = Arc::new(Registry::new());
        let mut sub = registry.acquire();

        registry.publish(Bytes::from_static(b"last"));
        assert!(registry.unsubscribe(sub.id()));

        // queued payload survives the close, then the outbox reports its end
        assert_eq!(sub.recv().await.unwrap(), Bytes::from_static(b"last"));
        assert!(sub.recv().await.is_none());

        // the guard's own unsubscribe is now a no-op
        drop(sub);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn aborted_task_releases_subscription() {
        let registry = Arc::new(Registry::new());
        let sub = registry.acquire();
        let id = sub.id();

        let task = tokio::spawn(async move {
            let mut sub = sub;
            while sub.recv().await.is_some() {}
        });
        tokio::task::yield_now().await;
        assert!(registry.contains(id));

        task.abort();
        let _ = task.await;
        assert!(!registry.contains(id));
    }

    #[test]
    fn try_recv_reports_empty_outbox() {
        let registry = Arc::new(Registry::new());
        let mut sub = registry.acquire();
        assert_eq!(sub.try_recv(), Err(TryRecvError::Empty));
    }
}
