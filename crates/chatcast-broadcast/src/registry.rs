//! Subscriber registry and fan-out.
//!
//! A single mutex guards the membership map, so `subscribe`, `unsubscribe`
//! and the `publish` traversal never interleave. Outbox sends happen while
//! the lock is held; they are unbounded and never wait, which is what keeps
//! publishes serialized (and therefore ordered per subscriber) without letting
//! one stalled reader hold up the rest.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::subscription::Subscription;

/// Unique identifier for a live subscriber.
///
/// Drawn from a per-registry monotonic counter, so ids never collide and are
/// never reused, no matter how many subscriptions open in the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Handle returned by [`Registry::subscribe`]: the id plus the read side of
/// the subscriber's outbox. The write side stays inside the registry.
#[derive(Debug)]
pub struct Subscriber {
    pub id: SubscriberId,
    pub outbox: mpsc::UnboundedReceiver<Bytes>,
}

type Outbox = mpsc::UnboundedSender<Bytes>;

/// Process-wide set of live subscribers.
///
/// Constructed once at startup and shared as `Arc<Registry>`; tests build
/// their own isolated instances.
pub struct Registry {
    subscribers: Mutex<BTreeMap<SubscriberId, Outbox>>,
    next_id: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    // The map is never left half-updated, so a panic elsewhere while the
    // lock was held does not invalidate it.
    fn entries(&self) -> MutexGuard<'_, BTreeMap<SubscriberId, Outbox>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new subscriber with a fresh id and an empty outbox.
    pub fn subscribe(&self) -> Subscriber {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));

        let count = {
            let mut subscribers = self.entries();
            subscribers.insert(id, tx);
            subscribers.len()
        };

        info!(subscriber = %id, subscribers = count, "subscriber added");
        Subscriber { id, outbox: rx }
    }

    /// Register a subscriber wrapped in a [`Subscription`] guard that
    /// unsubscribes when dropped.
    pub fn acquire(self: &Arc<Self>) -> Subscription {
        Subscription::new(Arc::clone(self), self.subscribe())
    }

    /// Remove a subscriber and close its outbox.
    ///
    /// Messages already enqueued stay readable; the reader sees the end of
    /// the outbox after draining them. Returns `false` (and does nothing) if
    /// the id is not registered.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let (removed, count) = {
            let mut subscribers = self.entries();
            let removed = subscribers.remove(&id);
            (removed, subscribers.len())
        };

        match removed {
            Some(outbox) => {
                // dropping the only sender closes the outbox
                drop(outbox);
                info!(subscriber = %id, subscribers = count, "subscriber removed");
                true
            }
            None => {
                debug!(subscriber = %id, "unsubscribe for unknown subscriber ignored");
                false
            }
        }
    }

    /// Enqueue `payload` into the outbox of every registered subscriber.
    ///
    /// Returns the number of outboxes the payload was delivered to. Entries
    /// whose reader has gone away without unsubscribing are removed here.
    pub fn publish(&self, payload: Bytes) -> usize {
        let mut delivered = 0;
        let mut subscribers = self.entries();

        subscribers.retain(|id, outbox| match outbox.send(payload.clone()) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(_) => {
                debug!(subscriber = %id, "reader gone, dropping subscriber");
                false
            }
        });

        trace!(delivered, bytes = payload.len(), "payload published");
        delivered
    }

    /// Number of live subscribers.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn contains(&self, id: SubscriberId) -> bool {
        self.entries().contains_key(&id)
    }

    /// Ids of all live subscribers, in subscription order.
    pub fn ids(&self) -> Vec<SubscriberId> {
        self.entries().keys().copied().collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("subscribers", &self.len())
            .finish()
    }
}
