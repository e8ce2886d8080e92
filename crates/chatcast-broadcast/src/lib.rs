//! In-process publish/subscribe fan-out for chat payloads.
//!
//! ```text
//!                    Arc<Registry>
//!            ┌──────────────────────────────┐
//!            │ subscribers: Mutex<BTreeMap< │
//!            │   SubscriberId,              │
//!            │   UnboundedSender<Bytes>,    │
//!            │ >>                           │
//!            └──────────────┬───────────────┘
//!                           │
//!     ┌─────────────────────┼─────────────────────┐
//!     ▼                     ▼                     ▼
//! [POST /chat/send]   [Subscription]        [Subscription]
//!  registry.publish()  outbox.recv()         outbox.recv()
//!                      └─► SSE session       └─► SSE session
//! ```
//!
//! Each subscriber owns an unbounded outbox, so `publish` never waits on a
//! slow reader. `Bytes` is reference counted: every outbox shares the same
//! allocation for a given payload.

pub mod registry;
pub mod subscription;

pub use registry::{Registry, Subscriber, SubscriberId};
pub use subscription::Subscription;
