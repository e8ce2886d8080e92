//! Live chat feed — GET /chat/events
//!
//! Server-Sent Events stream. Every message accepted by `POST /chat/send`
//! after the connection opens is pushed as one event:
//!
//! ```text
//! data: {"user_id":"u1","message":"hi"}
//!
//! ```
//!
//! Idle streams carry a keep-alive comment every `stream.keep_alive_secs`.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{
        sse::{KeepAlive, Sse},
        IntoResponse,
    },
};

use crate::app::AppState;
use crate::session::StreamSession;

/// GET /chat/events — subscribe this connection to the broadcast.
pub async fn events_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session = StreamSession::open(&state.registry, state.shutdown.child_token());

    // Sse sets `Content-Type: text/event-stream` and `Cache-Control: no-cache`.
    let sse = Sse::new(session.into_events())
        .keep_alive(KeepAlive::new().interval(state.config.stream.keep_alive()));

    (
        [(header::CONNECTION, HeaderValue::from_static("keep-alive"))],
        sse,
    )
}
