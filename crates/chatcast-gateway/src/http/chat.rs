//! Chat post endpoint — POST /chat/send
//!
//! Request:  `{"user_id": "u1", "message": "hi"}`
//! Response: `201 Created`, body `Message sent`
//! Error:    `400` + `{"error": "...", "code": "BAD_REQUEST"}` on any decode failure

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chatcast_protocol::frames::{ChatMessage, ErrorBody};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::app::AppState;

/// POST /chat/send — fan one message out to every open event stream.
///
/// The record is re-serialized rather than forwarded verbatim, so unknown
/// fields are dropped and every subscriber sees the same canonical JSON.
pub async fn send_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ChatMessage>, JsonRejection>,
) -> Result<(StatusCode, &'static str), (StatusCode, Json<ErrorBody>)> {
    // Bad JSON, missing fields, and a wrong content type are all client errors.
    let Json(chat) = body.map_err(|rejection| {
        let reason = rejection.body_text();
        warn!(error = %reason, "rejected chat message");
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::new(reason).with_code("BAD_REQUEST")),
        )
    })?;

    let payload = chat.encode().map_err(|e| {
        warn!(error = %e, "failed to encode chat message");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::from(&e)))
    })?;

    let delivered = state.registry.publish(payload);
    debug!(user_id = %chat.user_id, delivered, "chat message published");

    Ok((StatusCode::CREATED, "Message sent"))
}
