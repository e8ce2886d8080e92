use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use chatcast_broadcast::Registry;
use chatcast_core::config::ChatcastConfig;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: ChatcastConfig,
    /// Live SSE subscribers; `/chat/send` publishes into it.
    pub registry: Arc<Registry>,
    /// Cancelled on shutdown; every open stream session watches a child token.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: ChatcastConfig) -> Self {
        Self::with_registry(config, Arc::new(Registry::new()))
    }

    pub fn with_registry(config: ChatcastConfig, registry: Arc<Registry>) -> Self {
        Self {
            config,
            registry,
            shutdown: CancellationToken::new(),
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(crate::http::ui::ui_handler))
        .route("/health", get(crate::http::health::health_handler))
        .route("/chat/send", post(crate::http::chat::send_handler))
        .route("/chat/events", get(crate::http::events::events_handler))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Serve until `state.shutdown` is cancelled.
///
/// Cancelling the token ends every open event stream, which lets the
/// graceful shutdown finish instead of waiting on long-lived connections.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    let shutdown = state.shutdown.clone();
    let router = build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            info!("shutdown requested, closing event streams");
        })
        .await
}
