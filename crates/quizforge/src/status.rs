//! Plain HTTP status endpoints, served on their own listener beside the
//! WebSocket transport.
//!
//! | Route | Body |
//! |---|---|
//! | `GET /` | `{message, version, status}` |
//! | `GET /health` | `{status, rooms, uptime}` (uptime in seconds) |

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use quizforge_protocol::Codec;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::server::ServerState;

#[derive(Debug, Serialize)]
struct ServerInfo {
    message: &'static str,
    version: &'static str,
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    rooms: usize,
    uptime: f64,
}

async fn info() -> Json<ServerInfo> {
    Json(ServerInfo {
        message: "Quizforge trivia server",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
    })
}

async fn health<C: Codec>(State(state): State<Arc<ServerState<C>>>) -> Json<Health> {
    Json(Health {
        status: "ok",
        rooms: state.registry.room_count(),
        uptime: state.started.elapsed().as_secs_f64(),
    })
}

pub(crate) fn router<C: Codec>(state: Arc<ServerState<C>>) -> Router {
    Router::new()
        .route("/", get(info))
        .route("/health", get(health::<C>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the status routes until the task is aborted.
pub(crate) async fn serve<C: Codec>(listener: TcpListener, state: Arc<ServerState<C>>) {
    if let Err(e) = axum::serve(listener, router(state)).await {
        tracing::warn!(error = %e, "status endpoint stopped");
    }
}
