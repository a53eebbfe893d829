//! Health check handlers.
//!
//! - `/health`: Liveness check - returns OK if the process is running
//! - `/ready`: Readiness check - checks the store

use crate::models::ReadinessResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

/// Liveness check handler.
///
/// Does NOT check any dependencies.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness check handler.
///
/// Returns 200 if the store answers, 503 otherwise. The error message is
/// generic; the actual failure is logged.
#[tracing::instrument(skip_all, name = "bm.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if let Err(e) = state.store.ping().await {
        tracing::warn!(target: "bm.handlers.health", error = %e, "Readiness check failed");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                status: "not_ready",
                database: Some("unhealthy"),
                error: Some("Service dependencies unavailable".to_string()),
            }),
        );
    }

    (
        StatusCode::OK,
        Json(ReadinessResponse {
            status: "ready",
            database: Some("healthy"),
            error: None,
        }),
    )
}
