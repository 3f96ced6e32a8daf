//! Health check endpoints for monitoring.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use emporium_db::migrations::migration_status;
use serde_json::{json, Value};
use tracing::warn;

use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let server_time = Utc::now().to_rfc3339();

    if state.db().health_check().await {
        let (total, applied) = migration_status(state.db().pool()).await.unwrap_or((0, 0));
        (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "database": "ok",
                "migrations": { "total": total, "applied": applied },
                "serverTime": server_time,
            })),
        )
    } else {
        warn!("Readiness check failed: database unreachable");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable", "database": "unreachable", "serverTime": server_time })),
        )
    }
}
