//! Service root and health check handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use log::warn;
use std::sync::Arc;

use crate::core::shared::state::AppState;

pub const SERVICE_NAME: &str = "helpdesk-api";

pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<serde_json::Value>) {
    let db_ok = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Health check could not reach storage: {e}");
            false
        }
    };

    let (code, status, database) = if db_ok {
        (StatusCode::OK, "healthy", "connected")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unavailable")
    };

    (
        code,
        Json(serde_json::json!({
            "status": status,
            "timestamp": Utc::now().to_rfc3339(),
            "service": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "database": database,
            "backend": state.store.backend_name()
        })),
    )
}

pub async fn service_root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Helpdesk Ticketing System API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}
