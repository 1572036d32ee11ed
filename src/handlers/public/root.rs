// handlers/public/root.rs - GET / and GET /api/health

use axum::{extract::State, response::Json};
use serde_json::{json, Value};
use tracing::warn;

use crate::state::AppState;

/// GET / - service banner
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Personal Productivity API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/health - liveness plus a store probe; always 200 so the process
/// stays routable while the store recovers.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let store = match state.store.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            warn!("Health check store probe failed: {}", e);
            "unavailable"
        }
    };

    Json(json!({
        "status": "OK",
        "message": "Server is running",
        "store": store,
    }))
}
