use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use super::AppState;
use crate::database::is_ready;

/// Readiness check. Always 200; the body says what is degraded.
pub async fn api_test(State(state): State<AppState>) -> Json<Value> {
    let database = if is_ready(&state.db).await {
        "connected"
    } else {
        "unavailable"
    };
    let engine = state.receipts.engine();

    Json(json!({
        "message": "API is working",
        "timestamp": Utc::now(),
        "database": database,
        "ocr": {
            "engine": engine.name(),
            "available": engine.is_available(),
        },
    }))
}
