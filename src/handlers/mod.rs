pub mod auth;
pub mod expenses;
pub mod health;

use axum::{
    http::{StatusCode, Uri},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::{config::Config, database::Database, receipts::ReceiptProcessor};

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub receipts: ReceiptProcessor,
}

pub async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "404 not found", "path": uri.path() })),
    )
}
