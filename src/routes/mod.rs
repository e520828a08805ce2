pub mod events;
pub mod extract;
pub mod guests;
pub mod roster;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::AppState;
use crate::error::AppError;

pub fn api_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health))
        .merge(events::router(max_upload_bytes))
        .merge(roster::router())
        .merge(guests::router())
}

async fn health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let db = state.store.ping().await?;
    Ok(Json(serde_json::json!({ "status": "ok", "db": db })))
}
