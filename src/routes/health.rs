use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

#[axum::debug_handler]
pub async fn health() -> impl IntoResponse {
    let body = json!({
        "status": "ok",
    });
    (StatusCode::OK, Json(body))
}

#[axum::debug_handler]
pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "name": state.config.app_name,
        "env": state.config.app_env,
    }))
}
