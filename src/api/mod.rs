// HTTP boundary - parses path/query/body input and calls the services

pub mod comments;
pub mod extract;
pub mod feed;
pub mod posts;
pub mod projects;
pub mod users;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::app_state::AppState;
use crate::error::{AppError, AppResult};

/// Parse a numeric path segment; failures are a 400, not a routing miss.
pub(crate) fn parse_id(raw: &str, what: &str) -> AppResult<i64> {
    raw.parse::<i64>()
        .map_err(|_| AppError::BadRequest(format!("invalid {} id '{}'", what, raw)))
}

pub(crate) fn message(text: impl Into<String>) -> Json<Value> {
    Json(json!({ "message": text.into() }))
}

pub async fn health_handler(State(state): State<AppState>) -> AppResult<Json<Value>> {
    state.health_check().await?;
    Ok(message("API is running!"))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .merge(users::routes())
        .merge(projects::routes())
        .merge(posts::routes())
        .merge(comments::routes())
        .merge(feed::routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
