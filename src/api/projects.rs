use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};

use crate::api::extract::JsonBody;
use crate::api::{message, parse_id};
use crate::app_state::AppState;
use crate::core::ProjectId;
use crate::error::AppResult;
use crate::models::{NewProject, Project};

fn project_id(raw: &str) -> AppResult<ProjectId> {
    parse_id(raw, "project").map(ProjectId)
}

pub async fn create_project_handler(
    State(state): State<AppState>,
    JsonBody(new): JsonBody<NewProject>,
) -> AppResult<(StatusCode, Json<Project>)> {
    let project = state.projects.create(new).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Project>> {
    Ok(Json(state.projects.get(project_id(&id)?).await?))
}

pub async fn update_project_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(updates): JsonBody<Map<String, Value>>,
) -> AppResult<Json<Project>> {
    Ok(Json(state.projects.update(project_id(&id)?, &updates).await?))
}

pub async fn delete_project_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let id = project_id(&id)?;
    state.projects.delete(id).await?;
    Ok(message(format!("Project {} deleted", id)))
}

pub async fn project_followers_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<String>>> {
    Ok(Json(state.projects.followers(project_id(&id)?).await?))
}

pub async fn follow_project_handler(
    State(state): State<AppState>,
    Path((id, username)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    let id = project_id(&id)?;
    state.projects.follow(&username, id).await?;
    Ok(message(format!("{} now follows project {}", username, id)))
}

pub async fn unfollow_project_handler(
    State(state): State<AppState>,
    Path((id, username)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    let id = project_id(&id)?;
    state.projects.unfollow(&username, id).await?;
    Ok(message(format!("{} no longer follows project {}", username, id)))
}

pub async fn like_project_handler(
    State(state): State<AppState>,
    Path((id, username)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    let outcome = state.projects.like(&username, project_id(&id)?).await?;
    Ok(Json(json!({ "outcome": outcome })))
}

pub async fn unlike_project_handler(
    State(state): State<AppState>,
    Path((id, username)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    let outcome = state.projects.unlike(&username, project_id(&id)?).await?;
    Ok(Json(json!({ "outcome": outcome })))
}

pub async fn does_like_project_handler(
    State(state): State<AppState>,
    Path((id, username)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    let liked = state.projects.is_liked(&username, project_id(&id)?).await?;
    Ok(Json(json!({ "liked": liked })))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/projects", post(create_project_handler))
        .route(
            "/projects/{id}",
            get(get_project_handler)
                .patch(update_project_handler)
                .delete(delete_project_handler),
        )
        .route("/projects/{id}/followers", get(project_followers_handler))
        .route("/projects/{id}/follow/{username}", post(follow_project_handler))
        .route("/projects/{id}/unfollow/{username}", post(unfollow_project_handler))
        .route(
            "/projects/{id}/likes/{username}",
            get(does_like_project_handler).post(like_project_handler),
        )
        .route("/projects/{id}/unlikes/{username}", post(unlike_project_handler))
}
