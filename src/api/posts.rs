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
use crate::core::{PostId, ProjectId, UserId};
use crate::error::AppResult;
use crate::models::{NewPost, Post};

fn post_id(raw: &str) -> AppResult<PostId> {
    parse_id(raw, "post").map(PostId)
}

pub async fn create_post_handler(
    State(state): State<AppState>,
    JsonBody(new): JsonBody<NewPost>,
) -> AppResult<(StatusCode, Json<Post>)> {
    let post = state.posts.create(new).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_post_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Post>> {
    Ok(Json(state.posts.get(post_id(&id)?).await?))
}

pub async fn update_post_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(updates): JsonBody<Map<String, Value>>,
) -> AppResult<Json<Post>> {
    Ok(Json(state.posts.update(post_id(&id)?, &updates).await?))
}

pub async fn delete_post_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let id = post_id(&id)?;
    state.posts.delete(id).await?;
    Ok(message(format!("Post {} deleted", id)))
}

pub async fn posts_by_user_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Post>>> {
    let user = UserId(parse_id(&id, "user")?);
    Ok(Json(state.posts.by_user(user).await?))
}

pub async fn posts_by_project_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Post>>> {
    let project = ProjectId(parse_id(&id, "project")?);
    Ok(Json(state.posts.by_project(project).await?))
}

pub async fn like_post_handler(
    State(state): State<AppState>,
    Path((id, username)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    let outcome = state.posts.like(&username, post_id(&id)?).await?;
    Ok(Json(json!({ "outcome": outcome })))
}

pub async fn unlike_post_handler(
    State(state): State<AppState>,
    Path((id, username)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    let outcome = state.posts.unlike(&username, post_id(&id)?).await?;
    Ok(Json(json!({ "outcome": outcome })))
}

pub async fn does_like_post_handler(
    State(state): State<AppState>,
    Path((id, username)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    let liked = state.posts.is_liked(&username, post_id(&id)?).await?;
    Ok(Json(json!({ "liked": liked })))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/posts", post(create_post_handler))
        .route(
            "/posts/{id}",
            get(get_post_handler)
                .patch(update_post_handler)
                .delete(delete_post_handler),
        )
        .route("/posts/by-user/{id}", get(posts_by_user_handler))
        .route("/posts/by-project/{id}", get(posts_by_project_handler))
        .route(
            "/posts/{id}/likes/{username}",
            get(does_like_post_handler).post(like_post_handler),
        )
        .route("/posts/{id}/unlikes/{username}", post(unlike_post_handler))
}
