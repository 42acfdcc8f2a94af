use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};

use crate::api::extract::JsonBody;
use crate::api::parse_id;
use crate::app_state::AppState;
use crate::core::{CommentId, PostId, ProjectId, UserId};
use crate::error::AppResult;
use crate::models::{Comment, CommentParent, NewComment};

fn comment_id(raw: &str) -> AppResult<CommentId> {
    parse_id(raw, "comment").map(CommentId)
}

pub async fn get_comment_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Comment>> {
    Ok(Json(state.comments.get(comment_id(&id)?).await?))
}

pub async fn update_comment_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(updates): JsonBody<Map<String, Value>>,
) -> AppResult<Json<Comment>> {
    Ok(Json(state.comments.update(comment_id(&id)?, &updates).await?))
}

/// Soft delete; responds with the rewritten comment
pub async fn delete_comment_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Comment>> {
    Ok(Json(state.comments.delete(comment_id(&id)?).await?))
}

pub async fn can_edit_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let editable = state.comments.can_edit(comment_id(&id)?).await?;
    Ok(Json(json!({ "can_edit": editable })))
}

pub async fn comments_by_post_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Comment>>> {
    let post = PostId(parse_id(&id, "post")?);
    Ok(Json(state.comments.by_post(post).await?))
}

pub async fn comments_by_project_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Comment>>> {
    let project = ProjectId(parse_id(&id, "project")?);
    Ok(Json(state.comments.by_project(project).await?))
}

pub async fn replies_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Comment>>> {
    Ok(Json(state.comments.by_parent(comment_id(&id)?).await?))
}

pub async fn comments_by_user_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Comment>>> {
    let user = UserId(parse_id(&id, "user")?);
    Ok(Json(state.comments.by_user(user).await?))
}

async fn create_comment(
    state: &AppState,
    parent: CommentParent,
    new: NewComment,
) -> AppResult<(StatusCode, Json<Comment>)> {
    let comment = state.comments.create(parent, new).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn comment_on_post_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(new): JsonBody<NewComment>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    let post = PostId(parse_id(&id, "post")?);
    create_comment(&state, CommentParent::Post(post), new).await
}

pub async fn comment_on_project_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(new): JsonBody<NewComment>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    let project = ProjectId(parse_id(&id, "project")?);
    create_comment(&state, CommentParent::Project(project), new).await
}

pub async fn reply_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(new): JsonBody<NewComment>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    let parent = comment_id(&id)?;
    create_comment(&state, CommentParent::Comment(parent), new).await
}

pub async fn like_comment_handler(
    State(state): State<AppState>,
    Path((id, username)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    let outcome = state.comments.like(&username, comment_id(&id)?).await?;
    Ok(Json(json!({ "outcome": outcome })))
}

pub async fn unlike_comment_handler(
    State(state): State<AppState>,
    Path((id, username)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    let outcome = state.comments.unlike(&username, comment_id(&id)?).await?;
    Ok(Json(json!({ "outcome": outcome })))
}

pub async fn does_like_comment_handler(
    State(state): State<AppState>,
    Path((id, username)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    let liked = state.comments.is_liked(&username, comment_id(&id)?).await?;
    Ok(Json(json!({ "liked": liked })))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/comments/{id}",
            get(get_comment_handler)
                .patch(update_comment_handler)
                .delete(delete_comment_handler),
        )
        .route("/comments/{id}/can-edit", get(can_edit_handler))
        .route("/comments/by-post/{id}", get(comments_by_post_handler))
        .route("/comments/by-project/{id}", get(comments_by_project_handler))
        .route("/comments/by-comment/{id}", get(replies_handler))
        .route("/comments/by-user/{id}", get(comments_by_user_handler))
        .route("/comments/for-post/{id}", post(comment_on_post_handler))
        .route("/comments/for-project/{id}", post(comment_on_project_handler))
        .route("/comments/for-comment/{id}", post(reply_handler))
        .route(
            "/comments/{id}/likes/{username}",
            get(does_like_comment_handler).post(like_comment_handler),
        )
        .route("/comments/{id}/unlikes/{username}", post(unlike_comment_handler))
}
