use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{Map, Value};

use crate::api::extract::JsonBody;
use crate::api::message;
use crate::app_state::AppState;
use crate::core::UserId;
use crate::error::AppResult;
use crate::models::{NewUser, Project, User};

pub async fn list_users_handler(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.users.list().await?))
}

pub async fn create_user_handler(
    State(state): State<AppState>,
    JsonBody(new): JsonBody<NewUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = state.users.create(new).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<User>> {
    Ok(Json(state.users.get(&username).await?))
}

pub async fn update_user_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
    JsonBody(updates): JsonBody<Map<String, Value>>,
) -> AppResult<Json<User>> {
    Ok(Json(state.users.update(&username, &updates).await?))
}

pub async fn delete_user_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<Value>> {
    state.users.delete(&username).await?;
    Ok(message(format!("User {} deleted", username)))
}

pub async fn followers_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<Vec<UserId>>> {
    Ok(Json(state.users.followers(&username).await?))
}

pub async fn follower_usernames_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<Vec<String>>> {
    Ok(Json(state.users.follower_usernames(&username).await?))
}

pub async fn following_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<Vec<UserId>>> {
    Ok(Json(state.users.following(&username).await?))
}

pub async fn following_usernames_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<Vec<String>>> {
    Ok(Json(state.users.following_usernames(&username).await?))
}

pub async fn followed_projects_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<Vec<Project>>> {
    Ok(Json(state.users.followed_projects(&username).await?))
}

pub async fn follow_handler(
    State(state): State<AppState>,
    Path((username, target)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    state.users.follow(&username, &target).await?;
    Ok(message(format!("{} now follows {}", username, target)))
}

pub async fn unfollow_handler(
    State(state): State<AppState>,
    Path((username, target)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    state.users.unfollow(&username, &target).await?;
    Ok(message(format!("{} no longer follows {}", username, target)))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users_handler).post(create_user_handler))
        .route(
            "/users/{username}",
            get(get_user_handler)
                .patch(update_user_handler)
                .delete(delete_user_handler),
        )
        .route("/users/{username}/followers", get(followers_handler))
        .route("/users/{username}/followers/usernames", get(follower_usernames_handler))
        .route("/users/{username}/follows", get(following_handler))
        .route("/users/{username}/follows/usernames", get(following_usernames_handler))
        .route("/users/{username}/projects", get(followed_projects_handler))
        .route("/users/{username}/follow/{target}", post(follow_handler))
        .route("/users/{username}/unfollow/{target}", post(unfollow_handler))
}
