use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::extract::QueryParams;
use crate::app_state::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{FeedOrder, Post, Project};

#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    #[serde(rename = "type")]
    pub order: Option<String>,
    pub start: Option<i64>,
    pub count: Option<i64>,
}

impl FeedQuery {
    fn order(&self) -> AppResult<FeedOrder> {
        match self.order.as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("") | Some("time") => Ok(FeedOrder::Time),
            Some("likes") => Ok(FeedOrder::Likes),
            Some(other) => Err(AppError::BadRequest(format!(
                "unknown feed type '{}', expected 'time' or 'likes'",
                other
            ))),
        }
    }
}

pub async fn post_feed_handler(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<FeedQuery>,
) -> AppResult<Json<Vec<Post>>> {
    let posts = state
        .feed
        .posts(query.order()?, query.start, query.count)
        .await?;
    Ok(Json(posts))
}

pub async fn project_feed_handler(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<FeedQuery>,
) -> AppResult<Json<Vec<Project>>> {
    let projects = state
        .feed
        .projects(query.order()?, query.start, query.count)
        .await?;
    Ok(Json(projects))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/feed/posts", get(post_feed_handler))
        .route("/feed/projects", get(project_feed_handler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_type_parsing() {
        let query = |order: Option<&str>| FeedQuery {
            order: order.map(str::to_string),
            ..FeedQuery::default()
        };
        assert_eq!(query(None).order().unwrap(), FeedOrder::Time);
        assert_eq!(query(Some("LIKES")).order().unwrap(), FeedOrder::Likes);
        assert!(matches!(
            query(Some("random")).order(),
            Err(AppError::BadRequest(_))
        ));
    }
}
