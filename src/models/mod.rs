// Domain models - persisted entities, creation payloads and feed/like selectors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{CommentId, PostId, ProjectId, UserId};
use crate::schemas::{EntitySchema, COMMENT_SCHEMA, POST_SCHEMA, PROJECT_SCHEMA, USER_SCHEMA};

/// A persisted entity that can be targeted by a partial update.
/// The row key comes from the snapshot, never from caller-supplied data.
pub trait Entity {
    fn schema() -> &'static EntitySchema;
    fn key(&self) -> i64;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub bio: String,
    pub links: Vec<String>,
    pub created_on: DateTime<Utc>,
    pub picture: String,
}

impl Entity for User {
    fn schema() -> &'static EntitySchema {
        &USER_SCHEMA
    }

    fn key(&self) -> i64 {
        self.id.value()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub owner: UserId,
    pub name: String,
    pub description: String,
    pub status: i16,
    pub likes: i64,
    pub tags: Vec<String>,
    pub links: Vec<String>,
    pub creation_date: DateTime<Utc>,
}

impl Entity for Project {
    fn schema() -> &'static EntitySchema {
        &PROJECT_SCHEMA
    }

    fn key(&self) -> i64 {
        self.id.value()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub user: UserId,
    pub project: ProjectId,
    pub likes: i64,
    pub content: String,
    pub created_on: DateTime<Utc>,
}

impl Entity for Post {
    fn schema() -> &'static EntitySchema {
        &POST_SCHEMA
    }

    fn key(&self) -> i64 {
        self.id.value()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub user: UserId,
    pub likes: i64,
    /// `None` for a root-level comment
    pub parent_comment: Option<CommentId>,
    pub created_on: DateTime<Utc>,
    pub content: String,
}

impl Comment {
    pub fn is_deleted(&self) -> bool {
        self.user.is_deleted_sentinel()
    }
}

impl Entity for Comment {
    fn schema() -> &'static EntitySchema {
        &COMMENT_SCHEMA
    }

    fn key(&self) -> i64 {
        self.id.value()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub picture: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub owner: UserId,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub status: i16,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    pub user: UserId,
    pub project: ProjectId,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    pub user: UserId,
    pub content: String,
    /// Ignored when the comment is created as a reply; the parent comes from the route.
    #[serde(default)]
    pub parent_comment: Option<CommentId>,
}

/// Where a new comment is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentParent {
    Post(PostId),
    Project(ProjectId),
    Comment(CommentId),
}

/// Anything that carries a `likes` counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeTarget {
    Post(PostId),
    Comment(CommentId),
    Project(ProjectId),
}

impl LikeTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            LikeTarget::Post(_) => "post",
            LikeTarget::Comment(_) => "comment",
            LikeTarget::Project(_) => "project",
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            LikeTarget::Post(id) => id.value(),
            LikeTarget::Comment(id) => id.value(),
            LikeTarget::Project(id) => id.value(),
        }
    }

    /// Table holding the counter
    pub(crate) fn table(&self) -> &'static str {
        match self {
            LikeTarget::Post(_) => "Posts",
            LikeTarget::Comment(_) => "Comments",
            LikeTarget::Project(_) => "Projects",
        }
    }

    /// Association table and its target column
    pub(crate) fn likes_table(&self) -> (&'static str, &'static str) {
        match self {
            LikeTarget::Post(_) => ("PostLikes", "post_id"),
            LikeTarget::Comment(_) => ("CommentLikes", "comment_id"),
            LikeTarget::Project(_) => ("ProjectLikes", "project_id"),
        }
    }
}

/// Result of a like/unlike call; both variants are successes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    Changed,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedOrder {
    #[default]
    Time,
    Likes,
}

impl FeedOrder {
    pub(crate) fn order_by(&self) -> &'static str {
        match self {
            FeedOrder::Time => "creation_date DESC, id DESC",
            FeedOrder::Likes => "likes DESC, id DESC",
        }
    }
}
