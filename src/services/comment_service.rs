// CommentService - comments on posts, projects and other comments
//
// Content may only change within EDIT_WINDOW_SECS of creation. Deleting a
// comment keeps the row so replies still resolve their parent: the content
// becomes DELETED_CONTENT, likes drop to zero and the author becomes the
// DELETED_USER sentinel.

use chrono::Duration;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;

use crate::core::{Clock, CommentId, PostId, ProjectId, UserId, DELETED_USER};
use crate::error::{AppError, AppResult};
use crate::infrastructure::rows::{self, COMMENT_COLUMNS};
use crate::infrastructure::{Database, PartialUpdateEngine, RelationshipEngine, SqlArg, UpdatePlan};
use crate::models::{Comment, CommentParent, Entity, LikeTarget, NewComment, ToggleOutcome};
use crate::services::{ensure_reference, reject_blank};

pub const EDIT_WINDOW_SECS: i64 = 120;
pub const DELETED_CONTENT: &str = "This comment was deleted.";

#[derive(Debug, Clone)]
pub struct CommentService {
    db: Database,
    updates: PartialUpdateEngine,
    relationships: RelationshipEngine,
    clock: Arc<dyn Clock>,
}

impl CommentService {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self {
            updates: PartialUpdateEngine::new(db.clone()),
            relationships: RelationshipEngine::new(db.clone()),
            db,
            clock,
        }
    }

    pub async fn create(&self, parent: CommentParent, new: NewComment) -> AppResult<Comment> {
        if new.content.is_empty() {
            return Err(AppError::BadRequest("comment content is required".to_string()));
        }
        ensure_reference(&self.db, "Users", "user", new.user.value()).await?;

        let parent_comment = match parent {
            CommentParent::Post(post) => {
                self.ensure_exists("Posts", "post", post.value()).await?;
                new.parent_comment
            }
            CommentParent::Project(project) => {
                self.ensure_exists("Projects", "project", project.value()).await?;
                new.parent_comment
            }
            CommentParent::Comment(comment) => Some(comment),
        };
        if let Some(parent_comment) = parent_comment {
            self.ensure_exists("Comments", "comment", parent_comment.value())
                .await?;
        }

        let mut tx = self.db.begin().await?;

        let id = sqlx::query(
            "INSERT INTO Comments (user_id, content, creation_date, parent_comment_id) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(new.user)
        .bind(&new.content)
        .bind(self.clock.now())
        .bind(parent_comment)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::StorageError(format!("Failed to create comment: {}", e)))?
        .last_insert_rowid();

        let association = match parent {
            CommentParent::Post(post) => Some(("PostComments", "post_id", post.value())),
            CommentParent::Project(project) => {
                Some(("ProjectComments", "project_id", project.value()))
            }
            CommentParent::Comment(_) => None,
        };
        if let Some((table, column, target)) = association {
            sqlx::query(&format!(
                "INSERT INTO {} (user_id, {}, comment_id) VALUES (?, ?, ?)",
                table, column
            ))
            .bind(new.user)
            .bind(target)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::StorageError(format!("Failed to attach comment {}: {}", id, e))
            })?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to commit comment: {}", e)))?;

        info!("Created comment {} on {:?}", id, parent);
        self.get(CommentId(id)).await
    }

    async fn ensure_exists(&self, table: &'static str, kind: &str, id: i64) -> AppResult<()> {
        if self.db.row_exists(table, id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("{} {} does not exist", kind, id)))
        }
    }

    pub async fn get(&self, id: CommentId) -> AppResult<Comment> {
        let sql = format!("SELECT {} FROM Comments WHERE id = ?", COMMENT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| {
                AppError::StorageError(format!("Failed to load comment {}: {}", id, e))
            })?;

        match row {
            Some(row) => rows::comment_from_row(&row),
            None => Err(AppError::NotFound(format!("comment {} does not exist", id))),
        }
    }

    pub async fn by_post(&self, post: PostId) -> AppResult<Vec<Comment>> {
        self.list(
            "id IN (SELECT comment_id FROM PostComments WHERE post_id = ?)",
            post.value(),
        )
        .await
    }

    pub async fn by_project(&self, project: ProjectId) -> AppResult<Vec<Comment>> {
        self.list(
            "id IN (SELECT comment_id FROM ProjectComments WHERE project_id = ?)",
            project.value(),
        )
        .await
    }

    /// Direct replies to `parent`
    pub async fn by_parent(&self, parent: CommentId) -> AppResult<Vec<Comment>> {
        self.list("parent_comment_id = ?", parent.value()).await
    }

    pub async fn by_user(&self, user: UserId) -> AppResult<Vec<Comment>> {
        self.list("user_id = ?", user.value()).await
    }

    async fn list(&self, predicate: &'static str, id: i64) -> AppResult<Vec<Comment>> {
        let sql = format!(
            "SELECT {} FROM Comments WHERE {} ORDER BY creation_date, id",
            COMMENT_COLUMNS, predicate
        );
        let rows = sqlx::query(&sql)
            .bind(id)
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to list comments: {}", e)))?;
        rows::collect(&rows, rows::comment_from_row)
    }

    fn within_edit_window(&self, comment: &Comment) -> bool {
        self.clock.now() - comment.created_on <= Duration::seconds(EDIT_WINDOW_SECS)
    }

    pub async fn can_edit(&self, id: CommentId) -> AppResult<bool> {
        let comment = self.get(id).await?;
        Ok(!comment.is_deleted() && self.within_edit_window(&comment))
    }

    pub async fn update(&self, id: CommentId, updates: &Map<String, Value>) -> AppResult<Comment> {
        let current = self.get(id).await?;
        if current.is_deleted() {
            return Err(AppError::BadRequest(format!("comment {} has been deleted", id)));
        }
        if !self.within_edit_window(&current) {
            return Err(AppError::EditWindowExpired(format!(
                "comment {} was created at {}",
                id, current.created_on
            )));
        }

        let plan = UpdatePlan::build(Comment::schema(), current.key(), updates)?;
        reject_blank(&plan, "content")?;
        if let Some(SqlArg::Integer(parent)) = plan.value_of("parent_comment_id") {
            if *parent == id.value() {
                return Err(AppError::BadRequest(format!(
                    "comment {} cannot be its own parent",
                    id
                )));
            }
            ensure_reference(&self.db, "Comments", "parent_comment", *parent).await?;
        }

        self.updates.execute(&plan).await?;
        info!("Updated comment {} ({} fields)", id, plan.assignments().len());
        self.get(id).await
    }

    /// Soft delete; returns the rewritten comment
    pub async fn delete(&self, id: CommentId) -> AppResult<Comment> {
        self.get(id).await?;

        let mut tx = self.db.begin().await?;

        sqlx::query("UPDATE Comments SET content = ?, likes = 0, user_id = ? WHERE id = ?")
            .bind(DELETED_CONTENT)
            .bind(DELETED_USER)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::StorageError(format!("Failed to delete comment {}: {}", id, e))
            })?;

        for table in ["PostComments", "ProjectComments"] {
            sqlx::query(&format!("UPDATE {} SET user_id = ? WHERE comment_id = ?", table))
                .bind(DELETED_USER)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::StorageError(format!(
                        "Failed to detach comment {} in {}: {}",
                        id, table, e
                    ))
                })?;
        }

        sqlx::query("DELETE FROM CommentLikes WHERE comment_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::StorageError(format!("Failed to clear likes of comment {}: {}", id, e))
            })?;

        tx.commit()
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to commit delete: {}", e)))?;

        info!("Soft-deleted comment {}", id);
        self.get(id).await
    }

    pub async fn like(&self, username: &str, id: CommentId) -> AppResult<ToggleOutcome> {
        if self.get(id).await?.is_deleted() {
            return Err(AppError::BadRequest(format!("comment {} has been deleted", id)));
        }
        self.relationships.like(username, LikeTarget::Comment(id)).await
    }

    pub async fn unlike(&self, username: &str, id: CommentId) -> AppResult<ToggleOutcome> {
        self.relationships.unlike(username, LikeTarget::Comment(id)).await
    }

    pub async fn is_liked(&self, username: &str, id: CommentId) -> AppResult<bool> {
        self.relationships.is_liked(username, LikeTarget::Comment(id)).await
    }
}
