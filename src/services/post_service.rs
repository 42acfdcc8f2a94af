// PostService - post CRUD, listings and likes

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;

use crate::core::{Clock, PostId, ProjectId, UserId};
use crate::error::{AppError, AppResult};
use crate::infrastructure::rows::{self, POST_COLUMNS};
use crate::infrastructure::{Database, PartialUpdateEngine, RelationshipEngine, SqlArg, UpdatePlan};
use crate::models::{Entity, LikeTarget, NewPost, Post, ToggleOutcome};
use crate::services::{ensure_reference, reject_blank};

#[derive(Debug, Clone)]
pub struct PostService {
    db: Database,
    updates: PartialUpdateEngine,
    relationships: RelationshipEngine,
    clock: Arc<dyn Clock>,
}

impl PostService {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self {
            updates: PartialUpdateEngine::new(db.clone()),
            relationships: RelationshipEngine::new(db.clone()),
            db,
            clock,
        }
    }

    pub async fn create(&self, new: NewPost) -> AppResult<Post> {
        if new.content.is_empty() {
            return Err(AppError::BadRequest("post content is required".to_string()));
        }
        ensure_reference(&self.db, "Users", "user", new.user.value()).await?;
        ensure_reference(&self.db, "Projects", "project", new.project.value()).await?;

        let result = sqlx::query(
            "INSERT INTO Posts (user_id, project_id, content, creation_date) VALUES (?, ?, ?, ?)",
        )
        .bind(new.user)
        .bind(new.project)
        .bind(&new.content)
        .bind(self.clock.now())
        .execute(self.db.pool())
        .await
        .map_err(|e| AppError::StorageError(format!("Failed to create post: {}", e)))?;

        let id = PostId(result.last_insert_rowid());
        info!("Created post {} in project {}", id, new.project);
        self.get(id).await
    }

    pub async fn get(&self, id: PostId) -> AppResult<Post> {
        let sql = format!("SELECT {} FROM Posts WHERE id = ?", POST_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to load post {}: {}", id, e)))?;

        match row {
            Some(row) => rows::post_from_row(&row),
            None => Err(AppError::NotFound(format!("post {} does not exist", id))),
        }
    }

    pub async fn by_user(&self, user: UserId) -> AppResult<Vec<Post>> {
        self.list("user_id", user.value()).await
    }

    pub async fn by_project(&self, project: ProjectId) -> AppResult<Vec<Post>> {
        self.list("project_id", project.value()).await
    }

    async fn list(&self, column: &'static str, id: i64) -> AppResult<Vec<Post>> {
        let sql = format!(
            "SELECT {} FROM Posts WHERE {} = ? ORDER BY creation_date DESC, id DESC",
            POST_COLUMNS, column
        );
        let rows = sqlx::query(&sql)
            .bind(id)
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| {
                AppError::StorageError(format!("Failed to list posts by {} {}: {}", column, id, e))
            })?;
        rows::collect(&rows, rows::post_from_row)
    }

    pub async fn update(&self, id: PostId, updates: &Map<String, Value>) -> AppResult<Post> {
        let current = self.get(id).await?;
        let plan = UpdatePlan::build(Post::schema(), current.key(), updates)?;

        reject_blank(&plan, "content")?;
        if let Some(SqlArg::Integer(user)) = plan.value_of("user_id") {
            ensure_reference(&self.db, "Users", "user", *user).await?;
        }
        if let Some(SqlArg::Integer(project)) = plan.value_of("project_id") {
            ensure_reference(&self.db, "Projects", "project", *project).await?;
        }

        self.updates.execute(&plan).await?;
        info!("Updated post {} ({} fields)", id, plan.assignments().len());
        self.get(id).await
    }

    pub async fn delete(&self, id: PostId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM Posts WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to delete post {}: {}", id, e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("post {} does not exist", id)));
        }
        info!("Deleted post {}", id);
        Ok(())
    }

    pub async fn like(&self, username: &str, id: PostId) -> AppResult<ToggleOutcome> {
        self.relationships.like(username, LikeTarget::Post(id)).await
    }

    pub async fn unlike(&self, username: &str, id: PostId) -> AppResult<ToggleOutcome> {
        self.relationships.unlike(username, LikeTarget::Post(id)).await
    }

    pub async fn is_liked(&self, username: &str, id: PostId) -> AppResult<bool> {
        self.relationships.is_liked(username, LikeTarget::Post(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    async fn service() -> (PostService, Arc<ManualClock>) {
        let db = Database::new_in_memory().await.unwrap();
        for name in ["alice", "bob"] {
            sqlx::query("INSERT INTO Users (username, creation_date) VALUES (?, '2024-01-01T00:00:00Z')")
                .bind(name)
                .execute(db.pool())
                .await
                .unwrap();
        }
        sqlx::query(
            "INSERT INTO Projects (owner, name, description, creation_date) \
             VALUES (1, 'board', 'desc', '2024-01-01T00:00:00Z')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 12, 23, 12, 0, 0).unwrap(),
        ));
        (PostService::new(db, clock.clone()), clock)
    }

    fn new_post(user: i64, content: &str) -> NewPost {
        NewPost {
            user: UserId(user),
            project: ProjectId(1),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_validates_references() {
        let (posts, _) = service().await;
        assert!(matches!(
            posts.create(new_post(9, "hi")).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            posts.create(new_post(1, "")).await,
            Err(AppError::BadRequest(_))
        ));

        let post = posts.create(new_post(1, "hi")).await.unwrap();
        assert_eq!(posts.get(post.id).await.unwrap(), post);
    }

    #[tokio::test]
    async fn test_listings_newest_first() {
        let (posts, clock) = service().await;
        let first = posts.create(new_post(1, "first")).await.unwrap();
        clock.advance(Duration::minutes(1));
        let second = posts.create(new_post(1, "second")).await.unwrap();
        posts.create(new_post(2, "other")).await.unwrap();

        let by_alice = posts.by_user(UserId(1)).await.unwrap();
        assert_eq!(
            by_alice.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );
        assert_eq!(posts.by_project(ProjectId(1)).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_update_moves_post_to_other_user() {
        let (posts, _) = service().await;
        let post = posts.create(new_post(1, "hi")).await.unwrap();

        let updated = posts
            .update(post.id, &json!({"user": 2, "content": "edited"}).as_object().cloned().unwrap())
            .await
            .unwrap();
        assert_eq!(updated.user, UserId(2));
        assert_eq!(updated.content, "edited");

        let err = posts
            .update(post.id, &json!({"likes": 100}).as_object().cloned().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::FieldNotAllowed(_)));
    }

    #[tokio::test]
    async fn test_like_counter() {
        let (posts, _) = service().await;
        let post = posts.create(new_post(1, "hi")).await.unwrap();

        posts.like("bob", post.id).await.unwrap();
        posts.like("alice", post.id).await.unwrap();
        posts.like("alice", post.id).await.unwrap();
        assert_eq!(posts.get(post.id).await.unwrap().likes, 2);
    }
}
