// UserService - user CRUD, partial updates and follow queries

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;

use crate::core::{encode_list, Clock, UserId};
use crate::error::{AppError, AppResult};
use crate::infrastructure::rows::{self, USER_COLUMNS};
use crate::infrastructure::{Database, PartialUpdateEngine, RelationshipEngine};
use crate::models::{NewUser, Project, User};

/// Counter table, like table and its target column
const LIKED_TARGETS: [(&str, &str, &str); 3] = [
    ("Posts", "PostLikes", "post_id"),
    ("Comments", "CommentLikes", "comment_id"),
    ("Projects", "ProjectLikes", "project_id"),
];

#[derive(Debug, Clone)]
pub struct UserService {
    db: Database,
    updates: PartialUpdateEngine,
    relationships: RelationshipEngine,
    clock: Arc<dyn Clock>,
}

impl UserService {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self {
            updates: PartialUpdateEngine::new(db.clone()),
            relationships: RelationshipEngine::new(db.clone()),
            db,
            clock,
        }
    }

    pub async fn create(&self, new: NewUser) -> AppResult<User> {
        if new.username.is_empty() {
            return Err(AppError::EmptyUsername);
        }

        let result = sqlx::query(
            "INSERT INTO Users (username, bio, picture, links, creation_date) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&new.username)
        .bind(&new.bio)
        .bind(&new.picture)
        .bind(encode_list(&new.links)?)
        .bind(self.clock.now())
        .execute(self.db.pool())
        .await
        .map_err(|e| {
            AppError::StorageError(format!("Failed to create user '{}': {}", new.username, e))
        })?;

        let id = UserId(result.last_insert_rowid());
        info!("Created user {} ({})", new.username, id);
        self.get_by_id(id).await
    }

    pub async fn get(&self, username: &str) -> AppResult<User> {
        let sql = format!("SELECT {} FROM Users WHERE username = ?", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(username)
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| {
                AppError::StorageError(format!("Failed to load user '{}': {}", username, e))
            })?;

        match row {
            Some(row) => rows::user_from_row(&row),
            None => Err(AppError::NotFound(format!("user '{}' does not exist", username))),
        }
    }

    pub async fn get_by_id(&self, id: UserId) -> AppResult<User> {
        let sql = format!("SELECT {} FROM Users WHERE id = ?", USER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to load user {}: {}", id, e)))?;

        match row {
            Some(row) => rows::user_from_row(&row),
            None => Err(AppError::NotFound(format!("user {} does not exist", id))),
        }
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        let sql = format!("SELECT {} FROM Users ORDER BY id", USER_COLUMNS);
        let rows = sqlx::query(&sql)
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to list users: {}", e)))?;
        rows::collect(&rows, rows::user_from_row)
    }

    /// Apply a partial update to the user named `username`; returns the new snapshot.
    pub async fn update(&self, username: &str, updates: &Map<String, Value>) -> AppResult<User> {
        let blank_username = updates
            .iter()
            .any(|(key, value)| key.eq_ignore_ascii_case("username") && value.as_str() == Some(""));
        if blank_username {
            return Err(AppError::EmptyUsername);
        }

        let current = self.get(username).await?;
        self.updates.apply(&current, updates).await?;
        info!("Updated user {} ({} fields)", current.id, updates.len());
        self.get_by_id(current.id).await
    }

    /// Hard delete. Like rows go with the user through the foreign keys, so the
    /// counters they fed are decremented first, in the same transaction.
    pub async fn delete(&self, username: &str) -> AppResult<()> {
        let user = self.relationships.resolve_user(username, "user").await?;

        let mut tx = self.db.begin().await?;

        for (table, likes_table, column) in LIKED_TARGETS {
            sqlx::query(&format!(
                "UPDATE {} SET likes = likes - 1 WHERE id IN (SELECT {} FROM {} WHERE user_id = ?)",
                table, column, likes_table
            ))
            .bind(user)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::StorageError(format!(
                    "Failed to release {} likes of user '{}': {}",
                    table, username, e
                ))
            })?;
        }

        let result = sqlx::query("DELETE FROM Users WHERE id = ?")
            .bind(user)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::StorageError(format!("Failed to delete user '{}': {}", username, e))
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user '{}' does not exist", username)));
        }

        tx.commit()
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to commit user delete: {}", e)))?;

        info!("Deleted user {}", username);
        Ok(())
    }

    pub async fn follow(&self, follower: &str, followee: &str) -> AppResult<()> {
        self.relationships.follow_user(follower, followee).await
    }

    pub async fn unfollow(&self, follower: &str, followee: &str) -> AppResult<()> {
        self.relationships.unfollow_user(follower, followee).await
    }

    pub async fn following(&self, username: &str) -> AppResult<Vec<UserId>> {
        let user = self.relationships.resolve_user(username, "user").await?;
        self.relationships.following(user).await
    }

    pub async fn followers(&self, username: &str) -> AppResult<Vec<UserId>> {
        let user = self.relationships.resolve_user(username, "user").await?;
        self.relationships.followers(user).await
    }

    pub async fn following_usernames(&self, username: &str) -> AppResult<Vec<String>> {
        let user = self.relationships.resolve_user(username, "user").await?;
        self.relationships.following_usernames(user).await
    }

    pub async fn follower_usernames(&self, username: &str) -> AppResult<Vec<String>> {
        let user = self.relationships.resolve_user(username, "user").await?;
        self.relationships.follower_usernames(user).await
    }

    pub async fn followed_projects(&self, username: &str) -> AppResult<Vec<Project>> {
        let user = self.relationships.resolve_user(username, "user").await?;
        self.relationships.followed_projects(user).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CommentId, ManualClock, PostId, ProjectId};
    use crate::models::LikeTarget;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use sqlx::Row;

    async fn service() -> UserService {
        service_with_db().await.0
    }

    async fn service_with_db() -> (UserService, Database) {
        let db = Database::new_in_memory().await.unwrap();
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 12, 23, 12, 0, 0).unwrap(),
        ));
        (UserService::new(db.clone(), clock), db)
    }

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            bio: String::new(),
            links: vec![],
            picture: String::new(),
        }
    }

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let users = service().await;
        let alice = users.create(new_user("alice")).await.unwrap();

        assert_eq!(alice.username, "alice");
        assert!(alice.links.is_empty());
        assert_eq!(alice.created_on, Utc.with_ymd_and_hms(2024, 12, 23, 12, 0, 0).unwrap());
        assert_eq!(users.get("alice").await.unwrap(), alice);
        assert!(matches!(users.get("nobody").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_and_duplicate_username() {
        let users = service().await;
        assert!(matches!(
            users.create(new_user("")).await,
            Err(AppError::EmptyUsername)
        ));

        users.create(new_user("alice")).await.unwrap();
        assert!(matches!(
            users.create(new_user("alice")).await,
            Err(AppError::StorageError(_))
        ));
    }

    #[tokio::test]
    async fn test_update_renames_and_sets_links() {
        let users = service().await;
        users.create(new_user("alice")).await.unwrap();

        let updated = users
            .update("alice", &map(json!({"username": "alicia", "links": ["x", "y"]})))
            .await
            .unwrap();
        assert_eq!(updated.username, "alicia");
        assert_eq!(updated.links, vec!["x".to_string(), "y".to_string()]);
        assert!(users.get("alice").await.is_err());
    }

    #[tokio::test]
    async fn test_update_rejects_empty_username_first() {
        let users = service().await;
        // Rejected even though the user does not exist.
        let err = users
            .update("ghost", &map(json!({"Username": ""})))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmptyUsername));
    }

    #[tokio::test]
    async fn test_update_unknown_field_leaves_user_unchanged() {
        let users = service().await;
        let before = users.create(new_user("alice")).await.unwrap();

        let err = users
            .update("alice", &map(json!({"bio": "changed", "likes": 3})))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::FieldNotAllowed(_)));
        assert_eq!(users.get("alice").await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_delete() {
        let users = service().await;
        users.create(new_user("alice")).await.unwrap();
        users.delete("alice").await.unwrap();
        assert!(matches!(users.delete("alice").await, Err(AppError::NotFound(_))));
        assert!(users.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_releases_like_counters() {
        let (users, db) = service_with_db().await;
        users.create(new_user("alice")).await.unwrap();
        users.create(new_user("bob")).await.unwrap();
        for sql in [
            "INSERT INTO Projects (owner, name, description, creation_date) \
             VALUES (1, 'board', 'd', '2024-01-01T00:00:00Z')",
            "INSERT INTO Posts (user_id, project_id, content, creation_date) \
             VALUES (1, 1, 'hello', '2024-01-01T00:00:00Z')",
            "INSERT INTO Comments (user_id, content, creation_date) \
             VALUES (1, 'hi', '2024-01-01T00:00:00Z')",
        ] {
            sqlx::query(sql).execute(db.pool()).await.unwrap();
        }

        let relationships = RelationshipEngine::new(db.clone());
        for liker in ["alice", "bob"] {
            relationships
                .like(liker, LikeTarget::Post(PostId(1)))
                .await
                .unwrap();
            relationships
                .like(liker, LikeTarget::Comment(CommentId(1)))
                .await
                .unwrap();
        }
        relationships
            .like("bob", LikeTarget::Project(ProjectId(1)))
            .await
            .unwrap();

        users.delete("bob").await.unwrap();

        for (table, likes_table, column) in LIKED_TARGETS {
            let counter: i64 = sqlx::query(&format!("SELECT likes FROM {} WHERE id = 1", table))
                .fetch_one(db.pool())
                .await
                .unwrap()
                .get(0);
            let rows: i64 = sqlx::query(&format!(
                "SELECT COUNT(*) FROM {} WHERE {} = 1",
                likes_table, column
            ))
            .fetch_one(db.pool())
            .await
            .unwrap()
            .get(0);
            assert_eq!(counter, rows, "{} counter out of step", table);
        }
    }

    #[tokio::test]
    async fn test_follow_lists() {
        let users = service().await;
        let alice = users.create(new_user("alice")).await.unwrap();
        let bob = users.create(new_user("bob")).await.unwrap();

        users.follow("bob", "alice").await.unwrap();
        assert_eq!(users.following("bob").await.unwrap(), vec![alice.id]);
        assert_eq!(users.followers("alice").await.unwrap(), vec![bob.id]);
        assert_eq!(
            users.following_usernames("bob").await.unwrap(),
            vec!["alice".to_string()]
        );
        assert!(users.follower_usernames("bob").await.unwrap().is_empty());
    }
}
