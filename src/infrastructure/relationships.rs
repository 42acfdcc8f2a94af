// Relationship Toggle Engine
//
// Follows (user -> user, user -> project) are non-idempotent: a duplicate
// follow or a missing unfollow is reported as a conflict. Likes are
// idempotent: repeating a like or unlike succeeds without touching anything.
// The like row and the target's `likes` counter change in one transaction.

use sqlx::Row;
use tracing::{debug, info};

use crate::core::{ProjectId, UserId};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::Database;
use crate::infrastructure::rows::{self, PROJECT_COLUMNS};
use crate::models::{LikeTarget, Project, ToggleOutcome};

#[derive(Debug, Clone)]
pub struct RelationshipEngine {
    db: Database,
}

impl RelationshipEngine {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Resolve a username; `side` names the role in the error message.
    pub async fn resolve_user(&self, username: &str, side: &str) -> AppResult<UserId> {
        let row = sqlx::query("SELECT id FROM Users WHERE username = ?")
            .bind(username)
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| {
                AppError::StorageError(format!("Failed to look up user '{}': {}", username, e))
            })?;

        match row {
            Some(row) => Ok(row.try_get("id")?),
            None => Err(AppError::NotFound(format!(
                "{} '{}' does not exist",
                side, username
            ))),
        }
    }

    async fn ensure_project(&self, project: ProjectId) -> AppResult<()> {
        if self.db.row_exists("Projects", project.value()).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("project {} does not exist", project)))
        }
    }

    async fn ensure_target(&self, target: LikeTarget) -> AppResult<()> {
        if self.db.row_exists(target.table(), target.id()).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!(
                "{} {} does not exist",
                target.kind(),
                target.id()
            )))
        }
    }

    // ---- user follows ----

    pub async fn follow_user(&self, follower: &str, followee: &str) -> AppResult<()> {
        let follower_id = self.resolve_user(follower, "follower").await?;
        let followee_id = self.resolve_user(followee, "followee").await?;

        if self.following(follower_id).await?.contains(&followee_id) {
            return Err(AppError::AlreadyFollowing(format!(
                "'{}' already follows '{}'",
                follower, followee
            )));
        }

        let result =
            sqlx::query("INSERT OR IGNORE INTO UserFollows (follower_id, follows_id) VALUES (?, ?)")
                .bind(follower_id)
                .bind(followee_id)
                .execute(self.db.pool())
                .await
                .map_err(|e| {
                    AppError::StorageError(format!("Failed to insert follow: {}", e))
                })?;

        if result.rows_affected() == 0 {
            return Err(AppError::InsertFailed(format!(
                "follow '{}' -> '{}' was not recorded",
                follower, followee
            )));
        }

        info!("User {} now follows {}", follower, followee);
        Ok(())
    }

    pub async fn unfollow_user(&self, follower: &str, followee: &str) -> AppResult<()> {
        let follower_id = self.resolve_user(follower, "follower").await?;
        let followee_id = self.resolve_user(followee, "followee").await?;

        if !self.following(follower_id).await?.contains(&followee_id) {
            return Err(AppError::NotFollowing(format!(
                "'{}' does not follow '{}'",
                follower, followee
            )));
        }

        let result = sqlx::query("DELETE FROM UserFollows WHERE follower_id = ? AND follows_id = ?")
            .bind(follower_id)
            .bind(followee_id)
            .execute(self.db.pool())
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to delete follow: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NoSuchRelationship(format!(
                "no follow '{}' -> '{}' to remove",
                follower, followee
            )));
        }

        info!("User {} unfollowed {}", follower, followee);
        Ok(())
    }

    /// Ids of the users `user` follows
    pub async fn following(&self, user: UserId) -> AppResult<Vec<UserId>> {
        self.user_ids(
            "SELECT follows_id AS id FROM UserFollows WHERE follower_id = ? ORDER BY follows_id",
            user,
        )
        .await
    }

    /// Ids of the users following `user`
    pub async fn followers(&self, user: UserId) -> AppResult<Vec<UserId>> {
        self.user_ids(
            "SELECT follower_id AS id FROM UserFollows WHERE follows_id = ? ORDER BY follower_id",
            user,
        )
        .await
    }

    pub async fn following_usernames(&self, user: UserId) -> AppResult<Vec<String>> {
        self.usernames(
            "SELECT u.username FROM UserFollows f JOIN Users u ON u.id = f.follows_id \
             WHERE f.follower_id = ? ORDER BY u.username",
            user.value(),
        )
        .await
    }

    pub async fn follower_usernames(&self, user: UserId) -> AppResult<Vec<String>> {
        self.usernames(
            "SELECT u.username FROM UserFollows f JOIN Users u ON u.id = f.follower_id \
             WHERE f.follows_id = ? ORDER BY u.username",
            user.value(),
        )
        .await
    }

    async fn user_ids(&self, sql: &str, user: UserId) -> AppResult<Vec<UserId>> {
        let rows = sqlx::query(sql)
            .bind(user)
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| {
                AppError::StorageError(format!("Failed to load follows of user {}: {}", user, e))
            })?;

        rows.iter()
            .map(|row| row.try_get("id").map_err(AppError::from))
            .collect()
    }

    async fn usernames(&self, sql: &str, id: i64) -> AppResult<Vec<String>> {
        let rows = sqlx::query(sql)
            .bind(id)
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to load usernames: {}", e)))?;

        rows.iter()
            .map(|row| row.try_get("username").map_err(AppError::from))
            .collect()
    }

    // ---- project follows ----

    pub async fn follow_project(&self, username: &str, project: ProjectId) -> AppResult<()> {
        let user = self.resolve_user(username, "user").await?;
        self.ensure_project(project).await?;

        if self.is_following_project(user, project).await? {
            return Err(AppError::AlreadyFollowing(format!(
                "'{}' already follows project {}",
                username, project
            )));
        }

        let result =
            sqlx::query("INSERT OR IGNORE INTO ProjectFollows (user_id, project_id) VALUES (?, ?)")
                .bind(user)
                .bind(project)
                .execute(self.db.pool())
                .await
                .map_err(|e| {
                    AppError::StorageError(format!("Failed to insert project follow: {}", e))
                })?;

        if result.rows_affected() == 0 {
            return Err(AppError::InsertFailed(format!(
                "follow '{}' -> project {} was not recorded",
                username, project
            )));
        }

        info!("User {} now follows project {}", username, project);
        Ok(())
    }

    pub async fn unfollow_project(&self, username: &str, project: ProjectId) -> AppResult<()> {
        let user = self.resolve_user(username, "user").await?;
        self.ensure_project(project).await?;

        if !self.is_following_project(user, project).await? {
            return Err(AppError::NotFollowing(format!(
                "'{}' does not follow project {}",
                username, project
            )));
        }

        let result = sqlx::query("DELETE FROM ProjectFollows WHERE user_id = ? AND project_id = ?")
            .bind(user)
            .bind(project)
            .execute(self.db.pool())
            .await
            .map_err(|e| {
                AppError::StorageError(format!("Failed to delete project follow: {}", e))
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NoSuchRelationship(format!(
                "no follow '{}' -> project {} to remove",
                username, project
            )));
        }

        info!("User {} unfollowed project {}", username, project);
        Ok(())
    }

    async fn is_following_project(&self, user: UserId, project: ProjectId) -> AppResult<bool> {
        let row = sqlx::query("SELECT 1 FROM ProjectFollows WHERE user_id = ? AND project_id = ?")
            .bind(user)
            .bind(project)
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| {
                AppError::StorageError(format!("Failed to check project follow: {}", e))
            })?;
        Ok(row.is_some())
    }

    /// Usernames of the users following `project`
    pub async fn project_followers(&self, project: ProjectId) -> AppResult<Vec<String>> {
        self.ensure_project(project).await?;
        self.usernames(
            "SELECT u.username FROM ProjectFollows f JOIN Users u ON u.id = f.user_id \
             WHERE f.project_id = ? ORDER BY u.username",
            project.value(),
        )
        .await
    }

    pub async fn followed_projects(&self, user: UserId) -> AppResult<Vec<Project>> {
        let sql = format!(
            "SELECT {} FROM Projects WHERE id IN \
             (SELECT project_id FROM ProjectFollows WHERE user_id = ?) ORDER BY id",
            PROJECT_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(user)
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| {
                AppError::StorageError(format!(
                    "Failed to load projects followed by user {}: {}",
                    user, e
                ))
            })?;
        rows::collect(&rows, rows::project_from_row)
    }

    // ---- likes ----

    pub async fn like(&self, username: &str, target: LikeTarget) -> AppResult<ToggleOutcome> {
        let user = self.resolve_user(username, "user").await?;
        self.ensure_target(target).await?;
        let (likes_table, column) = target.likes_table();

        let mut tx = self.db.begin().await?;

        let inserted = sqlx::query(&format!(
            "INSERT OR IGNORE INTO {} (user_id, {}) VALUES (?, ?)",
            likes_table, column
        ))
        .bind(user)
        .bind(target.id())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::StorageError(format!("Failed to insert {} like: {}", target.kind(), e))
        })?
        .rows_affected();

        if inserted > 0 {
            sqlx::query(&format!(
                "UPDATE {} SET likes = likes + 1 WHERE id = ?",
                target.table()
            ))
            .bind(target.id())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::StorageError(format!(
                    "Failed to increment {} {} likes: {}",
                    target.kind(),
                    target.id(),
                    e
                ))
            })?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to commit like: {}", e)))?;

        if inserted > 0 {
            debug!("{} liked {} {}", username, target.kind(), target.id());
            Ok(ToggleOutcome::Changed)
        } else {
            Ok(ToggleOutcome::Unchanged)
        }
    }

    pub async fn unlike(&self, username: &str, target: LikeTarget) -> AppResult<ToggleOutcome> {
        let user = self.resolve_user(username, "user").await?;
        self.ensure_target(target).await?;
        let (likes_table, column) = target.likes_table();

        let mut tx = self.db.begin().await?;

        let deleted = sqlx::query(&format!(
            "DELETE FROM {} WHERE user_id = ? AND {} = ?",
            likes_table, column
        ))
        .bind(user)
        .bind(target.id())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::StorageError(format!("Failed to delete {} like: {}", target.kind(), e))
        })?
        .rows_affected();

        if deleted > 0 {
            sqlx::query(&format!(
                "UPDATE {} SET likes = likes - 1 WHERE id = ?",
                target.table()
            ))
            .bind(target.id())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::StorageError(format!(
                    "Failed to decrement {} {} likes: {}",
                    target.kind(),
                    target.id(),
                    e
                ))
            })?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to commit unlike: {}", e)))?;

        if deleted > 0 {
            debug!("{} unliked {} {}", username, target.kind(), target.id());
            Ok(ToggleOutcome::Changed)
        } else {
            Ok(ToggleOutcome::Unchanged)
        }
    }

    pub async fn is_liked(&self, username: &str, target: LikeTarget) -> AppResult<bool> {
        let user = self.resolve_user(username, "user").await?;
        self.ensure_target(target).await?;
        let (likes_table, column) = target.likes_table();

        let row = sqlx::query(&format!(
            "SELECT 1 FROM {} WHERE user_id = ? AND {} = ?",
            likes_table, column
        ))
        .bind(user)
        .bind(target.id())
        .fetch_optional(self.db.pool())
        .await
        .map_err(|e| {
            AppError::StorageError(format!("Failed to check {} like: {}", target.kind(), e))
        })?;

        Ok(row.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PostId;

    async fn engine_with_users(names: &[&str]) -> (Database, RelationshipEngine) {
        let db = Database::new_in_memory().await.unwrap();
        for name in names {
            sqlx::query("INSERT INTO Users (username, creation_date) VALUES (?, '2024-01-01T00:00:00Z')")
                .bind(*name)
                .execute(db.pool())
                .await
                .unwrap();
        }
        let engine = RelationshipEngine::new(db.clone());
        (db, engine)
    }

    async fn seed_post(db: &Database) {
        sqlx::query(
            "INSERT INTO Projects (owner, name, description, creation_date) \
             VALUES (1, 'board', 'desc', '2024-01-01T00:00:00Z')",
        )
        .execute(db.pool())
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO Posts (user_id, project_id, content, creation_date) \
             VALUES (1, 1, 'hello', '2024-01-01T00:00:00Z')",
        )
        .execute(db.pool())
        .await
        .unwrap();
    }

    async fn count(db: &Database, sql: &str) -> i64 {
        sqlx::query(sql)
            .fetch_one(db.pool())
            .await
            .unwrap()
            .get::<i64, _>(0)
    }

    #[tokio::test]
    async fn test_follow_then_duplicate_is_conflict() {
        let (db, engine) = engine_with_users(&["alice", "bob"]).await;

        engine.follow_user("bob", "alice").await.unwrap();
        let err = engine.follow_user("bob", "alice").await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyFollowing(_)));
        assert_eq!(count(&db, "SELECT COUNT(*) FROM UserFollows").await, 1);

        assert_eq!(engine.following(UserId(2)).await.unwrap(), vec![UserId(1)]);
        assert_eq!(
            engine.follower_usernames(UserId(1)).await.unwrap(),
            vec!["bob".to_string()]
        );
    }

    #[tokio::test]
    async fn test_unfollow_twice_is_not_following() {
        let (_db, engine) = engine_with_users(&["alice", "bob"]).await;

        engine.follow_user("bob", "alice").await.unwrap();
        engine.unfollow_user("bob", "alice").await.unwrap();
        let err = engine.unfollow_user("bob", "alice").await.unwrap_err();
        assert!(matches!(err, AppError::NotFollowing(_)));
    }

    #[tokio::test]
    async fn test_not_found_names_the_missing_side() {
        let (_db, engine) = engine_with_users(&["alice"]).await;

        let err = engine.follow_user("bob", "alice").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m.contains("follower")));

        let err = engine.follow_user("alice", "bob").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m.contains("followee")));
    }

    #[tokio::test]
    async fn test_project_follow_policy() {
        let (db, engine) = engine_with_users(&["alice"]).await;
        seed_post(&db).await;

        engine.follow_project("alice", ProjectId(1)).await.unwrap();
        let err = engine.follow_project("alice", ProjectId(1)).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyFollowing(_)));

        assert_eq!(
            engine.project_followers(ProjectId(1)).await.unwrap(),
            vec!["alice".to_string()]
        );
        assert_eq!(engine.followed_projects(UserId(1)).await.unwrap().len(), 1);

        engine.unfollow_project("alice", ProjectId(1)).await.unwrap();
        let err = engine.unfollow_project("alice", ProjectId(1)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFollowing(_)));

        let err = engine.follow_project("alice", ProjectId(9)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_like_is_idempotent() {
        let (db, engine) = engine_with_users(&["alice"]).await;
        seed_post(&db).await;
        let target = LikeTarget::Post(PostId(1));

        assert_eq!(engine.like("alice", target).await.unwrap(), ToggleOutcome::Changed);
        assert_eq!(engine.like("alice", target).await.unwrap(), ToggleOutcome::Unchanged);

        assert_eq!(count(&db, "SELECT COUNT(*) FROM PostLikes").await, 1);
        assert_eq!(count(&db, "SELECT likes FROM Posts WHERE id = 1").await, 1);
        assert!(engine.is_liked("alice", target).await.unwrap());
    }

    #[tokio::test]
    async fn test_unlike_without_like_is_noop() {
        let (db, engine) = engine_with_users(&["alice"]).await;
        seed_post(&db).await;
        let target = LikeTarget::Project(ProjectId(1));

        assert_eq!(engine.unlike("alice", target).await.unwrap(), ToggleOutcome::Unchanged);
        assert_eq!(count(&db, "SELECT likes FROM Projects WHERE id = 1").await, 0);

        engine.like("alice", target).await.unwrap();
        assert_eq!(engine.unlike("alice", target).await.unwrap(), ToggleOutcome::Changed);
        assert_eq!(count(&db, "SELECT likes FROM Projects WHERE id = 1").await, 0);
        assert!(!engine.is_liked("alice", target).await.unwrap());
    }

    #[tokio::test]
    async fn test_like_missing_target() {
        let (_db, engine) = engine_with_users(&["alice"]).await;
        let err = engine
            .like("alice", LikeTarget::Post(PostId(42)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m.contains("post 42")));
    }
}
