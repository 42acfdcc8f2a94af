// Database - the explicitly constructed storage client
// Owns the SQLite pool; engines and services each hold a clone.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::str::FromStr;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};

const SCHEMA: &[(&str, &str)] = &[
    (
        "Users",
        r#"
        CREATE TABLE IF NOT EXISTS Users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE CHECK (username <> ''),
            bio TEXT NOT NULL DEFAULT '',
            picture TEXT NOT NULL DEFAULT '',
            links TEXT NOT NULL DEFAULT '[]',
            creation_date TEXT NOT NULL
        )
        "#,
    ),
    (
        "Projects",
        r#"
        CREATE TABLE IF NOT EXISTS Projects (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner INTEGER NOT NULL REFERENCES Users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            status INTEGER NOT NULL DEFAULT 0,
            likes INTEGER NOT NULL DEFAULT 0,
            tags TEXT NOT NULL DEFAULT '[]',
            links TEXT NOT NULL DEFAULT '[]',
            creation_date TEXT NOT NULL
        )
        "#,
    ),
    (
        "Posts",
        r#"
        CREATE TABLE IF NOT EXISTS Posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES Users(id) ON DELETE CASCADE,
            project_id INTEGER NOT NULL REFERENCES Projects(id) ON DELETE CASCADE,
            content TEXT NOT NULL,
            likes INTEGER NOT NULL DEFAULT 0,
            creation_date TEXT NOT NULL
        )
        "#,
    ),
    // user_id has no foreign key: soft-deleted comments point at the -1 sentinel.
    (
        "Comments",
        r#"
        CREATE TABLE IF NOT EXISTS Comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            content TEXT NOT NULL,
            likes INTEGER NOT NULL DEFAULT 0,
            creation_date TEXT NOT NULL,
            parent_comment_id INTEGER REFERENCES Comments(id)
        )
        "#,
    ),
    (
        "PostComments",
        r#"
        CREATE TABLE IF NOT EXISTS PostComments (
            user_id INTEGER NOT NULL,
            post_id INTEGER NOT NULL REFERENCES Posts(id) ON DELETE CASCADE,
            comment_id INTEGER NOT NULL REFERENCES Comments(id) ON DELETE CASCADE,
            PRIMARY KEY (post_id, comment_id)
        )
        "#,
    ),
    (
        "ProjectComments",
        r#"
        CREATE TABLE IF NOT EXISTS ProjectComments (
            user_id INTEGER NOT NULL,
            project_id INTEGER NOT NULL REFERENCES Projects(id) ON DELETE CASCADE,
            comment_id INTEGER NOT NULL REFERENCES Comments(id) ON DELETE CASCADE,
            PRIMARY KEY (project_id, comment_id)
        )
        "#,
    ),
    (
        "UserFollows",
        r#"
        CREATE TABLE IF NOT EXISTS UserFollows (
            follower_id INTEGER NOT NULL REFERENCES Users(id) ON DELETE CASCADE,
            follows_id INTEGER NOT NULL REFERENCES Users(id) ON DELETE CASCADE,
            PRIMARY KEY (follower_id, follows_id)
        )
        "#,
    ),
    (
        "ProjectFollows",
        r#"
        CREATE TABLE IF NOT EXISTS ProjectFollows (
            user_id INTEGER NOT NULL REFERENCES Users(id) ON DELETE CASCADE,
            project_id INTEGER NOT NULL REFERENCES Projects(id) ON DELETE CASCADE,
            PRIMARY KEY (user_id, project_id)
        )
        "#,
    ),
    (
        "PostLikes",
        r#"
        CREATE TABLE IF NOT EXISTS PostLikes (
            user_id INTEGER NOT NULL REFERENCES Users(id) ON DELETE CASCADE,
            post_id INTEGER NOT NULL REFERENCES Posts(id) ON DELETE CASCADE,
            PRIMARY KEY (user_id, post_id)
        )
        "#,
    ),
    (
        "CommentLikes",
        r#"
        CREATE TABLE IF NOT EXISTS CommentLikes (
            user_id INTEGER NOT NULL REFERENCES Users(id) ON DELETE CASCADE,
            comment_id INTEGER NOT NULL REFERENCES Comments(id) ON DELETE CASCADE,
            PRIMARY KEY (user_id, comment_id)
        )
        "#,
    ),
    (
        "ProjectLikes",
        r#"
        CREATE TABLE IF NOT EXISTS ProjectLikes (
            user_id INTEGER NOT NULL REFERENCES Users(id) ON DELETE CASCADE,
            project_id INTEGER NOT NULL REFERENCES Projects(id) ON DELETE CASCADE,
            PRIMARY KEY (user_id, project_id)
        )
        "#,
    ),
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_posts_user ON Posts(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_posts_project ON Posts(project_id)",
    "CREATE INDEX IF NOT EXISTS idx_posts_creation ON Posts(creation_date DESC)",
    "CREATE INDEX IF NOT EXISTS idx_projects_creation ON Projects(creation_date DESC)",
    "CREATE INDEX IF NOT EXISTS idx_comments_parent ON Comments(parent_comment_id)",
    "CREATE INDEX IF NOT EXISTS idx_comments_user ON Comments(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_user_follows_followee ON UserFollows(follows_id)",
];

#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect using the configured URL and initialise the schema
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| {
                AppError::StorageError(format!("Invalid database URL '{}': {}", config.url, e))
            })?
            .create_if_missing(true)
            .foreign_keys(true);

        // get_filename takes the options by value.
        let filename = options.clone().get_filename();
        if let Some(dir) = filename.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).map_err(|e| {
                    AppError::StorageError(format!(
                        "Failed to create database directory {}: {}",
                        dir.display(),
                        e
                    ))
                })?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::StorageError(format!("Failed to connect to {}: {}", config.url, e))
            })?;

        let db = Self { pool };
        db.initialize().await?;
        info!("Database ready at {}", config.url);
        Ok(db)
    }

    /// Private in-memory database for tests
    pub async fn new_in_memory() -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AppError::StorageError(format!("Invalid in-memory URL: {}", e)))?
            .foreign_keys(true);

        // Every connection to :memory: is a separate database, so pin the
        // pool to one connection that is never recycled.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| {
                AppError::StorageError(format!("Failed to connect to in-memory SQLite: {}", e))
            })?;

        let db = Self { pool };
        db.initialize().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables and indexes if they do not exist
    pub async fn initialize(&self) -> AppResult<()> {
        for (table, ddl) in SCHEMA {
            sqlx::query(ddl).execute(&self.pool).await.map_err(|e| {
                AppError::StorageError(format!("Failed to create {} table: {}", table, e))
            })?;
        }

        for ddl in INDEXES {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::StorageError(format!("Failed to create index: {}", e)))?;
        }

        Ok(())
    }

    pub async fn begin(&self) -> AppResult<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to begin transaction: {}", e)))
    }

    /// Health check to verify database connectivity
    pub async fn health_check(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::StorageError(format!("Database health check failed: {}", e)))?;
        Ok(())
    }

    /// Does a row with this id exist in `table`? `table` is always a crate constant.
    pub async fn row_exists(&self, table: &'static str, id: i64) -> AppResult<bool> {
        let sql = format!("SELECT 1 FROM {} WHERE id = ?", table);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::StorageError(format!("Failed to check {} row {}: {}", table, id, e))
            })?;
        Ok(row.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    #[tokio::test]
    async fn test_initialize_creates_all_tables() {
        let db = Database::new_in_memory().await.unwrap();
        let rows = sqlx::query("SELECT name FROM sqlite_master WHERE type = 'table'")
            .fetch_all(db.pool())
            .await
            .unwrap();
        let names: Vec<String> = rows.iter().map(|r| r.get("name")).collect();

        for (table, _) in SCHEMA {
            assert!(names.iter().any(|n| n == table), "missing table {}", table);
        }
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let db = Database::new_in_memory().await.unwrap();
        db.initialize().await.unwrap();
        db.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("board.db");
        let config = DatabaseConfig {
            url: format!("sqlite:{}", path.display()),
            max_connections: 2,
        };

        let db = Database::connect(&config).await.unwrap();
        db.health_check().await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_row_exists() {
        let db = Database::new_in_memory().await.unwrap();
        sqlx::query("INSERT INTO Users (username, creation_date) VALUES ('alice', '2024-01-01T00:00:00Z')")
            .execute(db.pool())
            .await
            .unwrap();

        assert!(db.row_exists("Users", 1).await.unwrap());
        assert!(!db.row_exists("Users", 2).await.unwrap());
    }
}
