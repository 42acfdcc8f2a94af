// FeedService - posts and projects ordered by time or likes

use tracing::debug;

use crate::config::FeedConfig;
use crate::error::{AppError, AppResult};
use crate::infrastructure::rows::{self, POST_COLUMNS, PROJECT_COLUMNS};
use crate::infrastructure::Database;
use crate::models::{FeedOrder, Post, Project};

/// Resolve a requested window into (offset, limit)
pub fn feed_window(config: &FeedConfig, start: Option<i64>, count: Option<i64>) -> (i64, i64) {
    let max = i64::from(config.max_count);
    let count = count
        .unwrap_or(i64::from(config.default_count))
        .clamp(0, max);
    (start.unwrap_or(0).max(0), count)
}

#[derive(Debug, Clone)]
pub struct FeedService {
    db: Database,
    config: FeedConfig,
}

impl FeedService {
    pub fn new(db: Database, config: FeedConfig) -> Self {
        Self { db, config }
    }

    pub fn window(&self, start: Option<i64>, count: Option<i64>) -> (i64, i64) {
        feed_window(&self.config, start, count)
    }

    pub async fn posts(
        &self,
        order: FeedOrder,
        start: Option<i64>,
        count: Option<i64>,
    ) -> AppResult<Vec<Post>> {
        let (offset, limit) = self.window(start, count);
        let sql = format!(
            "SELECT {} FROM Posts ORDER BY {} LIMIT ? OFFSET ?",
            POST_COLUMNS,
            order.order_by()
        );
        debug!("Post feed {:?} offset={} limit={}", order, offset, limit);

        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to load post feed: {}", e)))?;
        rows::collect(&rows, rows::post_from_row)
    }

    pub async fn projects(
        &self,
        order: FeedOrder,
        start: Option<i64>,
        count: Option<i64>,
    ) -> AppResult<Vec<Project>> {
        let (offset, limit) = self.window(start, count);
        let sql = format!(
            "SELECT {} FROM Projects ORDER BY {} LIMIT ? OFFSET ?",
            PROJECT_COLUMNS,
            order.order_by()
        );
        debug!("Project feed {:?} offset={} limit={}", order, offset, limit);

        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.db.pool())
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to load project feed: {}", e)))?;
        rows::collect(&rows, rows::project_from_row)
    }
}
