use std::sync::Arc;

use crate::{
    config::Config,
    core::{Clock, SystemClock},
    error::AppResult,
    infrastructure::Database,
    services::{CommentService, FeedService, PostService, ProjectService, UserService},
};

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub users: UserService,
    pub projects: ProjectService,
    pub posts: PostService,
    pub comments: CommentService,
    pub feed: FeedService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Initialize database
        let db = Database::connect(&config.database).await?;
        Ok(Self::with_database(config, db, Arc::new(SystemClock)))
    }

    /// Wire every service onto an already-initialised database
    pub fn with_database(config: Config, db: Database, clock: Arc<dyn Clock>) -> Self {
        Self {
            users: UserService::new(db.clone(), clock.clone()),
            projects: ProjectService::new(db.clone(), clock.clone()),
            posts: PostService::new(db.clone(), clock.clone()),
            comments: CommentService::new(db.clone(), clock),
            feed: FeedService::new(db.clone(), config.feed.clone()),
            db,
            config,
        }
    }

    pub async fn health_check(&self) -> AppResult<()> {
        self.db.health_check().await
    }
}
