// ProjectService - project CRUD, follows and likes

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;

use crate::core::{encode_list, Clock, ProjectId};
use crate::error::{AppError, AppResult};
use crate::infrastructure::rows::{self, PROJECT_COLUMNS};
use crate::infrastructure::{Database, PartialUpdateEngine, RelationshipEngine, SqlArg, UpdatePlan};
use crate::models::{Entity, LikeTarget, NewProject, Project, ToggleOutcome};
use crate::services::{ensure_reference, reject_blank};

#[derive(Debug, Clone)]
pub struct ProjectService {
    db: Database,
    updates: PartialUpdateEngine,
    relationships: RelationshipEngine,
    clock: Arc<dyn Clock>,
}

impl ProjectService {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self {
            updates: PartialUpdateEngine::new(db.clone()),
            relationships: RelationshipEngine::new(db.clone()),
            db,
            clock,
        }
    }

    pub async fn create(&self, new: NewProject) -> AppResult<Project> {
        if new.name.is_empty() {
            return Err(AppError::BadRequest("project name is required".to_string()));
        }
        if new.description.is_empty() {
            return Err(AppError::BadRequest("project description is required".to_string()));
        }
        ensure_reference(&self.db, "Users", "owner", new.owner.value()).await?;

        let result = sqlx::query(
            "INSERT INTO Projects (owner, name, description, status, tags, links, creation_date) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(new.owner)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.status)
        .bind(encode_list(&new.tags)?)
        .bind(encode_list(&new.links)?)
        .bind(self.clock.now())
        .execute(self.db.pool())
        .await
        .map_err(|e| AppError::StorageError(format!("Failed to create project: {}", e)))?;

        let id = ProjectId(result.last_insert_rowid());
        info!("Created project {} owned by user {}", id, new.owner);
        self.get(id).await
    }

    pub async fn get(&self, id: ProjectId) -> AppResult<Project> {
        let sql = format!("SELECT {} FROM Projects WHERE id = ?", PROJECT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.db.pool())
            .await
            .map_err(|e| {
                AppError::StorageError(format!("Failed to load project {}: {}", id, e))
            })?;

        match row {
            Some(row) => rows::project_from_row(&row),
            None => Err(AppError::NotFound(format!("project {} does not exist", id))),
        }
    }

    pub async fn update(&self, id: ProjectId, updates: &Map<String, Value>) -> AppResult<Project> {
        let current = self.get(id).await?;
        let plan = UpdatePlan::build(Project::schema(), current.key(), updates)?;

        reject_blank(&plan, "name")?;
        reject_blank(&plan, "description")?;
        if let Some(SqlArg::Integer(owner)) = plan.value_of("owner") {
            ensure_reference(&self.db, "Users", "owner", *owner).await?;
        }

        self.updates.execute(&plan).await?;
        info!("Updated project {} ({} fields)", id, plan.assignments().len());
        self.get(id).await
    }

    pub async fn delete(&self, id: ProjectId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM Projects WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await
            .map_err(|e| {
                AppError::StorageError(format!("Failed to delete project {}: {}", id, e))
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("project {} does not exist", id)));
        }
        info!("Deleted project {}", id);
        Ok(())
    }

    pub async fn follow(&self, username: &str, id: ProjectId) -> AppResult<()> {
        self.relationships.follow_project(username, id).await
    }

    pub async fn unfollow(&self, username: &str, id: ProjectId) -> AppResult<()> {
        self.relationships.unfollow_project(username, id).await
    }

    pub async fn followers(&self, id: ProjectId) -> AppResult<Vec<String>> {
        self.relationships.project_followers(id).await
    }

    pub async fn like(&self, username: &str, id: ProjectId) -> AppResult<ToggleOutcome> {
        self.relationships.like(username, LikeTarget::Project(id)).await
    }

    pub async fn unlike(&self, username: &str, id: ProjectId) -> AppResult<ToggleOutcome> {
        self.relationships.unlike(username, LikeTarget::Project(id)).await
    }

    pub async fn is_liked(&self, username: &str, id: ProjectId) -> AppResult<bool> {
        self.relationships.is_liked(username, LikeTarget::Project(id)).await
    }
}
