// Services - CRUD and domain rules layered over the two engines

pub mod comment_service;
pub mod feed_service;
pub mod post_service;
pub mod project_service;
pub mod user_service;

pub use comment_service::CommentService;
pub use feed_service::FeedService;
pub use post_service::PostService;
pub use project_service::ProjectService;
pub use user_service::UserService;

use crate::error::{AppError, AppResult};
use crate::infrastructure::{Database, SqlArg, UpdatePlan};

/// A payload field pointing at another row must name one that exists.
pub(crate) async fn ensure_reference(
    db: &Database,
    table: &'static str,
    field: &str,
    id: i64,
) -> AppResult<()> {
    if db.row_exists(table, id).await? {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!(
            "{} {} does not reference an existing row",
            field, id
        )))
    }
}

/// Required text columns cannot be updated to the empty string.
pub(crate) fn reject_blank(plan: &UpdatePlan, column: &str) -> AppResult<()> {
    match plan.value_of(column) {
        Some(SqlArg::Text(text)) if text.is_empty() => Err(AppError::BadRequest(format!(
            "{} cannot be empty",
            column
        ))),
        _ => Ok(()),
    }
}
