use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    /// Entity or relationship absent
    NotFound(String),
    /// Update map names an attribute outside the entity's allow-list
    FieldNotAllowed(String),
    EmptyUpdate,
    EmptyUsername,
    EditWindowExpired(String),
    AlreadyFollowing(String),
    NotFollowing(String),
    /// A follow insert reported zero affected rows
    InsertFailed(String),
    /// A follow delete reported zero affected rows
    NoSuchRelationship(String),
    /// A value's JSON shape does not fit the target field
    InvalidValue(String),
    BadRequest(String),
    EncodingError(String),
    StorageError(String),
    Internal(String),
}

impl AppError {
    /// Short category label rendered in error responses
    pub fn label(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::FieldNotAllowed(_) => "field_not_allowed",
            AppError::EmptyUpdate => "empty_update",
            AppError::EmptyUsername => "empty_username",
            AppError::EditWindowExpired(_) => "edit_window_expired",
            AppError::AlreadyFollowing(_) => "already_following",
            AppError::NotFollowing(_) => "not_following",
            AppError::InsertFailed(_) => "insert_failed",
            AppError::NoSuchRelationship(_) => "no_such_relationship",
            AppError::InvalidValue(_) => "invalid_value",
            AppError::BadRequest(_) => "bad_request",
            AppError::EncodingError(_) => "encoding_error",
            AppError::StorageError(_) => "storage_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::FieldNotAllowed(_)
            | AppError::EmptyUpdate
            | AppError::EmptyUsername
            | AppError::EditWindowExpired(_)
            | AppError::InvalidValue(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::AlreadyFollowing(_)
            | AppError::NotFollowing(_)
            | AppError::NoSuchRelationship(_) => StatusCode::CONFLICT,
            AppError::InsertFailed(_)
            | AppError::EncodingError(_)
            | AppError::StorageError(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::FieldNotAllowed(field) => {
                write!(f, "Field '{}' is not allowed to be updated", field)
            }
            AppError::EmptyUpdate => write!(f, "Update contains no fields"),
            AppError::EmptyUsername => write!(f, "Username cannot be empty"),
            AppError::EditWindowExpired(msg) => write!(f, "Edit window expired: {}", msg),
            AppError::AlreadyFollowing(msg) => write!(f, "Already following: {}", msg),
            AppError::NotFollowing(msg) => write!(f, "Not following: {}", msg),
            AppError::InsertFailed(msg) => write!(f, "Insert failed: {}", msg),
            AppError::NoSuchRelationship(msg) => write!(f, "No such relationship: {}", msg),
            AppError::InvalidValue(msg) => write!(f, "Invalid value: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::EncodingError(msg) => write!(f, "Encoding error: {}", msg),
            AppError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("{}", self);
            "Internal server error".to_string()
        } else {
            tracing::info!("Request rejected: {}", self);
            self.to_string()
        };

        let body = Json(json!({
            "error": self.label(),
            "message": message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::EncodingError(err.to_string())
    }
}

// Extractor rejections carry plain-text bodies; route them through the JSON error shape.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::EmptyUpdate.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::EmptyUsername.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::FieldNotAllowed("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::EditWindowExpired("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::AlreadyFollowing("x".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(AppError::NotFollowing("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::StorageError("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::EncodingError("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_json_rejection_is_bad_request() {
        use axum::extract::FromRequest;

        let request = axum::http::Request::builder()
            .header("content-type", "application/json")
            .body(axum::body::Body::from("{not json"))
            .unwrap();
        let rejection = axum::Json::<serde_json::Value>::from_request(request, &())
            .await
            .unwrap_err();

        let err = AppError::from(rejection);
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_internal_errors_hide_details() {
        let response = AppError::StorageError("UNIQUE constraint failed: Users.username".into())
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "storage_error");
        assert_eq!(body["message"], "Internal server error");
        assert_eq!(body["status"], 500);
    }
}
