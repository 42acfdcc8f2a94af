// Partial-Update Engine
//
// Turns a caller-supplied map of attribute name -> JSON value into a single
// parameterised UPDATE against one row. Every key is checked against the
// entity's static allow-list before any value is converted or any SQL is
// built, so a rejected update never touches the database. Column names come
// from the allow-list; values and the row key are always bound.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{QueryBuilder, Sqlite};
use tracing::debug;

use crate::core::encode_list;
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::Database;
use crate::models::Entity;
use crate::schemas::{EntitySchema, FieldKind, FieldSpec};

/// A bound statement argument
#[derive(Debug, Clone, PartialEq)]
pub enum SqlArg {
    Null,
    Integer(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: &'static str,
    pub value: SqlArg,
}

/// A validated single-row update, ready to execute
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePlan {
    table: &'static str,
    key_column: &'static str,
    key: i64,
    assignments: Vec<Assignment>,
}

impl UpdatePlan {
    pub fn build(
        schema: &'static EntitySchema,
        key: i64,
        updates: &Map<String, Value>,
    ) -> AppResult<Self> {
        if updates.is_empty() {
            return Err(AppError::EmptyUpdate);
        }

        // Resolve every name first; nothing else happens if one is unknown.
        let mut resolved: Vec<(&'static FieldSpec, &Value)> = Vec::with_capacity(updates.len());
        for (name, value) in updates {
            let spec = schema
                .field(name)
                .ok_or_else(|| AppError::FieldNotAllowed(name.clone()))?;
            resolved.push((spec, value));
        }

        let mut assignments: Vec<Assignment> = Vec::with_capacity(resolved.len());
        for (spec, value) in resolved {
            if assignments.iter().any(|a| a.column == spec.column) {
                return Err(AppError::InvalidValue(format!(
                    "field '{}' given more than once",
                    spec.name
                )));
            }
            assignments.push(Assignment {
                column: spec.column,
                value: convert_value(spec, value)?,
            });
        }

        Ok(Self {
            table: schema.table,
            key_column: schema.key_column,
            key,
            assignments,
        })
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn key(&self) -> i64 {
        self.key
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn touches(&self, column: &str) -> bool {
        self.assignments.iter().any(|a| a.column == column)
    }

    pub fn value_of(&self, column: &str) -> Option<&SqlArg> {
        self.assignments
            .iter()
            .find(|a| a.column == column)
            .map(|a| &a.value)
    }

    pub fn query_builder(&self) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE ");
        qb.push(self.table);
        qb.push(" SET ");
        for (i, assignment) in self.assignments.iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(assignment.column);
            qb.push(" = ");
            push_arg(&mut qb, &assignment.value);
        }
        qb.push(" WHERE ");
        qb.push(self.key_column);
        qb.push(" = ");
        qb.push_bind(self.key);
        qb
    }

    /// Rendered SQL text with `?` placeholders
    pub fn sql(&self) -> String {
        self.query_builder().sql().to_string()
    }
}

fn push_arg(qb: &mut QueryBuilder<'static, Sqlite>, arg: &SqlArg) {
    match arg {
        SqlArg::Null => qb.push_bind(None::<i64>),
        SqlArg::Integer(v) => qb.push_bind(*v),
        SqlArg::Text(s) => qb.push_bind(s.clone()),
        SqlArg::Timestamp(t) => qb.push_bind(*t),
    };
}

fn as_integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn invalid(spec: &FieldSpec, expected: &str) -> AppError {
    AppError::InvalidValue(format!("field '{}' expects {}", spec.name, expected))
}

fn convert_value(spec: &FieldSpec, value: &Value) -> AppResult<SqlArg> {
    match spec.kind {
        FieldKind::Text => value
            .as_str()
            .map(|s| SqlArg::Text(s.to_string()))
            .ok_or_else(|| invalid(spec, "a string")),
        FieldKind::SmallInt => as_integer(value)
            .and_then(|v| i16::try_from(v).ok())
            .map(|v| SqlArg::Integer(v.into()))
            .ok_or_else(|| invalid(spec, "a small integer")),
        FieldKind::Reference => as_integer(value)
            .map(SqlArg::Integer)
            .ok_or_else(|| invalid(spec, "an integer id")),
        FieldKind::OptionalReference => {
            if value.is_null() {
                Ok(SqlArg::Null)
            } else {
                as_integer(value)
                    .map(SqlArg::Integer)
                    .ok_or_else(|| invalid(spec, "an integer id or null"))
            }
        }
        FieldKind::StringList => {
            let items: Vec<String> = serde_json::from_value(value.clone())
                .map_err(|_| invalid(spec, "an array of strings"))?;
            Ok(SqlArg::Text(encode_list(&items)?))
        }
        FieldKind::Timestamp => value
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| SqlArg::Timestamp(t.with_timezone(&Utc)))
            .ok_or_else(|| invalid(spec, "an RFC 3339 timestamp")),
    }
}

#[derive(Debug, Clone)]
pub struct PartialUpdateEngine {
    db: Database,
}

impl PartialUpdateEngine {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Validate `updates` against the entity's allow-list and apply them to
    /// the row identified by `current`.
    pub async fn apply<E: Entity>(&self, current: &E, updates: &Map<String, Value>) -> AppResult<u64> {
        let plan = UpdatePlan::build(E::schema(), current.key(), updates)?;
        self.execute(&plan).await
    }

    pub async fn execute(&self, plan: &UpdatePlan) -> AppResult<u64> {
        let mut qb = plan.query_builder();
        debug!("Executing partial update: {}", qb.sql());

        let result = qb.build().execute(self.db.pool()).await.map_err(|e| {
            AppError::StorageError(format!(
                "Failed to update {} row {}: {}",
                plan.table, plan.key, e
            ))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "No {} row with id {} to update",
                plan.table, plan.key
            )));
        }
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{decode_list, UserId};
    use crate::models::User;
    use crate::schemas::{COMMENT_SCHEMA, POST_SCHEMA, PROJECT_SCHEMA, USER_SCHEMA};
    use chrono::TimeZone;
    use serde_json::json;
    use sqlx::Row;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    async fn seeded() -> (Database, User) {
        let db = Database::new_in_memory().await.unwrap();
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        sqlx::query(
            "INSERT INTO Users (username, bio, links, creation_date) VALUES ('alice', 'hi', '[]', ?)",
        )
        .bind(created)
        .execute(db.pool())
        .await
        .unwrap();

        let user = User {
            id: UserId(1),
            username: "alice".to_string(),
            bio: "hi".to_string(),
            links: vec![],
            created_on: created,
            picture: String::new(),
        };
        (db, user)
    }

    #[test]
    fn test_builds_parameterised_statement() {
        let plan = UpdatePlan::build(
            &USER_SCHEMA,
            7,
            &map(json!({"bio": "new bio", "links": ["a", "b"]})),
        )
        .unwrap();

        assert_eq!(plan.sql(), "UPDATE Users SET bio = ?, links = ? WHERE id = ?");
        assert_eq!(plan.key(), 7);
        assert_eq!(
            plan.value_of("links"),
            Some(&SqlArg::Text("[\"a\",\"b\"]".to_string()))
        );
    }

    #[test]
    fn test_public_names_map_to_columns() {
        let plan =
            UpdatePlan::build(&POST_SCHEMA, 3, &map(json!({"user": 2, "project": 9}))).unwrap();
        assert_eq!(
            plan.sql(),
            "UPDATE Posts SET project_id = ?, user_id = ? WHERE id = ?"
        );

        let plan =
            UpdatePlan::build(&USER_SCHEMA, 1, &map(json!({"created_on": "2024-05-01T10:00:00Z"})))
                .unwrap();
        assert!(plan.touches("creation_date"));
    }

    #[test]
    fn test_unknown_field_rejected_before_values_checked() {
        // "links" has a bad value, but the unknown key must win.
        let err = UpdatePlan::build(
            &USER_SCHEMA,
            1,
            &map(json!({"links": 5, "password": "x"})),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::FieldNotAllowed(ref f) if f == "password"));
    }

    #[test]
    fn test_identifier_cannot_be_supplied() {
        let err = UpdatePlan::build(&PROJECT_SCHEMA, 1, &map(json!({"id": 99}))).unwrap_err();
        assert!(matches!(err, AppError::FieldNotAllowed(_)));
    }

    #[test]
    fn test_empty_update_rejected() {
        let err = UpdatePlan::build(&USER_SCHEMA, 1, &Map::new()).unwrap_err();
        assert!(matches!(err, AppError::EmptyUpdate));
    }

    #[test]
    fn test_case_insensitive_names_and_duplicates() {
        let plan = UpdatePlan::build(&USER_SCHEMA, 1, &map(json!({"BIO": "x"}))).unwrap();
        assert_eq!(plan.sql(), "UPDATE Users SET bio = ? WHERE id = ?");

        let err = UpdatePlan::build(&USER_SCHEMA, 1, &map(json!({"Bio": "x", "bio": "y"})))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidValue(_)));
    }

    #[test]
    fn test_value_shapes() {
        let err = UpdatePlan::build(&USER_SCHEMA, 1, &map(json!({"links": "one"}))).unwrap_err();
        assert!(matches!(err, AppError::InvalidValue(_)));

        let err =
            UpdatePlan::build(&PROJECT_SCHEMA, 1, &map(json!({"status": 70000}))).unwrap_err();
        assert!(matches!(err, AppError::InvalidValue(_)));

        let plan = UpdatePlan::build(&PROJECT_SCHEMA, 1, &map(json!({"status": 2.0}))).unwrap();
        assert_eq!(plan.value_of("status"), Some(&SqlArg::Integer(2)));

        let plan =
            UpdatePlan::build(&COMMENT_SCHEMA, 1, &map(json!({"parent_comment": null}))).unwrap();
        assert_eq!(plan.value_of("parent_comment_id"), Some(&SqlArg::Null));
    }

    #[tokio::test]
    async fn test_apply_updates_row() {
        let (db, user) = seeded().await;
        let engine = PartialUpdateEngine::new(db.clone());

        let affected = engine
            .apply(&user, &map(json!({"bio": "rustacean", "links": ["https://a.dev"]})))
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let row = sqlx::query("SELECT bio, links FROM Users WHERE id = 1")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(row.get::<String, _>("bio"), "rustacean");
        assert_eq!(
            decode_list(&row.get::<String, _>("links")).unwrap(),
            vec!["https://a.dev".to_string()]
        );
    }

    #[tokio::test]
    async fn test_rejected_update_leaves_row_unchanged() {
        let (db, user) = seeded().await;
        let engine = PartialUpdateEngine::new(db.clone());

        let err = engine
            .apply(&user, &map(json!({"bio": "changed", "email": "a@b.c"})))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::FieldNotAllowed(_)));

        let bio: String = sqlx::query("SELECT bio FROM Users WHERE id = 1")
            .fetch_one(db.pool())
            .await
            .unwrap()
            .get("bio");
        assert_eq!(bio, "hi");
    }

    #[tokio::test]
    async fn test_missing_row_is_not_found() {
        let (db, mut user) = seeded().await;
        let engine = PartialUpdateEngine::new(db);
        user.id = UserId(404);

        let err = engine
            .apply(&user, &map(json!({"bio": "ghost"})))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
