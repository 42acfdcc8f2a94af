use super::{EntitySchema, FieldKind, FieldSpec};

pub static POST_SCHEMA: EntitySchema = EntitySchema {
    entity: "post",
    table: "Posts",
    key_column: "id",
    fields: &[
        FieldSpec::new("user", "user_id", FieldKind::Reference),
        FieldSpec::new("project", "project_id", FieldKind::Reference),
        FieldSpec::new("content", "content", FieldKind::Text),
        FieldSpec::new("created_on", "creation_date", FieldKind::Timestamp),
    ],
};
