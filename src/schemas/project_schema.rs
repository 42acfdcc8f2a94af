use super::{EntitySchema, FieldKind, FieldSpec};

pub static PROJECT_SCHEMA: EntitySchema = EntitySchema {
    entity: "project",
    table: "Projects",
    key_column: "id",
    fields: &[
        FieldSpec::new("owner", "owner", FieldKind::Reference),
        FieldSpec::new("name", "name", FieldKind::Text),
        FieldSpec::new("description", "description", FieldKind::Text),
        FieldSpec::new("status", "status", FieldKind::SmallInt),
        FieldSpec::new("tags", "tags", FieldKind::StringList),
        FieldSpec::new("links", "links", FieldKind::StringList),
        FieldSpec::new("creation_date", "creation_date", FieldKind::Timestamp),
    ],
};
