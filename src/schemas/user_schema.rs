use super::{EntitySchema, FieldKind, FieldSpec};

pub static USER_SCHEMA: EntitySchema = EntitySchema {
    entity: "user",
    table: "Users",
    key_column: "id",
    fields: &[
        FieldSpec::new("username", "username", FieldKind::Text),
        FieldSpec::new("bio", "bio", FieldKind::Text),
        FieldSpec::new("picture", "picture", FieldKind::Text),
        FieldSpec::new("links", "links", FieldKind::StringList),
        FieldSpec::new("created_on", "creation_date", FieldKind::Timestamp),
    ],
};
