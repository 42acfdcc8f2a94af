use super::{EntitySchema, FieldKind, FieldSpec};

// No created_on: the edit window is measured from it.
// No user: authorship is fixed, and -1 marks a deleted comment.
pub static COMMENT_SCHEMA: EntitySchema = EntitySchema {
    entity: "comment",
    table: "Comments",
    key_column: "id",
    fields: &[
        FieldSpec::new("content", "content", FieldKind::Text),
        FieldSpec::new("parent_comment", "parent_comment_id", FieldKind::OptionalReference),
    ],
};
