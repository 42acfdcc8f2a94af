// Schema definitions - static allow-lists of updatable attributes per entity
//
// Each entity publishes the attribute names a caller may put in a partial
// update, and the fixed column each name writes to. Column names used in
// generated SQL only ever come from these tables.

pub mod comment_schema;
pub mod post_schema;
pub mod project_schema;
pub mod user_schema;

pub use comment_schema::COMMENT_SCHEMA;
pub use post_schema::POST_SCHEMA;
pub use project_schema::PROJECT_SCHEMA;
pub use user_schema::USER_SCHEMA;

/// Storage shape of an updatable attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Small integer enum (project status)
    SmallInt,
    /// Required reference to another row
    Reference,
    /// Nullable reference; JSON `null` clears it
    OptionalReference,
    /// Ordered sequence of strings, stored through the list codec
    StringList,
    /// RFC 3339 timestamp
    Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Public (JSON) attribute name
    pub name: &'static str,
    /// Column the attribute is stored in
    pub column: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self { name, column, kind }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct EntitySchema {
    pub entity: &'static str,
    pub table: &'static str,
    pub key_column: &'static str,
    pub fields: &'static [FieldSpec],
}

impl EntitySchema {
    /// Case-insensitive lookup of a public attribute name
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields
            .iter()
            .find(|spec| spec.name.eq_ignore_ascii_case(name))
    }

    pub fn allows(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|spec| spec.name)
    }
}
