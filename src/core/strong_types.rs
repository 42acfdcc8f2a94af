// Strong Types - newtype identifiers for each entity table
// Keeps a post id from being passed where a user id is expected

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the raw ID value
            pub fn value(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

entity_id!(
    /// Row id in `Users`
    UserId
);
entity_id!(
    /// Row id in `Projects`
    ProjectId
);
entity_id!(
    /// Row id in `Posts`
    PostId
);
entity_id!(
    /// Row id in `Comments`
    CommentId
);

/// Owner written into a soft-deleted comment in place of the real author
pub const DELETED_USER: UserId = UserId(-1);

impl UserId {
    pub fn is_deleted_sentinel(self) -> bool {
        self == DELETED_USER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_serialize_as_plain_integers() {
        let id = PostId::new(7);
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
        let parsed: CommentId = serde_json::from_str("12").unwrap();
        assert_eq!(parsed, CommentId(12));
    }

    #[test]
    fn test_deleted_sentinel() {
        assert!(DELETED_USER.is_deleted_sentinel());
        assert_eq!(DELETED_USER.value(), -1);
        assert!(!UserId::from(3).is_deleted_sentinel());
    }
}
