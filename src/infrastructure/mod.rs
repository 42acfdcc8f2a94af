// Core infrastructure modules
pub mod database;        // Storage client and schema
pub mod partial_update;  // Allow-listed single-row updates
pub mod relationships;   // Follow and like toggles
pub mod rows;            // Row decoding

pub use database::Database;
pub use partial_update::{PartialUpdateEngine, SqlArg, UpdatePlan};
pub use relationships::RelationshipEngine;
