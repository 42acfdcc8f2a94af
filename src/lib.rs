// Project board backend - users, projects, posts and comments with follows and likes

// Core types and primitives
pub mod core;

// Allow-listed attributes per entity
pub mod schemas;

// Persisted entities and payloads
pub mod models;

// Storage client and the update/relationship engines
pub mod infrastructure;

// Domain services
pub mod services;

// HTTP layer
pub mod api;
pub mod app_state;

// Common utilities
pub mod config;
pub mod error;

// Re-exports for convenience
pub use app_state::AppState;
pub use error::{AppError, AppResult};
