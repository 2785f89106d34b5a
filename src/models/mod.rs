//! Domain models for the GOAT Memory server.

pub mod user;

// Re-export commonly used types
pub use user::{GOAT_BODY, GOAT_HEART, Project, UserRecord, normalize_phone};
