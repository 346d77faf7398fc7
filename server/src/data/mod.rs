//! Data storage layer
//!
//! Provides database services for the application:
//! - `sqlite` - The durable trace store (traces, events, rollups)
//! - `types` - Shared data types used by repositories and the domain layer

pub mod sqlite;
pub mod types;

pub use sqlite::{SqliteError, SqliteService};
