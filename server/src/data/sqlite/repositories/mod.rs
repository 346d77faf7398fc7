//! SQLite repositories
//!
//! Free functions over a `SqlitePool`, one module per table family:
//! - `trace` - trace rows (insert, update, complete, list, search, metrics)
//! - `event` - append-only trace event log
//! - `rollup` - aggregation table upserts and reads

pub mod event;
pub mod rollup;
pub mod trace;
