//! Trace domain
//!
//! - `service` - persistence bridge between the in-memory registry and
//!   the durable store (the single write path for trace data)
//! - `feed` - in-process broadcast topic for live SSE subscribers

mod feed;
mod service;

pub use feed::{FeedPhase, LiveFeed, TraceFeedEvent};
pub use service::{StartTraceArgs, TraceService};
