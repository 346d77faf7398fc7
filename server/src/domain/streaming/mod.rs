//! Streaming generation
//!
//! - `orchestrator` - the end-to-end control flow for one generation
//! - `token_source` - provider-stream vs simulated-split strategies
//! - `messages` - typed messages emitted on the client channel

mod messages;
mod orchestrator;
mod token_source;

#[cfg(test)]
mod tests;

pub use messages::{GENERIC_ERROR_MESSAGE, StreamMessage, error_codes};
pub use orchestrator::{GenerateOptions, StreamingOrchestrator};
pub use token_source::{ProviderTokenSource, SimulatedTokenSource, TokenSource};
