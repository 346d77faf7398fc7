//! Live trace feed
//!
//! In-process broadcast topic carrying trace lifecycle events to SSE
//! subscribers. Publishing is fire-and-forget: with no subscribers the
//! event is dropped.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::core::constants::LIVE_FEED_CHANNEL_CAPACITY;
use crate::data::types::TraceStatus;

/// Lifecycle phase of a feed event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedPhase {
    Started,
    Updated,
    Completed,
}

/// One trace lifecycle event on the live feed
#[derive(Debug, Clone, Serialize)]
pub struct TraceFeedEvent {
    pub trace_id: String,
    pub session_id: String,
    pub user_id: String,
    pub model_id: String,
    pub status: TraceStatus,
    pub phase: FeedPhase,
}

/// Broadcast topic for trace lifecycle events
pub struct LiveFeed {
    tx: broadcast::Sender<TraceFeedEvent>,
}

impl Default for LiveFeed {
    fn default() -> Self {
        Self::new(LIVE_FEED_CHANNEL_CAPACITY)
    }
}

impl LiveFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TraceFeedEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: TraceFeedEvent) {
        // A send error only means there are no subscribers right now
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(phase: FeedPhase) -> TraceFeedEvent {
        TraceFeedEvent {
            trace_id: "t1".to_string(),
            session_id: "s1".to_string(),
            user_id: "u1".to_string(),
            model_id: "test-model".to_string(),
            status: TraceStatus::Pending,
            phase,
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_does_not_panic() {
        let feed = LiveFeed::new(8);
        feed.publish(event(FeedPhase::Started));
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let feed = LiveFeed::new(8);
        let mut rx = feed.subscribe();

        feed.publish(event(FeedPhase::Started));
        feed.publish(event(FeedPhase::Completed));

        assert_eq!(rx.recv().await.unwrap().phase, FeedPhase::Started);
        assert_eq!(rx.recv().await.unwrap().phase, FeedPhase::Completed);
    }
}
