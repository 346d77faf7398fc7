//! Live snapshot and real-time feed endpoints
//!
//! `GET /live` answers the polling dashboard; `GET /live/events` is an
//! SSE feed of trace lifecycle events from the in-process broadcast
//! topic.

use std::convert::Infallible;
use std::time::Duration;

use axum::Json;
use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;

use super::ApiState;
use crate::api::types::ApiError;
use crate::core::constants::SSE_KEEP_ALIVE_SECS;
use crate::data::types::LiveTraceSnapshot;
use crate::domain::traces::TraceFeedEvent;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub model: Option<String>,
}

/// `GET /live` - active traces plus rolling latency/error indicators
pub async fn snapshot(State(state): State<ApiState>) -> Result<Json<LiveTraceSnapshot>, ApiError> {
    let snapshot = state
        .traces
        .get_live_traces()
        .await
        .map_err(ApiError::from_sqlite)?;
    Ok(Json(snapshot))
}

/// `GET /live/events` - SSE feed of trace lifecycle events
pub async fn events(
    State(state): State<ApiState>,
    Query(query): Query<FeedQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut subscriber = state.traces.feed().subscribe();
    let mut shutdown_rx = state.shutdown_rx.clone();

    let stream = async_stream::stream! {
        loop {
            tokio::select! {
                biased;
                // Check for shutdown signal first
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        // Notify the client before closing so it can reconnect
                        yield Ok(Event::default().event("terminate").data("shutdown"));
                        break;
                    }
                }
                result = subscriber.recv() => {
                    match result {
                        Ok(event) => {
                            if !matches_filter(&event, &query) {
                                continue;
                            }
                            match serde_json::to_string(&event) {
                                Ok(data) => {
                                    yield Ok(Event::default().event("trace").data(data));
                                }
                                Err(e) => {
                                    tracing::error!(error = %e, "Failed to serialize feed event");
                                }
                            }
                        }
                        Err(RecvError::Lagged(n)) => {
                            tracing::warn!(lagged = n, "Live feed subscriber lagged behind");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(SSE_KEEP_ALIVE_SECS))
            .text("keep-alive"),
    )
}

fn matches_filter(event: &TraceFeedEvent, query: &FeedQuery) -> bool {
    if let Some(ref session_id) = query.session_id
        && &event.session_id != session_id
    {
        return false;
    }
    if let Some(ref user_id) = query.user_id
        && &event.user_id != user_id
    {
        return false;
    }
    if let Some(ref model) = query.model
        && &event.model_id != model
    {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::TraceStatus;
    use crate::domain::traces::FeedPhase;

    fn make_event(session: &str, user: &str, model: &str) -> TraceFeedEvent {
        TraceFeedEvent {
            trace_id: "t1".to_string(),
            session_id: session.to_string(),
            user_id: user.to_string(),
            model_id: model.to_string(),
            status: TraceStatus::Pending,
            phase: FeedPhase::Started,
        }
    }

    #[test]
    fn test_matches_filter_no_filters() {
        let query = FeedQuery {
            session_id: None,
            user_id: None,
            model: None,
        };
        assert!(matches_filter(&make_event("s1", "u1", "m1"), &query));
    }

    #[test]
    fn test_matches_filter_session() {
        let query = FeedQuery {
            session_id: Some("s1".to_string()),
            user_id: None,
            model: None,
        };
        assert!(matches_filter(&make_event("s1", "u1", "m1"), &query));
        assert!(!matches_filter(&make_event("s2", "u1", "m1"), &query));
    }

    #[test]
    fn test_matches_filter_combined() {
        let query = FeedQuery {
            session_id: Some("s1".to_string()),
            user_id: Some("u1".to_string()),
            model: Some("m1".to_string()),
        };
        assert!(matches_filter(&make_event("s1", "u1", "m1"), &query));
        assert!(!matches_filter(&make_event("s1", "u1", "m2"), &query));
    }
}
