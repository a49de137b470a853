//! SSE progress endpoint.
//!
//! GET /jobs/:id/stream
//!
//! Sends the job's current `ProgressView` as a `progress` event, then one
//! event per change published on the stream hub. The stream ends after the
//! first terminal view.

use std::convert::Infallible;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream, StreamExt};
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::debug;

use super::parse_job_id;
use crate::domains::scraping::actions::load_progress;
use crate::domains::scraping::events::progress_topic;
use crate::server::app::AxumAppState;
use crate::server::ApiError;

fn is_terminal_view(value: &serde_json::Value) -> bool {
    value
        .get("is_terminal")
        .and_then(|t| t.as_bool())
        .unwrap_or(false)
}

pub async fn job_stream_handler(
    Extension(state): Extension<AxumAppState>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let job_id = parse_job_id(&id)?;

    // Subscribe before the snapshot so no change falls between the two
    let rx = state.deps.stream_hub.subscribe(&progress_topic(job_id)).await;
    let snapshot = load_progress(state.deps.store.as_ref(), job_id).await?;
    let snapshot = serde_json::to_value(&snapshot)
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let updates = BroadcastStream::new(rx).filter_map(move |result| async move {
        match result {
            Ok(value) => Some(value),
            Err(BroadcastStreamRecvError::Lagged(n)) => {
                debug!(job_id = %job_id, missed = n, "SSE subscriber lagged");
                None
            }
        }
    });

    let events = stream::once(async move { snapshot })
        .chain(updates)
        .scan(false, |finished, value| {
            let item = if *finished {
                None
            } else {
                *finished = is_terminal_view(&value);
                Some(value)
            };
            async move { item }
        })
        .filter_map(|value| async move {
            Event::default()
                .event("progress")
                .json_data(&value)
                .ok()
                .map(Ok)
        });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_view_detection() {
        assert!(is_terminal_view(&serde_json::json!({ "is_terminal": true })));
        assert!(!is_terminal_view(&serde_json::json!({ "is_terminal": false })));
        assert!(!is_terminal_view(&serde_json::json!({})));
    }
}
