//! Event Stream Endpoint
//!
//! Server-Sent Events bridge over the domain event broadcast channel.
//! Each event is serialized as internally tagged JSON (the `type` field
//! names the variant, e.g. `todo:statusChanged`), so one `EventSource`
//! subscription covers todos and articles alike.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};

use crate::api::AppState;

/// SSE stream of every todo and article event
///
/// ```javascript
/// const source = new EventSource("http://localhost:4680/api/events");
/// source.onmessage = (event) => {
///     const data = JSON.parse(event.data);
///     // data.type: "todo:created", "todo:statusChanged", ...
/// };
/// ```
async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!("SSE client connected");

    let rx = state.todos.subscribe_to_events();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(domain_event) => match serde_json::to_string(&domain_event) {
            Ok(json) => Some(Ok(Event::default().data(json))),
            Err(e) => {
                tracing::error!("Failed to serialize SSE event: {}", e);
                None
            }
        },
        // A lagged subscriber skips ahead; mutations never wait for it.
        Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(n)) => {
            tracing::warn!("SSE client lagged by {} events", n);
            None
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("keepalive"),
    )
}

/// Build the event endpoint router
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/events", get(event_stream))
        .with_state(state)
}
