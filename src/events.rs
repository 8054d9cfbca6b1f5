use std::{convert::Infallible, time::Duration};

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::stream::Stream;
use tokio::sync::broadcast::error::RecvError;

use crate::AppState;

/// Streams every trigger as an SSE `trigger` event with the JSON-encoded
/// `TriggerEvent` as its data. A subscriber that falls behind the broadcast
/// buffer gets a `ping` marker instead of the lost events; delivery past
/// emission is best-effort.
pub async fn sse_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.lifecycle.subscribe();

    let stream = futures_util::stream::unfold(rx, |mut rx| async {
        let evt = match rx.recv().await {
            Ok(ev) => Event::default()
                .event("trigger")
                .json_data(&ev)
                .unwrap_or_else(|_| Event::default().event("ping").data("unserializable")),
            Err(RecvError::Lagged(_)) => Event::default().event("ping").data("lagged"),
            Err(RecvError::Closed) => return None,
        };

        Some((Ok(evt), rx))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(20))
            .text("keep-alive"),
    )
}
