//! Server-sent countdown stream.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures::Stream;
use tokio::sync::mpsc;

use dn_core::{CountdownEngine, CountdownEvent};

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/countdown", get(countdown_stream))
}

/// GET /countdown - Live countdown to the next status change
///
/// Each connection gets its own engine; it stops when the client goes away
/// and the stream is dropped. Without a target the stream ends immediately.
async fn countdown_stream(
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let report = state.status().await?;
    let (tx, rx) = mpsc::unbounded_channel();

    let mut engine = CountdownEngine::new(Arc::clone(state.clock()));
    if let Some(target) = report.status.countdown_target() {
        engine.start(target, move |event| {
            // The receiver is gone once the client disconnects.
            let _ = tx.send(event);
        });
    }

    let stream = futures::stream::unfold((engine, rx), |(engine, mut rx)| async move {
        let event = match rx.recv().await? {
            CountdownEvent::Tick { display, .. } => Event::default().event("tick").data(display),
            CountdownEvent::Reached => Event::default().event("reached").data("reached"),
        };
        Some((Ok::<_, Infallible>(event), (engine, rx)))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
