use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures_util::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;
use tracing::warn;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/trains/{train_no}/stream", get(stream_train_events))
}

/// GET /trains/{train_no}/stream
///
/// Server-Sent Events for one train: bookings as they commit, and removal.
async fn stream_train_events(
    State(state): State<AppState>,
    Path(train_no): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let train = state.railway.find(&train_no).await?;
    let rx = state.events.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        let train_no = train.number.clone();
        async move {
            match result {
                Ok(event) if event.train_no() == train_no => Event::default()
                    .event(event.kind())
                    .json_data(&event)
                    .ok()
                    .map(Ok::<_, Infallible>),
                Ok(_) => None,
                Err(e) => {
                    warn!("Event stream for train {} lagged: {}", train_no, e);
                    None
                }
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
