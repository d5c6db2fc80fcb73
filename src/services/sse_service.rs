use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;

use crate::{
    dto::sse::ServerEvent,
    services::{public_service::scoreboard_response, sse_events},
    state::SharedState,
};

/// Identifies the target SSE stream for logging when the connection is torn down.
#[derive(Clone, Copy, Debug)]
pub enum StreamKind {
    Scoreboard,
    Live,
}

/// Subscribe to scoreboard snapshots, starting with the current one.
pub async fn subscribe_scoreboard(
    state: &SharedState,
) -> (broadcast::Receiver<ServerEvent>, Option<ServerEvent>) {
    // Subscribe under the read lock so no update slips between snapshot and stream.
    let scoreboard = state.scoreboard().read().await;
    let receiver = state.scoreboard_sse().subscribe();
    let initial = sse_events::named_event(
        sse_events::EVENT_SCOREBOARD,
        &scoreboard_response(&scoreboard),
    );
    (receiver, initial)
}

/// Subscribe to live feed events, starting with the current feed.
pub async fn subscribe_live(
    state: &SharedState,
) -> (broadcast::Receiver<ServerEvent>, Option<ServerEvent>) {
    let live_feed = state.live_feed().read().await;
    let receiver = state.live_sse().subscribe();
    let initial = sse_events::named_event(sse_events::EVENT_LIVE_SNAPSHOT, &live_feed.view());
    (receiver, initial)
}

/// Convert a broadcast receiver into an SSE response, forwarding events until
/// the client disconnects. `initial` is sent first.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<ServerEvent>,
    initial: Option<ServerEvent>,
    kind: StreamKind,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        if let Some(payload) = initial {
            if tx.send(Ok(to_event(payload))).await.is_err() {
                return;
            }
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        // Skip lagged messages but keep the stream alive.
                        Err(RecvError::Lagged(_)) => continue,
                    }
                }
            }
        }

        info!(stream = ?kind, "SSE stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn to_event(payload: ServerEvent) -> Event {
    let event = Event::default().data(payload.data);
    match payload.event {
        Some(name) => event.event(name),
        None => event,
    }
}
