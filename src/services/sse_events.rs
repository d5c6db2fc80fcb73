use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{public::ScoreboardResponse, sse::ServerEvent},
    state::{SharedState, SseHub, live_feed::LiveEvent, live_feed::LiveFeedView},
};

/// Full scoreboard snapshot, sent on every change and on connect.
pub const EVENT_SCOREBOARD: &str = "scoreboard";
/// A new live feed entry.
pub const EVENT_FLAG_STOLEN: &str = "flag_stolen";
/// Live feed snapshot, sent on connect and after a reset.
pub const EVENT_LIVE_SNAPSHOT: &str = "live_snapshot";
/// Live feed transport error changed (`null` once cleared).
pub const EVENT_LIVE_ERROR: &str = "live_error";

#[derive(Serialize)]
struct LiveErrorEvent<'a> {
    error: Option<&'a str>,
}

/// Broadcast the current scoreboard to every scoreboard subscriber.
pub fn broadcast_scoreboard(state: &SharedState, snapshot: &ScoreboardResponse) {
    send_event(state.scoreboard_sse(), EVENT_SCOREBOARD, snapshot);
}

/// Broadcast a freshly recorded live feed entry.
pub fn broadcast_flag_stolen(state: &SharedState, event: &LiveEvent) {
    send_event(state.live_sse(), EVENT_FLAG_STOLEN, event);
}

/// Broadcast the whole live feed.
pub fn broadcast_live_snapshot(state: &SharedState, view: &LiveFeedView) {
    send_event(state.live_sse(), EVENT_LIVE_SNAPSHOT, view);
}

/// Broadcast the live feed error state.
pub fn broadcast_live_error(state: &SharedState, error: Option<&str>) {
    send_event(state.live_sse(), EVENT_LIVE_ERROR, &LiveErrorEvent { error });
}

/// Serialise `payload` as a named event, for direct use on a single stream.
pub fn named_event(event: &str, payload: &impl Serialize) -> Option<ServerEvent> {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(event, error = %err, "failed to serialize SSE payload");
            None
        }
    }
}

fn send_event(hub: &SseHub, event: &str, payload: &impl Serialize) {
    if let Some(event) = named_event(event, payload) {
        hub.broadcast(event);
    }
}
