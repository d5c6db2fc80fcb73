//! Applies game server payloads to the shared containers and fans the result out on SSE.

use tracing::{debug, info, warn};

use crate::{
    dto::{
        ingest::{FlagStolenPayload, GameStatePayload, IngestAck, IngestMessage, InitPayload},
        public::ScoreboardResponse,
    },
    services::{public_service::scoreboard_response, sse_events},
    state::{SharedState, live_feed::LiveEvent, scoreboard::UpdateOutcome},
};

/// Replace the scoreboard with a full snapshot.
pub async fn ingest_init(state: &SharedState, payload: InitPayload) -> IngestAck {
    let snapshot = {
        let mut scoreboard = state.scoreboard().write().await;
        scoreboard.apply_init(payload);
        scoreboard_response(&scoreboard)
    };

    info!(
        round = snapshot.scoreboard.round,
        teams = snapshot.scoreboard.teams.as_ref().map_or(0, Vec::len),
        "scoreboard initialised"
    );
    publish_scoreboard(state, snapshot, true)
}

/// Apply a per-round snapshot.
pub async fn ingest_update(state: &SharedState, payload: GameStatePayload) -> IngestAck {
    let (outcome, snapshot) = {
        let mut scoreboard = state.scoreboard().write().await;
        scoreboard.set_error(None);
        let outcome = scoreboard.apply_update(payload);
        (outcome, scoreboard_response(&scoreboard))
    };

    let ranked = outcome == UpdateOutcome::Ranked;
    if ranked {
        debug!(round = snapshot.scoreboard.round, "scoreboard updated");
    } else {
        warn!(
            round = snapshot.scoreboard.round,
            "scoreboard update received before init; results stored unranked"
        );
    }
    publish_scoreboard(state, snapshot, ranked)
}

/// Record a flag-stolen notification, resolving names against the scoreboard.
pub async fn ingest_flag_stolen(
    state: &SharedState,
    payload: Option<FlagStolenPayload>,
) -> Option<LiveEvent> {
    let event = {
        let scoreboard = state.scoreboard().read().await;
        let mut live_feed = state.live_feed().write().await;
        live_feed.push_notification(payload, &*scoreboard)
    };

    match &event {
        Some(event) => {
            debug!(
                attacker = event.attacker_id,
                victim = event.victim_id,
                task = event.task_id,
                "flag stolen"
            );
            sse_events::broadcast_flag_stolen(state, event);
        }
        None => debug!("ignoring empty flag_stolen notification"),
    }
    event
}

/// Dispatch one decoded ingest websocket frame.
pub async fn ingest_message(state: &SharedState, message: IngestMessage) {
    match message {
        IngestMessage::InitScoreboard(payload) => {
            ingest_init(state, payload).await;
        }
        IngestMessage::UpdateScoreboard(payload) => {
            ingest_update(state, payload).await;
        }
        IngestMessage::FlagStolen(payload) => {
            ingest_flag_stolen(state, payload).await;
        }
        IngestMessage::Unknown(event) => {
            debug!(event, "ignoring unknown ingest event");
        }
    }
}

/// Record or clear the scoreboard transport error, broadcasting only on change.
pub async fn set_scoreboard_error(state: &SharedState, error: Option<String>) {
    let snapshot = {
        let mut scoreboard = state.scoreboard().write().await;
        if scoreboard.error() == error.as_deref() {
            return;
        }
        scoreboard.set_error(error);
        scoreboard_response(&scoreboard)
    };
    sse_events::broadcast_scoreboard(state, &snapshot);
}

/// Record or clear the live feed transport error, broadcasting only on change.
pub async fn set_live_error(state: &SharedState, error: Option<String>) {
    {
        let mut live_feed = state.live_feed().write().await;
        if live_feed.error() == error.as_deref() {
            return;
        }
        live_feed.set_error(error.clone());
    }
    sse_events::broadcast_live_error(state, error.as_deref());
}

/// Drop both containers back to their initial state.
pub async fn reset_session(state: &SharedState) {
    let snapshot = {
        let mut scoreboard = state.scoreboard().write().await;
        scoreboard.reset();
        scoreboard.set_round_time(state.config().round_time());
        scoreboard_response(&scoreboard)
    };
    let live = {
        let mut live_feed = state.live_feed().write().await;
        live_feed.clear();
        live_feed.view()
    };

    info!("scoreboard session reset");
    sse_events::broadcast_scoreboard(state, &snapshot);
    sse_events::broadcast_live_snapshot(state, &live);
}

fn publish_scoreboard(state: &SharedState, snapshot: ScoreboardResponse, ranked: bool) -> IngestAck {
    sse_events::broadcast_scoreboard(state, &snapshot);
    IngestAck {
        round: snapshot.scoreboard.round,
        ranked,
    }
}
