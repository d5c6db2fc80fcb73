//! Service helpers that expose read-only projections of the scoreboard and the live feed.

use crate::{
    dto::public::{ScoreboardResponse, StatusInfo, TeamDetailResponse},
    error::ServiceError,
    state::{
        SharedState,
        live_feed::LiveFeedView,
        round::{format_elapsed, now_millis, round_progress},
        scoreboard::ScoreboardReconciler,
        status::TaskStatus,
        team_history::{normalize_history, round_rows},
        models::TeamId,
    },
};

/// Return the ranked scoreboard together with the round clock.
pub async fn get_scoreboard(state: &SharedState) -> ScoreboardResponse {
    state.read_scoreboard(scoreboard_response).await
}

/// Return the live feed, newest first.
pub async fn get_live(state: &SharedState) -> LiveFeedView {
    state.live_feed().read().await.view()
}

/// Return display metadata for every checker status.
pub fn get_statuses() -> Vec<StatusInfo> {
    TaskStatus::ALL.into_iter().map(StatusInfo::from).collect()
}

/// Return a team's standing and its per-round history fetched from the game server.
pub async fn get_team_detail(
    state: &SharedState,
    team_id: TeamId,
) -> Result<TeamDetailResponse, ServiceError> {
    let (team, place) = state
        .read_scoreboard(|scoreboard| {
            scoreboard
                .team(team_id)
                .cloned()
                .map(|team| (team, scoreboard.place_of(team_id)))
        })
        .await
        .ok_or_else(|| ServiceError::NotFound(format!("team `{team_id}` not found")))?;

    let upstream = state.require_upstream()?;
    let raw = upstream.fetch_team_states(team_id).await.map_err(|err| {
        if err.is_not_found() {
            ServiceError::NotFound(format!("no history for team `{team_id}`"))
        } else {
            ServiceError::from(err)
        }
    })?;

    let states = normalize_history(raw);
    let rows = round_rows(&states);

    Ok(TeamDetailResponse {
        team,
        place,
        row_count: rows.len(),
        rows,
    })
}

/// Build the scoreboard payload shared by REST and SSE.
pub fn scoreboard_response(scoreboard: &ScoreboardReconciler) -> ScoreboardResponse {
    let now_ms = now_millis() as f64;

    ScoreboardResponse {
        round_progress: round_progress(
            scoreboard.round_start(),
            scoreboard.round_time(),
            now_ms / 1000.0,
        ),
        round_elapsed: format_elapsed(scoreboard.round_start(), now_ms),
        scoreboard: scoreboard.view(),
    }
}
