use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::public::{ScoreboardResponse, StatusInfo, TeamDetailResponse},
    error::AppError,
    services::public_service,
    state::{SharedState, live_feed::LiveFeedView, models::TeamId},
};

/// Public read-only endpoints that expose the scoreboard and the live feed.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/public/scoreboard", get(get_scoreboard))
        .route("/public/live", get(get_live))
        .route("/public/statuses", get(get_statuses))
        .route("/public/teams/{id}", get(get_team_detail))
}

#[utoipa::path(
    get,
    path = "/public/scoreboard",
    tag = "public",
    responses((status = 200, description = "Ranked scoreboard with round clock", body = ScoreboardResponse))
)]
/// Return the ranked scoreboard; collections are `null` until the first init.
pub async fn get_scoreboard(State(state): State<SharedState>) -> Json<ScoreboardResponse> {
    Json(public_service::get_scoreboard(&state).await)
}

#[utoipa::path(
    get,
    path = "/public/live",
    tag = "public",
    responses((status = 200, description = "Most recent flag-stolen events, newest first", body = LiveFeedView))
)]
/// Return the live feed.
pub async fn get_live(State(state): State<SharedState>) -> Json<LiveFeedView> {
    Json(public_service::get_live(&state).await)
}

#[utoipa::path(
    get,
    path = "/public/statuses",
    tag = "public",
    responses((status = 200, description = "Checker status legend", body = [StatusInfo]))
)]
/// Return the checker status legend.
pub async fn get_statuses() -> Json<Vec<StatusInfo>> {
    Json(public_service::get_statuses())
}

#[utoipa::path(
    get,
    path = "/public/teams/{id}",
    tag = "public",
    params(("id" = i64, Path, description = "Team identifier")),
    responses(
        (status = 200, description = "Team standing and per-round history", body = TeamDetailResponse),
        (status = 404, description = "Unknown team"),
        (status = 503, description = "Game server unavailable or not configured")
    )
)]
/// Return one team's place and its history fetched from the game server.
pub async fn get_team_detail(
    State(state): State<SharedState>,
    Path(id): Path<TeamId>,
) -> Result<Json<TeamDetailResponse>, AppError> {
    Ok(Json(public_service::get_team_detail(&state, id).await?))
}
