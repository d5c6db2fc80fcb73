use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{
    services::sse_service::{self, StreamKind},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/sse/scoreboard",
    tag = "sse",
    responses((status = 200, description = "Scoreboard snapshots, current one first", content_type = "text/event-stream", body = String))
)]
/// Stream scoreboard snapshots to connected dashboards.
pub async fn scoreboard_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let (receiver, initial) = sse_service::subscribe_scoreboard(&state).await;
    info!("New scoreboard SSE connection");
    sse_service::to_sse_stream(receiver, initial, StreamKind::Scoreboard)
}

#[utoipa::path(
    get,
    path = "/sse/live",
    tag = "sse",
    responses((status = 200, description = "Live feed events, current feed first", content_type = "text/event-stream", body = String))
)]
/// Stream flag-stolen events and live feed errors.
pub async fn live_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let (receiver, initial) = sse_service::subscribe_live(&state).await;
    info!("New live SSE connection");
    sse_service::to_sse_stream(receiver, initial, StreamKind::Live)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/sse/scoreboard", get(scoreboard_stream))
        .route("/sse/live", get(live_stream))
}
