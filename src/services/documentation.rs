use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the scoreboard backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::public::get_scoreboard,
        crate::routes::public::get_live,
        crate::routes::public::get_statuses,
        crate::routes::public::get_team_detail,
        crate::routes::sse::scoreboard_stream,
        crate::routes::sse::live_stream,
        crate::routes::ingest::ingest_init,
        crate::routes::ingest::ingest_update,
        crate::routes::ingest::ingest_flag_stolen,
        crate::routes::ingest::reset_session,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::ingest::InitPayload,
            crate::dto::ingest::GameStatePayload,
            crate::dto::ingest::RawTeamTask,
            crate::dto::ingest::FlagStolenPayload,
            crate::dto::ingest::IngestAck,
            crate::dto::public::ScoreboardResponse,
            crate::dto::public::StatusInfo,
            crate::dto::public::TeamDetailResponse,
            crate::state::live_feed::LiveEvent,
            crate::state::live_feed::LiveFeedView,
            crate::state::status::TaskStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "public", description = "Read-only scoreboard projections"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "ingest", description = "Game server event intake"),
    )
)]
pub struct ApiDoc;
