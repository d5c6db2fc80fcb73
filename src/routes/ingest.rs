use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
};
use axum_valid::Valid;
use serde_json::Value;

use crate::{
    dto::ingest::{FlagStolenPayload, GameStatePayload, IngestAck, InitPayload},
    error::AppError,
    routes::websocket,
    services::ingest_service,
    state::{SharedState, live_feed::LiveEvent},
};

const INGEST_TOKEN_HEADER: &str = "x-ingest-token";

/// Game server intake: HTTP routes plus the ingest websocket, behind the token check.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/ingest/scoreboard/init", post(ingest_init))
        .route("/ingest/scoreboard/update", post(ingest_update))
        .route("/ingest/live/flag_stolen", post(ingest_flag_stolen))
        .route("/ingest/reset", post(reset_session))
        .merge(websocket::router())
        .route_layer(middleware::from_fn_with_state(state, require_ingest_token))
}

#[utoipa::path(
    post,
    path = "/ingest/scoreboard/init",
    tag = "ingest",
    params(("X-Ingest-Token" = Option<String>, Header, description = "Required when an ingest token is configured")),
    request_body = InitPayload,
    responses(
        (status = 200, description = "Snapshot applied", body = IngestAck),
        (status = 400, description = "Duplicate or out-of-range team and task identifiers")
    )
)]
/// Replace the scoreboard with a full snapshot.
pub async fn ingest_init(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<InitPayload>>,
) -> Json<IngestAck> {
    Json(ingest_service::ingest_init(&state, payload).await)
}

#[utoipa::path(
    post,
    path = "/ingest/scoreboard/update",
    tag = "ingest",
    params(("X-Ingest-Token" = Option<String>, Header, description = "Required when an ingest token is configured")),
    request_body = GameStatePayload,
    responses(
        (status = 200, description = "Round results applied", body = IngestAck),
        (status = 400, description = "Team or task identifiers out of range")
    )
)]
/// Apply the results of a new round.
pub async fn ingest_update(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<GameStatePayload>>,
) -> Json<IngestAck> {
    Json(ingest_service::ingest_update(&state, payload).await)
}

#[utoipa::path(
    post,
    path = "/ingest/live/flag_stolen",
    tag = "ingest",
    params(("X-Ingest-Token" = Option<String>, Header, description = "Required when an ingest token is configured")),
    request_body = FlagStolenPayload,
    responses(
        (status = 200, description = "Event recorded", body = LiveEvent),
        (status = 204, description = "Empty or unusable payload ignored")
    )
)]
/// Record a flag-stolen notification; the body may be wrapped in `{ "data": ... }`.
pub async fn ingest_flag_stolen(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Response {
    let payload = FlagStolenPayload::from_value(body);
    match ingest_service::ingest_flag_stolen(&state, payload).await {
        Some(event) => Json(event).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/ingest/reset",
    tag = "ingest",
    params(("X-Ingest-Token" = Option<String>, Header, description = "Required when an ingest token is configured")),
    responses((status = 204, description = "Scoreboard and live feed cleared"))
)]
/// Drop all scoreboard data and live events.
pub async fn reset_session(State(state): State<SharedState>) -> StatusCode {
    ingest_service::reset_session(&state).await;
    StatusCode::NO_CONTENT
}

async fn require_ingest_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config().ingest_token() else {
        return Ok(next.run(req).await);
    };

    let provided = req
        .headers()
        .get(INGEST_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::Unauthorized("missing ingest token header `X-Ingest-Token`".into())
        })?;

    if provided == expected {
        Ok(next.run(req).await)
    } else {
        Err(AppError::Unauthorized("invalid ingest token".into()))
    }
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    use super::*;
    use crate::{config::AppConfig, routes, state::AppState};

    fn app(token: Option<&str>) -> Router<()> {
        let config = AppConfig::default().with_overrides(|key| match key {
            "INGEST_TOKEN" => token.map(str::to_owned),
            _ => None,
        });
        routes::router(AppState::new(config, None))
    }

    fn request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(INGEST_TOKEN_HEADER, token);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn open_when_no_token_configured() {
        let response = app(None)
            .oneshot(request("POST", "/ingest/reset", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let response = app(Some("s3cret"))
            .oneshot(request("POST", "/ingest/reset", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_token_is_rejected() {
        let response = app(Some("s3cret"))
            .oneshot(request("POST", "/ingest/reset", Some("guess")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn matching_token_passes() {
        let response = app(Some("s3cret"))
            .oneshot(request("POST", "/ingest/reset", Some("s3cret")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn websocket_upgrade_is_guarded() {
        let response = app(Some("s3cret"))
            .oneshot(request("GET", "/ingest/ws", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn public_routes_ignore_the_token() {
        let response = app(Some("s3cret"))
            .oneshot(request("GET", "/public/statuses", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
