use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report `degraded` while the scoreboard carries a transport error.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let (initialized, error) = state
        .read_scoreboard(|scoreboard| {
            (
                scoreboard.teams().is_some(),
                scoreboard.error().map(str::to_owned),
            )
        })
        .await;

    match error {
        Some(error) => {
            warn!(error = %error, "scoreboard feed unhealthy");
            HealthResponse::degraded(initialized)
        }
        None => HealthResponse::ok(initialized),
    }
}
