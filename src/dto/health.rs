use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Whether a scoreboard snapshot has been received yet.
    pub initialized: bool,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(initialized: bool) -> Self {
        Self {
            status: "ok".to_string(),
            initialized,
        }
    }

    /// Create a health response indicating the game server feed is failing.
    pub fn degraded(initialized: bool) -> Self {
        Self {
            status: "degraded".to_string(),
            initialized,
        }
    }
}
