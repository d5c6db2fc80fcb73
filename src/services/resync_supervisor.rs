use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};
use validator::Validate;

use crate::{
    dao::upstream::{UpstreamClient, UpstreamError},
    dto::ingest::InitPayload,
    services::ingest_service,
    state::SharedState,
};

/// Error shown on the scoreboard once the game server stays unreachable.
pub const CONNECTION_ERROR: &str = "Can't connect to server";

/// Periodically re-fetch the full scoreboard from the game server and apply it as an init.
///
/// A single failed fetch is only logged; from the second consecutive failure the
/// scoreboard carries [`CONNECTION_ERROR`] until the next successful fetch.
/// Snapshots that fail validation are skipped without counting as a failure.
pub async fn run(state: SharedState, client: UpstreamClient) {
    let mut ticker = interval(state.config().resync_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut failures = FailureCounter::default();

    info!(
        upstream = client.base_url(),
        interval_secs = state.config().resync_interval().as_secs(),
        "starting scoreboard resync"
    );

    loop {
        ticker.tick().await;

        if state.read_scoreboard(|scoreboard| scoreboard.round_time()).await.is_none() {
            refresh_round_time(&state, &client).await;
        }

        match fetch_snapshot(&client).await {
            Ok(payload) => {
                let previous = failures.succeeded();
                if previous > 0 {
                    info!(failures = previous, "game server reachable again");
                }
                ingest_service::ingest_init(&state, payload).await;
            }
            Err(ResyncError::Invalid(errors)) => {
                warn!(error = %errors, "ignoring invalid scoreboard snapshot from game server");
            }
            Err(ResyncError::Upstream(err)) => match failures.failed() {
                Some(message) => {
                    warn!(failures = failures.consecutive(), error = %err, "scoreboard resync failed");
                    ingest_service::set_scoreboard_error(&state, Some(message.into())).await;
                }
                None => warn!(error = %err, "scoreboard resync failed; retrying"),
            },
        }
    }
}

/// Consecutive fetch failures, tolerating a single transient one.
#[derive(Debug, Default)]
struct FailureCounter {
    consecutive: u32,
}

impl FailureCounter {
    /// Record a failed fetch; returns the error to show once it is not a one-off.
    fn failed(&mut self) -> Option<&'static str> {
        self.consecutive = self.consecutive.saturating_add(1);
        (self.consecutive > 1).then_some(CONNECTION_ERROR)
    }

    /// Record a successful fetch; returns how many failures preceded it.
    fn succeeded(&mut self) -> u32 {
        std::mem::take(&mut self.consecutive)
    }

    fn consecutive(&self) -> u32 {
        self.consecutive
    }
}

#[derive(Debug, thiserror::Error)]
enum ResyncError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("game server sent an invalid snapshot: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

async fn fetch_snapshot(client: &UpstreamClient) -> Result<InitPayload, ResyncError> {
    let payload = client.fetch_init().await?;
    payload.validate()?;
    Ok(payload)
}

async fn refresh_round_time(state: &SharedState, client: &UpstreamClient) {
    match client.fetch_client_config().await {
        Ok(config) => {
            info!(round_time = config.round_time, "learned round duration");
            state
                .scoreboard()
                .write()
                .await
                .set_round_time(Some(config.round_time));
        }
        Err(err) => warn!(error = %err, "failed to fetch game configuration"),
    }
}
