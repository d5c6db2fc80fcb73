pub mod live_feed;
pub mod models;
pub mod round;
pub mod scoreboard;
mod sse;
pub mod status;
pub mod team_history;

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    config::AppConfig, dao::upstream::UpstreamClient, error::ServiceError,
    state::live_feed::LiveFeed, state::scoreboard::ScoreboardReconciler,
};

pub use self::sse::{SseHub, SseState};

pub type SharedState = Arc<AppState>;

/// Central application state: the two scoreboard containers, their SSE hubs
/// and the optional game server client.
pub struct AppState {
    config: AppConfig,
    upstream: Option<UpstreamClient>,
    scoreboard: RwLock<ScoreboardReconciler>,
    live_feed: RwLock<LiveFeed>,
    sse: SseState,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// Both containers start empty; the scoreboard waits for its first init.
    pub fn new(config: AppConfig, upstream: Option<UpstreamClient>) -> SharedState {
        let mut scoreboard = ScoreboardReconciler::new();
        scoreboard.set_round_time(config.round_time());

        Arc::new(Self {
            sse: SseState::new(config.sse_capacity()),
            config,
            upstream,
            scoreboard: RwLock::new(scoreboard),
            live_feed: RwLock::new(LiveFeed::new()),
        })
    }

    /// Runtime configuration loaded at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Game server client, when an upstream URL is configured.
    pub fn upstream(&self) -> Option<&UpstreamClient> {
        self.upstream.as_ref()
    }

    /// Game server client or a [`ServiceError::NotConfigured`] error.
    pub fn require_upstream(&self) -> Result<&UpstreamClient, ServiceError> {
        self.upstream.as_ref().ok_or(ServiceError::NotConfigured)
    }

    /// Canonical scoreboard state.
    pub fn scoreboard(&self) -> &RwLock<ScoreboardReconciler> {
        &self.scoreboard
    }

    /// Live flag-stolen feed.
    pub fn live_feed(&self) -> &RwLock<LiveFeed> {
        &self.live_feed
    }

    /// Run `f` against the scoreboard under its read lock.
    pub async fn read_scoreboard<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&ScoreboardReconciler) -> R,
    {
        let guard = self.scoreboard.read().await;
        f(&guard)
    }

    /// Broadcast hub for scoreboard snapshots.
    pub fn scoreboard_sse(&self) -> &SseHub {
        self.sse.scoreboard()
    }

    /// Broadcast hub for live feed events.
    pub fn live_sse(&self) -> &SseHub {
        self.sse.live()
    }
}
