use serde::Deserialize;
use serde_with::{DefaultOnNull, DisplayFromStr, PickFirst, serde_as};

use crate::state::models::{TaskId, TeamId};

/// Public game configuration served at `/api/client/config/`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientConfig {
    /// Round duration in seconds.
    pub round_time: u64,
}

/// Historical team task state served at `/api/client/teams/{id}/`.
///
/// The game server emits some numeric columns as strings, so both forms are
/// accepted.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TeamTaskStateRaw {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub id: i64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub round: u64,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub task_id: TaskId,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub team_id: TeamId,
    pub status: u16,
    #[serde(default)]
    pub stolen: u32,
    #[serde(default)]
    pub lost: u32,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub score: f64,
    #[serde(default)]
    pub checks: u32,
    #[serde(default)]
    pub checks_passed: u32,
    /// Stream position formatted as `<secs>-<seq>`.
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub timestamp: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub message: String,
}
