//! Response payloads of the read-only dashboard endpoints.

use serde::Serialize;
use utoipa::ToSchema;

use crate::state::{
    models::Team,
    scoreboard::ScoreboardView,
    status::TaskStatus,
    team_history::HistoryRow,
};

/// Ranked scoreboard plus the derived round clock.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoreboardResponse {
    #[serde(flatten)]
    pub scoreboard: ScoreboardView,
    /// Percentage of the current round already elapsed.
    pub round_progress: Option<u8>,
    /// Time since the round started, `MM:SS`.
    pub round_elapsed: Option<String>,
}

/// Display metadata of a checker status code.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusInfo {
    pub code: u16,
    pub status: TaskStatus,
    pub label: String,
    pub description: String,
    /// Background color used by dashboards, `#rrggbb`.
    pub color: String,
}

impl From<TaskStatus> for StatusInfo {
    fn from(status: TaskStatus) -> Self {
        Self {
            code: status.code(),
            status,
            label: status.label().to_string(),
            description: status.description().to_string(),
            color: status.color().to_string(),
        }
    }
}

/// Drill-down of one team: its current standing and per-round history.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamDetailResponse {
    pub team: Team,
    /// 1-based ranking position.
    pub place: Option<usize>,
    pub rows: Vec<HistoryRow>,
    pub row_count: usize,
}
