use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnNull, serde_as};
use utoipa::ToSchema;

use crate::{dto::ingest::RawTeamTask, state::status::TaskStatus};

/// Identifier of a team as assigned by the game server.
pub type TeamId = i64;
/// Identifier of a task (vulnerable service) as assigned by the game server.
pub type TaskId = i64;

/// Multiplier used to derive a stable key for a (team, task) pair.
const TEAM_TASK_ID_STRIDE: i64 = 1000;
/// Largest task id that keeps [`team_task_id`] collision free.
pub const MAX_TASK_ID: TaskId = TEAM_TASK_ID_STRIDE - 1;
/// Largest team id for which [`team_task_id`] fits in an `i64`.
pub const MAX_TEAM_ID: TeamId = i64::MAX / TEAM_TASK_ID_STRIDE - 1;

/// Literal shown instead of an empty checker message when the service is up.
pub const UP_MESSAGE: &str = "OK";

fn default_active() -> bool {
    true
}

/// A vulnerable service every team hosts.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    /// Checker command or script path.
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub checker: String,
    #[serde(default)]
    pub checker_timeout: u32,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub checker_type: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub env_path: String,
    #[serde(default)]
    pub gets: u32,
    #[serde(default)]
    pub puts: u32,
    #[serde(default)]
    pub places: u32,
    #[serde(default)]
    pub default_score: f64,
    /// Number of rounds a flag stays retrievable.
    #[serde(default)]
    pub get_period: u32,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// A competing team.
///
/// `score` is never read from payloads: it is recomputed from the team's task
/// results every time the scoreboard changes. `token` is accepted on input but
/// never serialized back out.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub ip: String,
    #[serde(default, skip_serializing)]
    pub token: String,
    #[serde(default)]
    pub logo_path: Option<String>,
    #[serde(default)]
    pub highlighted: bool,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_deserializing)]
    pub score: f64,
}

/// Normalized state of one team's service for the current round.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TeamTask {
    /// Stable lookup key, see [`team_task_id`].
    pub id: i64,
    pub team_id: TeamId,
    pub task_id: TaskId,
    /// Raw checker status code.
    pub status: u16,
    pub stolen: u32,
    pub lost: u32,
    /// This task's contribution to the team total.
    pub score: f64,
    pub checks: u32,
    pub checks_passed: u32,
    /// Percentage of checks that passed.
    pub sla: f64,
    pub message: String,
}

impl TeamTask {
    /// Known status for this result, if the code is one of the fixed ones.
    pub fn known_status(&self) -> Option<TaskStatus> {
        TaskStatus::from_code(self.status)
    }
}

impl From<RawTeamTask> for TeamTask {
    fn from(raw: RawTeamTask) -> Self {
        Self {
            id: team_task_id(raw.team_id, raw.task_id),
            team_id: raw.team_id,
            task_id: raw.task_id,
            status: raw.status,
            stolen: raw.stolen,
            lost: raw.lost,
            score: raw.score,
            checks: raw.checks,
            checks_passed: raw.checks_passed,
            sla: sla_percent(raw.checks_passed, raw.checks),
            message: display_message(raw.message, raw.status),
        }
    }
}

/// Normalize a batch of raw results, one per (team, task) pair.
///
/// A later record for the same pair replaces the earlier one but keeps its
/// position.
pub fn normalize_team_tasks(raw: Vec<RawTeamTask>) -> Vec<TeamTask> {
    let mut by_id: IndexMap<i64, TeamTask> = IndexMap::with_capacity(raw.len());
    for result in raw {
        let result = TeamTask::from(result);
        by_id.insert(result.id, result);
    }
    by_id.into_values().collect()
}

/// Deterministic key for a (team, task) pair.
///
/// Unique for ids in `0..=MAX_TEAM_ID` and `0..=MAX_TASK_ID`; ingest payloads
/// are validated against those bounds. Out-of-range ids saturate instead of
/// overflowing.
pub fn team_task_id(team_id: TeamId, task_id: TaskId) -> i64 {
    team_id
        .saturating_mul(TEAM_TASK_ID_STRIDE)
        .saturating_add(task_id)
}

/// Share of passed checks as a percentage, `0` when nothing was checked yet.
pub fn sla_percent(checks_passed: u32, checks: u32) -> f64 {
    if checks == 0 {
        return 0.0;
    }
    f64::from(checks_passed) / f64::from(checks) * 100.0
}

/// Replace an empty message by [`UP_MESSAGE`] when the service is up.
pub fn display_message(message: String, status: u16) -> String {
    if message.is_empty() && status == TaskStatus::Up.code() {
        UP_MESSAGE.to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(status: u16, checks: u32, checks_passed: u32, message: &str) -> RawTeamTask {
        RawTeamTask {
            task_id: 3,
            team_id: 7,
            status,
            stolen: 1,
            lost: 2,
            score: 120.5,
            checks,
            checks_passed,
            message: message.to_string(),
        }
    }

    #[test]
    fn sla_is_zero_without_checks() {
        let task = TeamTask::from(raw(101, 0, 0, ""));
        assert_eq!(task.sla, 0.0);
    }

    #[test]
    fn sla_is_percentage_of_passed_checks() {
        let task = TeamTask::from(raw(101, 4, 3, ""));
        assert_eq!(task.sla, 75.0);
    }

    #[test]
    fn empty_message_becomes_ok_when_up() {
        let task = TeamTask::from(raw(101, 1, 1, ""));
        assert_eq!(task.message, "OK");
    }

    #[test]
    fn empty_message_kept_for_other_statuses() {
        let task = TeamTask::from(raw(104, 1, 0, ""));
        assert_eq!(task.message, "");
    }

    #[test]
    fn non_empty_message_passes_through() {
        let task = TeamTask::from(raw(101, 1, 1, "slow but fine"));
        assert_eq!(task.message, "slow but fine");
    }

    #[test]
    fn id_combines_team_and_task() {
        let task = TeamTask::from(raw(102, 2, 1, "bad flag"));
        assert_eq!(task.id, 7003);
        assert_eq!(task.known_status(), Some(TaskStatus::Corrupt));
        assert_eq!((task.stolen, task.lost, task.score), (1, 2, 120.5));
    }

    #[test]
    fn duplicate_pairs_keep_last_record_in_first_position() {
        let mut first = raw(101, 1, 1, "");
        first.score = 100.0;
        let mut other = raw(101, 1, 1, "");
        other.task_id = 4;
        let mut last = raw(104, 1, 0, "down");
        last.score = 300.0;

        let tasks = normalize_team_tasks(vec![first, other, last]);

        assert_eq!(tasks.len(), 2);
        assert_eq!((tasks[0].id, tasks[0].score), (7003, 300.0));
        assert_eq!(tasks[0].message, "down");
        assert_eq!(tasks[1].id, 7004);
    }

    #[test]
    fn id_bounds_do_not_overflow() {
        assert_eq!(team_task_id(MAX_TEAM_ID, MAX_TASK_ID), MAX_TEAM_ID * 1000 + 999);
        assert_ne!(team_task_id(1, MAX_TASK_ID), team_task_id(2, 0));
        assert_eq!(team_task_id(9_300_000_000_000_000, 1), i64::MAX);
    }

    #[test]
    fn team_score_and_token_are_not_taken_from_payload() {
        let team: Team = serde_json::from_value(serde_json::json!({
            "id": 4,
            "name": "pwnies",
            "token": "secret",
            "score": 9000.0
        }))
        .unwrap();

        assert_eq!(team.score, 0.0);
        assert_eq!(team.token, "secret");
        assert!(team.active);

        let out = serde_json::to_value(&team).unwrap();
        assert!(out.get("token").is_none());
    }

    #[test]
    fn task_tolerates_null_strings() {
        let task: Task = serde_json::from_value(serde_json::json!({
            "id": 1,
            "name": "web",
            "checker": null,
            "env_path": null
        }))
        .unwrap();

        assert_eq!(task.checker, "");
        assert_eq!(task.env_path, "");
        assert!(task.active);
    }
}
