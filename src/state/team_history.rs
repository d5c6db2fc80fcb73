//! Per-team drill-down: history of a team's task states grouped into rounds.

use std::collections::BTreeMap;

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dao::upstream::TeamTaskStateRaw,
    state::models::{TaskId, TeamId, display_message},
};

/// One historical state of a team's task, normalized for display.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TeamTaskState {
    pub id: i64,
    pub round: u64,
    pub task_id: TaskId,
    pub team_id: TeamId,
    pub status: u16,
    pub stolen: u32,
    pub lost: u32,
    pub score: f64,
    pub sla: f64,
    pub message: String,
    /// Seconds part of the `<secs>-<seq>` timestamp.
    pub timestamp_secs: i64,
    /// Sequence part of the `<secs>-<seq>` timestamp.
    pub timestamp_seq: i64,
}

/// States of every task for one round, with the SLA-weighted total.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct HistoryRow {
    /// One state per task, ordered by task id.
    pub tasks: Vec<TeamTaskState>,
    pub score: f64,
}

impl From<TeamTaskStateRaw> for TeamTaskState {
    fn from(raw: TeamTaskStateRaw) -> Self {
        let (timestamp_secs, timestamp_seq) = parse_timestamp(&raw.timestamp);
        // History uses max(checks, 1) as divisor, unlike the live scoreboard.
        let sla = 100.0 * f64::from(raw.checks_passed) / f64::from(raw.checks.max(1));

        Self {
            id: raw.id,
            round: raw.round,
            task_id: raw.task_id,
            team_id: raw.team_id,
            status: raw.status,
            stolen: raw.stolen,
            lost: raw.lost,
            score: raw.score,
            sla,
            message: display_message(raw.message, raw.status),
            timestamp_secs,
            timestamp_seq,
        }
    }
}

/// Split a `<secs>-<seq>` stream timestamp; unparsable parts read as 0.
pub fn parse_timestamp(raw: &str) -> (i64, i64) {
    match raw.split_once('-') {
        Some((secs, seq)) => (
            secs.trim().parse().unwrap_or(0),
            seq.trim().parse().unwrap_or(0),
        ),
        None => (raw.trim().parse().unwrap_or(0), 0),
    }
}

/// Normalize raw states and order them newest first.
pub fn normalize_history(raw: Vec<TeamTaskStateRaw>) -> Vec<TeamTaskState> {
    let mut states: Vec<TeamTaskState> = raw.into_iter().map(Into::into).collect();
    sort_newest_first(&mut states);
    states
}

/// Order by timestamp seconds, then sequence, both descending.
pub fn sort_newest_first(states: &mut [TeamTaskState]) {
    states.sort_by(|a, b| {
        b.timestamp_secs
            .cmp(&a.timestamp_secs)
            .then_with(|| b.timestamp_seq.cmp(&a.timestamp_seq))
    });
}

/// Slice newest-first states into rows, one entry per task per row.
///
/// Only as many rows as the shortest task history are produced so every row
/// is complete.
pub fn round_rows(states: &[TeamTaskState]) -> Vec<HistoryRow> {
    let mut by_task: BTreeMap<TaskId, Vec<&TeamTaskState>> = BTreeMap::new();
    for state in states {
        by_task.entry(state.task_id).or_default().push(state);
    }

    let Some(row_count) = by_task.values().map(Vec::len).min() else {
        return Vec::new();
    };

    (0..row_count)
        .map(|index| {
            let tasks: Vec<TeamTaskState> = by_task
                .values()
                .map(|column| column[index].clone())
                .collect();
            let score = tasks.iter().map(|t| t.score * t.sla / 100.0).sum();
            HistoryRow { tasks, score }
        })
        .collect()
}
