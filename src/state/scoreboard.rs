//! Canonical competition state: reconciles init/update snapshots into a ranked
//! scoreboard.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::ingest::{GameStatePayload, InitPayload},
    state::{
        live_feed::NameLookup,
        models::{Task, TaskId, Team, TeamId, TeamTask, normalize_team_tasks},
    },
};

/// Whether an update could be reconciled against known teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Scores were recomputed and teams re-ranked.
    Ranked,
    /// No init received yet; only round data and results were stored.
    AwaitingInit,
}

/// Point-in-time copy of the scoreboard, ready to be serialized.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ScoreboardView {
    /// Current round number, `0` before any snapshot.
    pub round: u64,
    /// Start of the current round, epoch seconds.
    pub round_start: Option<f64>,
    /// Round duration in seconds, once known.
    pub round_time: Option<u64>,
    /// Teams in ranking order.
    pub teams: Option<Vec<Team>>,
    /// Tasks ordered by id.
    pub tasks: Option<Vec<Task>>,
    /// Normalized results, one per (team, task) pair.
    pub team_tasks: Option<Vec<TeamTask>>,
    /// Last transport error, cleared by the next successful snapshot.
    pub error: Option<String>,
}

/// Owner of the authoritative team, task and result collections.
///
/// `teams`, `tasks` and `team_tasks` stay `None` until the first init. Teams
/// are kept keyed by id in ranking order.
#[derive(Debug, Clone, Default)]
pub struct ScoreboardReconciler {
    round: u64,
    round_start: Option<f64>,
    round_time: Option<u64>,
    tasks: Option<Vec<Task>>,
    teams: Option<IndexMap<TeamId, Team>>,
    team_tasks: Option<Vec<TeamTask>>,
    error: Option<String>,
}

impl ScoreboardReconciler {
    /// Empty scoreboard waiting for its first init.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole state from a full snapshot.
    ///
    /// Calling this twice with the same payload yields the same state.
    pub fn apply_init(&mut self, payload: InitPayload) {
        let InitPayload {
            state,
            teams,
            mut tasks,
        } = payload;

        tasks.sort_by_key(|task| task.id);
        let team_tasks = normalize_team_tasks(state.team_tasks);

        let mut teams: IndexMap<TeamId, Team> =
            teams.into_iter().map(|team| (team.id, team)).collect();
        recalc_team_scores(&mut teams, &team_tasks);

        self.tasks = Some(tasks);
        self.teams = Some(teams);
        self.team_tasks = Some(team_tasks);
        self.round = state.round;
        self.round_start = state.round_start;
        self.error = None;
    }

    /// Apply a per-round snapshot; the result list replaces the previous one.
    ///
    /// Before any init there is nothing to rank against, so only round data and
    /// the normalized results are stored and the error is left as is.
    pub fn apply_update(&mut self, payload: GameStatePayload) -> UpdateOutcome {
        let GameStatePayload {
            round,
            round_start,
            team_tasks,
        } = payload;
        let team_tasks = normalize_team_tasks(team_tasks);

        self.round = round;
        self.round_start = round_start;

        let outcome = match (&mut self.teams, &self.tasks) {
            (Some(teams), Some(_)) => {
                recalc_team_scores(teams, &team_tasks);
                self.error = None;
                UpdateOutcome::Ranked
            }
            _ => UpdateOutcome::AwaitingInit,
        };

        self.team_tasks = Some(team_tasks);
        outcome
    }

    /// Record or clear a transport error. Does not touch scoreboard data.
    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    /// Record the round duration advertised by the game server.
    pub fn set_round_time(&mut self, round_time: Option<u64>) {
        self.round_time = round_time;
    }

    /// Drop everything and go back to waiting for an init.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Current round number.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Start of the current round, epoch seconds.
    pub fn round_start(&self) -> Option<f64> {
        self.round_start
    }

    /// Round duration in seconds, once known.
    pub fn round_time(&self) -> Option<u64> {
        self.round_time
    }

    /// Current transport error, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Teams in ranking order, `None` before the first init.
    pub fn teams(&self) -> Option<impl Iterator<Item = &Team>> {
        self.teams.as_ref().map(|teams| teams.values())
    }

    /// Tasks ordered by id, `None` before the first init.
    pub fn tasks(&self) -> Option<&[Task]> {
        self.tasks.as_deref()
    }

    /// Latest normalized results, `None` before any snapshot.
    pub fn team_tasks(&self) -> Option<&[TeamTask]> {
        self.team_tasks.as_deref()
    }

    /// Look a team up by id.
    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.as_ref()?.get(&id)
    }

    /// 1-based ranking position of a team.
    pub fn place_of(&self, id: TeamId) -> Option<usize> {
        self.teams.as_ref()?.get_index_of(&id).map(|index| index + 1)
    }

    /// Snapshot of the current state.
    pub fn view(&self) -> ScoreboardView {
        ScoreboardView {
            round: self.round,
            round_start: self.round_start,
            round_time: self.round_time,
            teams: self
                .teams
                .as_ref()
                .map(|teams| teams.values().cloned().collect()),
            tasks: self.tasks.clone(),
            team_tasks: self.team_tasks.clone(),
            error: self.error.clone(),
        }
    }
}

impl NameLookup for ScoreboardReconciler {
    fn team_name(&self, id: TeamId) -> Option<&str> {
        self.team(id).map(|team| team.name.as_str())
    }

    fn task_name(&self, id: TaskId) -> Option<&str> {
        self.tasks
            .as_ref()?
            .iter()
            .find(|task| task.id == id)
            .map(|task| task.name.as_str())
    }
}

/// Set every team's score to the sum of its results and rank the teams.
///
/// Ranking is score descending, then id ascending, so every team has exactly
/// one position. Results for unknown team ids count towards nobody.
pub fn recalc_team_scores(teams: &mut IndexMap<TeamId, Team>, team_tasks: &[TeamTask]) {
    let mut totals: HashMap<TeamId, f64> = HashMap::new();
    for result in team_tasks {
        *totals.entry(result.team_id).or_default() += result.score;
    }

    for (id, team) in teams.iter_mut() {
        team.score = totals.get(id).copied().unwrap_or(0.0);
    }

    teams.sort_by(|a_id, a, b_id, b| b.score.total_cmp(&a.score).then_with(|| a_id.cmp(b_id)));
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::dto::ingest::RawTeamTask;

    fn team(id: TeamId, name: &str) -> Team {
        serde_json::from_value(json!({ "id": id, "name": name })).unwrap()
    }

    fn task(id: TaskId, name: &str) -> Task {
        serde_json::from_value(json!({ "id": id, "name": name })).unwrap()
    }

    fn result(team_id: TeamId, task_id: TaskId, score: f64) -> RawTeamTask {
        RawTeamTask {
            task_id,
            team_id,
            status: 101,
            stolen: 0,
            lost: 0,
            score,
            checks: 2,
            checks_passed: 2,
            message: String::new(),
        }
    }

    fn state(round: u64, team_tasks: Vec<RawTeamTask>) -> GameStatePayload {
        GameStatePayload {
            round,
            round_start: Some(1000.0),
            team_tasks,
        }
    }

    fn ranked_ids(reconciler: &ScoreboardReconciler) -> Vec<TeamId> {
        reconciler.teams().unwrap().map(|team| team.id).collect()
    }

    fn sample_init() -> InitPayload {
        InitPayload {
            state: state(1, vec![result(1, 1, 500.0)]),
            teams: vec![team(1, "A"), team(2, "B")],
            tasks: vec![task(1, "web")],
        }
    }

    #[test]
    fn starts_empty() {
        let reconciler = ScoreboardReconciler::new();
        let view = reconciler.view();
        assert_eq!(view.round, 0);
        assert_eq!(view.round_start, None);
        assert!(view.teams.is_none());
        assert!(view.tasks.is_none());
        assert!(view.team_tasks.is_none());
        assert!(view.error.is_none());
    }

    #[test]
    fn init_ranks_and_normalizes() {
        let mut reconciler = ScoreboardReconciler::new();
        reconciler.apply_init(sample_init());

        let view = reconciler.view();
        let teams = view.teams.unwrap();
        assert_eq!(teams[0].id, 1);
        assert_eq!(teams[0].score, 500.0);
        assert_eq!(teams[1].id, 2);
        assert_eq!(teams[1].score, 0.0);

        let team_tasks = view.team_tasks.unwrap();
        assert_eq!(team_tasks[0].sla, 100.0);
        assert_eq!(team_tasks[0].message, "OK");
        assert_eq!(view.round, 1);
        assert_eq!(view.round_start, Some(1000.0));
    }

    #[test]
    fn init_sorts_tasks_by_id() {
        let mut reconciler = ScoreboardReconciler::new();
        let mut payload = sample_init();
        payload.tasks = vec![task(3, "pwn"), task(1, "web"), task(2, "crypto")];
        reconciler.apply_init(payload);

        let ids: Vec<_> = reconciler.tasks().unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn ties_are_broken_by_id() {
        let mut reconciler = ScoreboardReconciler::new();
        reconciler.apply_init(InitPayload {
            state: state(2, vec![result(5, 1, 100.0), result(3, 1, 100.0), result(4, 1, 250.0)]),
            teams: vec![team(5, "E"), team(3, "C"), team(4, "D"), team(9, "I")],
            tasks: vec![task(1, "web")],
        });

        assert_eq!(ranked_ids(&reconciler), vec![4, 3, 5, 9]);
        assert_eq!(reconciler.place_of(3), Some(2));
        assert_eq!(reconciler.place_of(42), None);
    }

    #[test]
    fn team_scores_sum_to_result_scores() {
        let mut reconciler = ScoreboardReconciler::new();
        reconciler.apply_init(InitPayload {
            state: state(
                3,
                vec![
                    result(1, 1, 120.0),
                    result(1, 2, 80.0),
                    result(2, 1, 300.0),
                    result(2, 2, -20.0),
                    result(3, 2, 10.0),
                ],
            ),
            teams: vec![team(1, "A"), team(2, "B"), team(3, "C")],
            tasks: vec![task(1, "web"), task(2, "pwn")],
        });

        let view = reconciler.view();
        let team_total: f64 = view.teams.as_ref().unwrap().iter().map(|t| t.score).sum();
        let result_total: f64 = view.team_tasks.as_ref().unwrap().iter().map(|t| t.score).sum();
        assert_eq!(team_total, result_total);
        assert_eq!(ranked_ids(&reconciler), vec![2, 1, 3]);
    }

    fn assert_ranked_and_balanced(reconciler: &ScoreboardReconciler) {
        let view = reconciler.view();
        let teams = view.teams.unwrap();
        for pair in teams.windows(2) {
            assert!(
                pair[0].score > pair[1].score
                    || (pair[0].score == pair[1].score && pair[0].id < pair[1].id),
                "teams {} and {} out of order",
                pair[0].id,
                pair[1].id
            );
        }
        let team_total: f64 = teams.iter().map(|t| t.score).sum();
        let result_total: f64 = view.team_tasks.unwrap().iter().map(|t| t.score).sum();
        assert_eq!(team_total, result_total);
    }

    #[test]
    fn ranking_and_totals_hold_across_successive_inits() {
        let mut reconciler = ScoreboardReconciler::new();

        reconciler.apply_init(InitPayload {
            state: state(1, vec![result(1, 1, 50.0), result(2, 1, 70.0), result(3, 1, 70.0), result(4, 1, 10.0)]),
            teams: vec![team(1, "A"), team(2, "B"), team(3, "C"), team(4, "D")],
            tasks: vec![task(1, "web")],
        });
        assert_ranked_and_balanced(&reconciler);
        assert_eq!(ranked_ids(&reconciler), vec![2, 3, 1, 4]);

        reconciler.apply_init(InitPayload {
            state: state(2, vec![result(4, 1, 5.0), result(4, 2, 200.0), result(1, 2, 30.0)]),
            teams: vec![team(4, "D"), team(1, "A")],
            tasks: vec![task(1, "web"), task(2, "pwn")],
        });
        assert_ranked_and_balanced(&reconciler);
        assert_eq!(ranked_ids(&reconciler), vec![4, 1]);

        reconciler.apply_init(InitPayload {
            state: state(3, vec![result(3, 1, 0.0), result(2, 1, 0.0), result(5, 1, 1.0), result(1, 1, 0.0)]),
            teams: vec![team(3, "C"), team(5, "E"), team(2, "B"), team(1, "A")],
            tasks: vec![task(1, "web")],
        });
        assert_ranked_and_balanced(&reconciler);
        assert_eq!(ranked_ids(&reconciler), vec![5, 1, 2, 3]);
        assert!(reconciler.team(4).is_none());
    }

    #[test]
    fn duplicate_results_in_one_snapshot_count_once() {
        let mut reconciler = ScoreboardReconciler::new();
        reconciler.apply_init(InitPayload {
            state: state(1, vec![result(1, 1, 100.0), result(2, 1, 50.0), result(1, 1, 300.0)]),
            teams: vec![team(1, "A"), team(2, "B")],
            tasks: vec![task(1, "web")],
        });

        let team_tasks = reconciler.team_tasks().unwrap();
        assert_eq!(team_tasks.len(), 2);
        assert_eq!((team_tasks[0].id, team_tasks[0].score), (1001, 300.0));
        assert_eq!(reconciler.team(1).unwrap().score, 300.0);
        assert_ranked_and_balanced(&reconciler);
    }

    #[test]
    fn init_is_idempotent() {
        let mut reconciler = ScoreboardReconciler::new();
        reconciler.apply_init(sample_init());
        let first = reconciler.view();
        reconciler.apply_init(sample_init());
        assert_eq!(reconciler.view(), first);
    }

    #[test]
    fn init_clears_error() {
        let mut reconciler = ScoreboardReconciler::new();
        reconciler.set_error(Some("Can't connect to server".into()));
        reconciler.apply_init(sample_init());
        assert_eq!(reconciler.error(), None);
    }

    #[test]
    fn update_before_init_stores_partial_state() {
        let mut reconciler = ScoreboardReconciler::new();
        reconciler.set_error(Some("offline".into()));

        let outcome = reconciler.apply_update(GameStatePayload {
            round: 7,
            round_start: None,
            team_tasks: vec![result(1, 1, 10.0)],
        });

        assert_eq!(outcome, UpdateOutcome::AwaitingInit);
        let view = reconciler.view();
        assert_eq!(view.round, 7);
        assert_eq!(view.round_start, None);
        assert!(view.teams.is_none());
        assert!(view.tasks.is_none());
        assert_eq!(view.team_tasks.unwrap()[0].message, "OK");
        assert_eq!(view.error.as_deref(), Some("offline"));
    }

    #[test]
    fn update_reranks_existing_teams() {
        let mut reconciler = ScoreboardReconciler::new();
        reconciler.apply_init(sample_init());
        reconciler.set_error(Some("blip".into()));

        let outcome = reconciler.apply_update(state(2, vec![result(1, 1, 100.0), result(2, 1, 400.0)]));

        assert_eq!(outcome, UpdateOutcome::Ranked);
        assert_eq!(ranked_ids(&reconciler), vec![2, 1]);
        assert_eq!(reconciler.team(2).unwrap().score, 400.0);
        assert_eq!(reconciler.team(2).unwrap().name, "B");
        assert_eq!(reconciler.round(), 2);
        assert_eq!(reconciler.error(), None);
    }

    #[test]
    fn update_replaces_results_instead_of_merging() {
        let mut reconciler = ScoreboardReconciler::new();
        reconciler.apply_init(sample_init());

        reconciler.apply_update(state(2, vec![result(2, 1, 40.0)]));

        let team_tasks = reconciler.team_tasks().unwrap();
        assert_eq!(team_tasks.len(), 1);
        assert_eq!(team_tasks[0].team_id, 2);
        assert_eq!(reconciler.team(1).unwrap().score, 0.0);
    }

    #[test]
    fn late_init_does_not_replay_earlier_updates() {
        let mut reconciler = ScoreboardReconciler::new();
        reconciler.apply_update(state(5, vec![result(2, 1, 999.0)]));
        reconciler.apply_init(sample_init());

        assert_eq!(reconciler.round(), 1);
        assert_eq!(reconciler.team(2).unwrap().score, 0.0);
        assert_eq!(reconciler.team_tasks().unwrap().len(), 1);
    }

    #[test]
    fn results_for_unknown_teams_are_not_counted() {
        let mut reconciler = ScoreboardReconciler::new();
        let mut payload = sample_init();
        payload.state.team_tasks.push(result(77, 1, 1000.0));
        reconciler.apply_init(payload);

        assert_eq!(ranked_ids(&reconciler), vec![1, 2]);
        assert!(reconciler.team(77).is_none());
    }

    #[test]
    fn name_lookup_resolves_known_ids() {
        let mut reconciler = ScoreboardReconciler::new();
        assert_eq!(reconciler.team_name(1), None);

        reconciler.apply_init(sample_init());
        assert_eq!(reconciler.team_name(2), Some("B"));
        assert_eq!(reconciler.task_name(1), Some("web"));
        assert_eq!(reconciler.task_name(2), None);
    }

    #[test]
    fn reset_returns_to_initial_state() {
        let mut reconciler = ScoreboardReconciler::new();
        reconciler.apply_init(sample_init());
        reconciler.set_round_time(Some(60));
        reconciler.reset();

        assert_eq!(reconciler.view(), ScoreboardReconciler::new().view());
    }
}
