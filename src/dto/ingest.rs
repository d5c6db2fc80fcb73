//! Payloads delivered by the game server, either over the ingest websocket or
//! the HTTP ingest routes.

use std::collections::HashSet;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use serde_with::{DefaultOnNull, serde_as};
use thiserror::Error;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::state::models::{MAX_TASK_ID, MAX_TEAM_ID, TaskId, Task, Team, TeamId};

/// Per-team-per-task result exactly as the game server reports it.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema, Validate)]
pub struct RawTeamTask {
    #[validate(range(min = 0, max = MAX_TASK_ID))]
    pub task_id: TaskId,
    #[validate(range(min = 0, max = MAX_TEAM_ID))]
    pub team_id: TeamId,
    /// Checker status code (101 up, 102 corrupt, 103 mumble, 104 down, 110 checker error).
    pub status: u16,
    #[serde(default)]
    pub stolen: u32,
    #[serde(default)]
    pub lost: u32,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub checks: u32,
    #[serde(default)]
    pub checks_passed: u32,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub message: String,
}

/// Game state snapshot; also the body of an `update_scoreboard` message.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema, Validate)]
pub struct GameStatePayload {
    #[serde(default)]
    pub round: u64,
    /// Epoch seconds of the current round start, `null` when no round is timed.
    #[serde(default)]
    pub round_start: Option<f64>,
    #[serde(default)]
    #[validate(nested)]
    pub team_tasks: Vec<RawTeamTask>,
}

/// Full snapshot delivered once per connection or resync.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema, Validate)]
pub struct InitPayload {
    #[validate(nested)]
    pub state: GameStatePayload,
    #[validate(custom(function = "validate_unique_team_ids"))]
    pub teams: Vec<Team>,
    #[validate(custom(function = "validate_unique_task_ids"))]
    pub tasks: Vec<Task>,
}

/// Notification that an attacker stole a flag from a victim.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
pub struct FlagStolenPayload {
    pub attacker_id: TeamId,
    pub victim_id: TeamId,
    pub task_id: TaskId,
    /// Points gained by the attacker.
    pub attacker_delta: f64,
}

impl FlagStolenPayload {
    /// Unwrap an optional `{ "data": ... }` envelope and decode the payload.
    ///
    /// Returns `None` for `null`, a `null` inner envelope, or anything that does
    /// not decode: the live feed is best effort and such frames are dropped.
    pub fn from_value(value: Value) -> Option<Self> {
        let inner = match value {
            Value::Null => return None,
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Null) | None => Value::Object(map),
                Some(data) => data,
            },
            other => other,
        };

        serde_json::from_value(inner).ok()
    }
}

/// Acknowledgement returned by the HTTP scoreboard ingest routes.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct IngestAck {
    /// Round now held by the scoreboard.
    pub round: u64,
    /// `false` when an update arrived before any init and could not be ranked.
    pub ranked: bool,
}

/// Event names used on the ingest websocket.
pub const EVENT_INIT_SCOREBOARD: &str = "init_scoreboard";
/// See [`EVENT_INIT_SCOREBOARD`].
pub const EVENT_UPDATE_SCOREBOARD: &str = "update_scoreboard";
/// See [`EVENT_INIT_SCOREBOARD`].
pub const EVENT_FLAG_STOLEN: &str = "flag_stolen";

#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    data: Value,
}

/// Decoded ingest websocket frame.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestMessage {
    /// Full snapshot, replaces teams and tasks.
    InitScoreboard(InitPayload),
    /// Partial snapshot for the new round.
    UpdateScoreboard(GameStatePayload),
    /// Live feed notification; `None` when the payload was absent or unusable.
    FlagStolen(Option<FlagStolenPayload>),
    /// Any event name we do not handle.
    Unknown(String),
}

/// Failure to decode an ingest frame.
#[derive(Debug, Error)]
pub enum IngestParseError {
    /// Frame is not a JSON `{ "event", "data" }` envelope.
    #[error("malformed ingest envelope")]
    Envelope(#[source] serde_json::Error),
    /// Envelope was fine but `data` does not match the event.
    #[error("invalid `{event}` payload")]
    Payload {
        event: String,
        #[source]
        source: serde_json::Error,
    },
    /// Snapshot decoded but failed validation.
    #[error("invalid `{event}` payload: {errors}")]
    Invalid {
        event: String,
        errors: validator::ValidationErrors,
    },
}

impl IngestMessage {
    /// Parse and validate a text frame received on the ingest websocket.
    pub fn from_json_str(text: &str) -> Result<Self, IngestParseError> {
        let Envelope { event, data } =
            serde_json::from_str(text).map_err(IngestParseError::Envelope)?;

        match event.as_str() {
            EVENT_INIT_SCOREBOARD => decode_validated(event, data).map(Self::InitScoreboard),
            EVENT_UPDATE_SCOREBOARD => decode_validated(event, data).map(Self::UpdateScoreboard),
            EVENT_FLAG_STOLEN => Ok(Self::FlagStolen(FlagStolenPayload::from_value(data))),
            _ => Ok(Self::Unknown(event)),
        }
    }
}

fn decode_validated<T>(event: String, data: Value) -> Result<T, IngestParseError>
where
    T: DeserializeOwned + Validate,
{
    let payload: T = match serde_json::from_value(data) {
        Ok(payload) => payload,
        Err(source) => return Err(IngestParseError::Payload { event, source }),
    };
    payload
        .validate()
        .map_err(|errors| IngestParseError::Invalid { event, errors })?;
    Ok(payload)
}

fn validate_unique_team_ids(teams: &[Team]) -> Result<(), ValidationError> {
    ensure_unique(teams.iter().map(|team| team.id), "duplicate_team_id")
}

fn validate_unique_task_ids(tasks: &[Task]) -> Result<(), ValidationError> {
    ensure_unique(tasks.iter().map(|task| task.id), "duplicate_task_id")
}

fn ensure_unique(
    ids: impl Iterator<Item = i64>,
    code: &'static str,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            let mut err = ValidationError::new(code);
            err.message = Some(format!("identifier {id} appears more than once").into());
            return Err(err);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn init_json() -> Value {
        json!({
            "state": {
                "round": 3,
                "round_start": 1700000000,
                "team_tasks": [{
                    "team_id": 1, "task_id": 1, "status": 101, "stolen": 0, "lost": 0,
                    "score": 500, "checks": 2, "checks_passed": 2, "message": null
                }]
            },
            "teams": [{ "id": 1, "name": "A" }, { "id": 2, "name": "B" }],
            "tasks": [{ "id": 1, "name": "web" }]
        })
    }

    #[test]
    fn parses_init_envelope() {
        let text = json!({ "event": "init_scoreboard", "data": init_json() }).to_string();
        let IngestMessage::InitScoreboard(payload) = IngestMessage::from_json_str(&text).unwrap()
        else {
            panic!("expected init");
        };

        assert_eq!(payload.state.round, 3);
        assert_eq!(payload.state.round_start, Some(1_700_000_000.0));
        assert_eq!(payload.teams.len(), 2);
        assert_eq!(payload.state.team_tasks[0].message, "");
    }

    #[test]
    fn rejects_init_with_duplicate_team_ids() {
        let mut data = init_json();
        data["teams"] = json!([{ "id": 1, "name": "A" }, { "id": 1, "name": "A again" }]);
        let text = json!({ "event": "init_scoreboard", "data": data }).to_string();

        assert!(matches!(
            IngestMessage::from_json_str(&text),
            Err(IngestParseError::Invalid { .. })
        ));
    }

    #[test]
    fn rejects_results_with_out_of_range_ids() {
        let mut data = init_json();
        data["state"]["team_tasks"][0]["team_id"] = json!(9_300_000_000_000_000_i64);
        let text = json!({ "event": "init_scoreboard", "data": data }).to_string();
        assert!(matches!(
            IngestMessage::from_json_str(&text),
            Err(IngestParseError::Invalid { .. })
        ));

        let text = json!({
            "event": "update_scoreboard",
            "data": { "round": 4, "team_tasks": [
                { "team_id": 1, "task_id": 1000, "status": 101 }
            ]}
        })
        .to_string();
        assert!(matches!(
            IngestMessage::from_json_str(&text),
            Err(IngestParseError::Invalid { .. })
        ));
    }

    #[test]
    fn parses_update_with_null_round_start() {
        let text = json!({
            "event": "update_scoreboard",
            "data": { "round": 4, "round_start": null, "team_tasks": [] }
        })
        .to_string();

        assert_eq!(
            IngestMessage::from_json_str(&text).unwrap(),
            IngestMessage::UpdateScoreboard(GameStatePayload {
                round: 4,
                round_start: None,
                team_tasks: vec![],
            })
        );
    }

    #[test]
    fn flag_stolen_accepts_nested_data_envelope() {
        let text = json!({
            "event": "flag_stolen",
            "data": { "data": { "attacker_id": 1, "victim_id": 2, "task_id": 1, "attacker_delta": 50 } }
        })
        .to_string();

        let IngestMessage::FlagStolen(Some(payload)) = IngestMessage::from_json_str(&text).unwrap()
        else {
            panic!("expected flag_stolen payload");
        };
        assert_eq!(payload.attacker_delta, 50.0);
        assert_eq!(payload.victim_id, 2);
    }

    #[test]
    fn flag_stolen_without_data_is_empty() {
        let text = json!({ "event": "flag_stolen" }).to_string();
        assert_eq!(
            IngestMessage::from_json_str(&text).unwrap(),
            IngestMessage::FlagStolen(None)
        );

        let text = json!({ "event": "flag_stolen", "data": null }).to_string();
        assert_eq!(
            IngestMessage::from_json_str(&text).unwrap(),
            IngestMessage::FlagStolen(None)
        );
    }

    #[test]
    fn malformed_flag_stolen_is_dropped() {
        assert_eq!(FlagStolenPayload::from_value(json!({ "attacker_id": "x" })), None);
        assert_eq!(FlagStolenPayload::from_value(json!({ "data": null })), None);
    }

    #[test]
    fn unknown_events_are_reported() {
        let text = json!({ "event": "ping", "data": {} }).to_string();
        assert_eq!(
            IngestMessage::from_json_str(&text).unwrap(),
            IngestMessage::Unknown("ping".into())
        );
    }

    #[test]
    fn garbage_is_an_envelope_error() {
        assert!(matches!(
            IngestMessage::from_json_str("not json"),
            Err(IngestParseError::Envelope(_))
        ));
    }
}
