//! Static reference data for checker status codes.

use serde::Serialize;
use utoipa::ToSchema;

/// Outcome reported by a checker for one team's service during a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Service is up and flags can be retrieved.
    Up,
    /// Service answers but the stored flag is wrong.
    Corrupt,
    /// Service answers with a malformed or partial response.
    Mumble,
    /// Service does not answer at all.
    Down,
    /// The checker itself failed.
    CheckerError,
}

impl TaskStatus {
    /// Every known status, in code order.
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Up,
        TaskStatus::Corrupt,
        TaskStatus::Mumble,
        TaskStatus::Down,
        TaskStatus::CheckerError,
    ];

    /// Wire code used by the game server.
    pub const fn code(self) -> u16 {
        match self {
            TaskStatus::Up => 101,
            TaskStatus::Corrupt => 102,
            TaskStatus::Mumble => 103,
            TaskStatus::Down => 104,
            TaskStatus::CheckerError => 110,
        }
    }

    /// Map a wire code back to a status, `None` for codes we do not know.
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.code() == code)
    }

    /// Short label shown in the scoreboard cells.
    pub const fn label(self) -> &'static str {
        match self {
            TaskStatus::Up => "UP",
            TaskStatus::Corrupt => "CORRUPT",
            TaskStatus::Mumble => "MUMBLE",
            TaskStatus::Down => "DOWN",
            TaskStatus::CheckerError => "CHECKER_ERROR",
        }
    }

    /// Human readable explanation of the status.
    pub const fn description(self) -> &'static str {
        match self {
            TaskStatus::Up => "Service is up",
            TaskStatus::Corrupt => "Corrupt response",
            TaskStatus::Mumble => "Mumble / partial failure",
            TaskStatus::Down => "Service is down",
            TaskStatus::CheckerError => "Checker error",
        }
    }

    /// Hex background color for the status cell.
    pub const fn color(self) -> &'static str {
        match self {
            TaskStatus::Up => "#166534",
            TaskStatus::Corrupt => "#854d0e",
            TaskStatus::Mumble => "#7c2d12",
            TaskStatus::Down => "#7f1d1d",
            TaskStatus::CheckerError => "#312e81",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip_through_lookup() {
        for status in TaskStatus::ALL {
            assert_eq!(TaskStatus::from_code(status.code()), Some(status));
        }
    }

    #[test]
    fn unknown_codes_have_no_status() {
        assert_eq!(TaskStatus::from_code(100), None);
        assert_eq!(TaskStatus::from_code(105), None);
        assert_eq!(TaskStatus::from_code(0), None);
    }

    #[test]
    fn checker_error_uses_code_110() {
        assert_eq!(TaskStatus::CheckerError.code(), 110);
        assert_eq!(TaskStatus::CheckerError.label(), "CHECKER_ERROR");
    }
}
