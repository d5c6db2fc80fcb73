//! Bounded log of "flag stolen" notifications for the live view.

use std::collections::VecDeque;

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::ingest::FlagStolenPayload,
    state::{
        models::{TaskId, TeamId},
        round::now_millis,
    },
};

/// Maximum number of events kept in the feed.
pub const LIVE_FEED_CAPACITY: usize = 100;

/// Read-only name resolution the feed needs from the scoreboard.
pub trait NameLookup {
    /// Display name of a team, if known.
    fn team_name(&self, id: TeamId) -> Option<&str>;
    /// Display name of a task, if known.
    fn task_name(&self, id: TaskId) -> Option<&str>;
}

/// One enriched flag-stolen notification.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LiveEvent {
    /// Monotonic per-feed identifier.
    pub id: u64,
    /// Ingestion time, epoch milliseconds.
    pub timestamp: i64,
    /// Team that stole the flag.
    pub attacker_id: TeamId,
    /// Team the flag was stolen from.
    pub victim_id: TeamId,
    /// Task the flag belongs to.
    pub task_id: TaskId,
    /// Attacker display name, `#<id>` when unknown.
    pub attacker_name: String,
    /// Victim display name, `#<id>` when unknown.
    pub victim_name: String,
    /// Task display name, `task <id>` when unknown.
    pub task_name: String,
    /// Points gained by the attacker.
    pub delta: f64,
}

/// Snapshot of the feed.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct LiveFeedView {
    /// Newest first.
    pub events: Vec<LiveEvent>,
    /// Ingest connection error, if any.
    pub error: Option<String>,
}

/// Newest-first ring of at most [`LIVE_FEED_CAPACITY`] events.
#[derive(Debug, Clone)]
pub struct LiveFeed {
    events: VecDeque<LiveEvent>,
    next_id: u64,
    error: Option<String>,
}

impl Default for LiveFeed {
    fn default() -> Self {
        Self {
            events: VecDeque::with_capacity(LIVE_FEED_CAPACITY),
            next_id: 1,
            error: None,
        }
    }
}

impl LiveFeed {
    /// Create an empty feed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a notification stamped with the current wall-clock time.
    pub fn push_notification(
        &mut self,
        payload: Option<FlagStolenPayload>,
        names: &impl NameLookup,
    ) -> Option<LiveEvent> {
        self.push_notification_at(payload, names, now_millis())
    }

    /// Record a notification with an explicit timestamp (epoch milliseconds).
    ///
    /// An absent payload is ignored. Unknown ids fall back to `#<id>` for
    /// teams and `task <id>` for tasks. Returns the stored event.
    pub fn push_notification_at(
        &mut self,
        payload: Option<FlagStolenPayload>,
        names: &impl NameLookup,
        timestamp: i64,
    ) -> Option<LiveEvent> {
        let FlagStolenPayload {
            attacker_id,
            victim_id,
            task_id,
            attacker_delta,
        } = payload?;

        let event = LiveEvent {
            id: self.next_id,
            timestamp,
            attacker_id,
            victim_id,
            task_id,
            attacker_name: team_label(names, attacker_id),
            victim_name: team_label(names, victim_id),
            task_name: names
                .task_name(task_id)
                .map(str::to_owned)
                .unwrap_or_else(|| format!("task {task_id}")),
            delta: attacker_delta,
        };
        self.next_id += 1;

        self.events.push_front(event.clone());
        self.events.truncate(LIVE_FEED_CAPACITY);
        Some(event)
    }

    /// Record or clear a transport error.
    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    /// Drop all events and the error.
    pub fn clear(&mut self) {
        self.events.clear();
        self.error = None;
    }

    /// Number of events held.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// `true` when no event is held.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Current ingest connection error, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Events newest first.
    pub fn events(&self) -> impl Iterator<Item = &LiveEvent> {
        self.events.iter()
    }

    /// Owned copy of the feed for serialization.
    pub fn view(&self) -> LiveFeedView {
        LiveFeedView {
            events: self.events.iter().cloned().collect(),
            error: self.error.clone(),
        }
    }
}

fn team_label(names: &impl NameLookup, id: TeamId) -> String {
    names
        .team_name(id)
        .map(str::to_owned)
        .unwrap_or_else(|| format!("#{id}"))
}
