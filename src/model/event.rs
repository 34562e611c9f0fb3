use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::task::{Category, Quadrant};

/// Retained dedup window. Events older than this fall out of the log and
/// their tokens could in principle be reprocessed as new; acceptable as long
/// as the cap is large relative to realistic daily event volume.
pub const EVENT_LOG_CAP: usize = 1000;

/// What kind of reward a log entry represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A task flipped open → done (counts toward streak and totals)
    #[default]
    TaskDone,
    /// A 25/50/75% progress threshold was crossed
    ProgressThreshold,
    /// A milestone reached the done column
    Milestone,
    /// A confirmed journal alignment award
    Journal,
}

/// One reward-granting occurrence, appended to the event log.
///
/// Category and quadrant are snapshotted at emission time so history stays
/// accurate when the task is edited later. Points are likewise baked in at
/// emission; the fold never re-reads the settings table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionEvent {
    /// Globally unique idempotency token
    pub token: String,
    pub task_id: String,
    pub category: Category,
    pub quadrant: Quadrant,
    pub points: i64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub kind: EventKind,
}

/// Result of pushing an event through the dedup choke point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Token was unseen; the event is now in the log and its reward may run
    New,
    /// Token already in the retained window; the caller must not re-award
    Duplicate,
}

/// Append-only event log with ring-buffer eviction.
///
/// Every reward-granting mutation passes through [`EventLog::record`]; the
/// reward side effect runs at most once per token even under replays of the
/// same logical action (reload, duplicate UI callback, reminder sweep).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    entries: Vec<CompletionEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        EventLog::default()
    }

    /// Record an event unless its token is already in the retained window.
    pub fn record(&mut self, event: CompletionEvent) -> RecordOutcome {
        if self.contains_token(&event.token) {
            tracing::debug!(token = %event.token, "duplicate event token, skipping");
            return RecordOutcome::Duplicate;
        }
        self.entries.push(event);
        if self.entries.len() > EVENT_LOG_CAP {
            let excess = self.entries.len() - EVENT_LOG_CAP;
            self.entries.drain(..excess);
        }
        RecordOutcome::New
    }

    pub fn contains_token(&self, token: &str) -> bool {
        self.entries.iter().any(|e| e.token == token)
    }

    /// Oldest-first view of the retained events
    pub fn iter(&self) -> impl Iterator<Item = &CompletionEvent> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop anything beyond the retained window (used after loading legacy
    /// documents that were persisted before the cap existed).
    pub fn truncate_to_cap(&mut self) {
        if self.entries.len() > EVENT_LOG_CAP {
            let excess = self.entries.len() - EVENT_LOG_CAP;
            self.entries.drain(..excess);
        }
    }
}
