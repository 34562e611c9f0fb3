use std::collections::BTreeMap;

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::event::EventLog;
use crate::model::gamification::GamificationState;
use crate::model::journal::JournalEntry;
use crate::model::task::{Category, Quadrant, Task};

/// Points awarded per Eisenhower quadrant on task completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadrantPoints {
    #[serde(default = "default_q1")]
    pub urgent_important: i64,
    #[serde(default = "default_q2")]
    pub not_urgent_important: i64,
    #[serde(default = "default_q3")]
    pub urgent_not_important: i64,
    #[serde(default = "default_q4")]
    pub not_urgent_not_important: i64,
}

fn default_q1() -> i64 {
    20
}
fn default_q2() -> i64 {
    15
}
fn default_q3() -> i64 {
    10
}
fn default_q4() -> i64 {
    5
}

impl Default for QuadrantPoints {
    fn default() -> Self {
        QuadrantPoints {
            urgent_important: default_q1(),
            not_urgent_important: default_q2(),
            urgent_not_important: default_q3(),
            not_urgent_not_important: default_q4(),
        }
    }
}

impl QuadrantPoints {
    pub fn for_quadrant(&self, quadrant: Quadrant) -> i64 {
        match quadrant {
            Quadrant::UrgentImportant => self.urgent_important,
            Quadrant::NotUrgentImportant => self.not_urgent_important,
            Quadrant::UrgentNotImportant => self.urgent_not_important,
            Quadrant::NotUrgentNotImportant => self.not_urgent_not_important,
        }
    }
}

/// User-tunable knobs persisted with the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_daily_goal")]
    pub daily_goal: u32,
    /// Per-category daily completion goals
    #[serde(default)]
    pub category_goals: BTreeMap<String, u32>,
    #[serde(default)]
    pub ai_enabled: bool,
    #[serde(default)]
    pub quadrant_points: QuadrantPoints,
}

fn default_daily_goal() -> u32 {
    3
}

impl Default for Settings {
    fn default() -> Self {
        let category_goals = Category::ALL
            .iter()
            .map(|c| (c.key().to_string(), 1))
            .collect();
        Settings {
            daily_goal: default_daily_goal(),
            category_goals,
            ai_enabled: false,
            quadrant_points: QuadrantPoints::default(),
        }
    }
}

/// The whole persisted state: one JSON document, read-modify-written as a
/// scoped unit. Last-writer-wins if the underlying file is shared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Task id → task, insertion-ordered
    #[serde(default)]
    pub tasks: IndexMap<String, Task>,
    #[serde(default)]
    pub events: EventLog,
    #[serde(default)]
    pub gamification: GamificationState,
    /// Keyed by `YYYY-MM-DD`, one entry per day
    #[serde(default)]
    pub journal_entries: BTreeMap<NaiveDate, JournalEntry>,
    #[serde(default)]
    pub settings: Settings,
}

impl Document {
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn open_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values().filter(|t| !t.done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_match_points_table() {
        let settings = Settings::default();
        assert_eq!(
            settings.quadrant_points.for_quadrant(Quadrant::UrgentImportant),
            20
        );
        assert_eq!(
            settings
                .quadrant_points
                .for_quadrant(Quadrant::NotUrgentNotImportant),
            5
        );
        assert_eq!(settings.daily_goal, 3);
        assert_eq!(settings.category_goals.len(), Category::ALL.len());
    }

    #[test]
    fn empty_document_from_empty_json() {
        let doc: Document = serde_json::from_str("{}").unwrap();
        assert!(doc.tasks.is_empty());
        assert!(doc.events.is_empty());
        assert_eq!(doc.gamification, GamificationState::default());
    }

    #[test]
    fn journal_keys_serialize_as_iso_dates() {
        let mut doc = Document::default();
        let day = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        doc.journal_entries
            .insert(day, crate::model::journal::JournalEntry::new(day));
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.contains("\"2025-06-01\""));
    }
}
