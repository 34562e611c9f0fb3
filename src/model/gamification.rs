use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const BADGE_FIRST_STEP: &str = "First Step";
pub const BADGE_CONSISTENCY_3: &str = "Consistency 3";
pub const BADGE_CONSISTENCY_7: &str = "Consistency 7";
pub const BADGE_CONSISTENCY_30: &str = "Consistency 30";
pub const BADGE_DOUBLE_DIGITS: &str = "Double Digits";
pub const BADGE_TASK_MASTER: &str = "Task Master";

/// Gamification metrics. A left-fold of the event log from the empty state
/// reproduces this exactly (see `ops::engine::replay`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamificationState {
    #[serde(default)]
    pub points: i64,
    #[serde(default = "default_level")]
    pub level: i64,
    /// Monotonically growing; a badge is never revoked
    #[serde(default)]
    pub badges: Vec<String>,
    /// Consecutive calendar days with at least one task completion
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub last_active_date: Option<NaiveDate>,
    /// Cumulative count of folded task completions (drives the count badges)
    #[serde(default)]
    pub completions: u64,
}

fn default_level() -> i64 {
    1
}

impl Default for GamificationState {
    fn default() -> Self {
        GamificationState {
            points: 0,
            level: 1,
            badges: Vec::new(),
            streak: 0,
            last_active_date: None,
            completions: 0,
        }
    }
}

impl GamificationState {
    pub fn has_badge(&self, badge: &str) -> bool {
        self.badges.iter().any(|b| b == badge)
    }

    /// Add a badge unless already earned
    pub fn award_badge(&mut self, badge: &str) {
        if !self.has_badge(badge) {
            self.badges.push(badge.to_string());
        }
    }
}
