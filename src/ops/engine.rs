//! The gamification fold: `(state, event) -> state'`.
//!
//! Dedup happens upstream in `EventLog::record`; by the time an event
//! reaches `apply` it is known to be new. Replaying the retained log from
//! the empty state reproduces the persisted state exactly.

use crate::model::event::{CompletionEvent, EventKind};
use crate::model::gamification::{
    GamificationState, BADGE_CONSISTENCY_3, BADGE_CONSISTENCY_7, BADGE_CONSISTENCY_30,
    BADGE_DOUBLE_DIGITS, BADGE_FIRST_STEP, BADGE_TASK_MASTER,
};

/// Points for crossing one 25/50/75% progress threshold
pub const PROGRESS_THRESHOLD_POINTS: i64 = 5;
/// Floor applied to milestone point values at award time
pub const MIN_MILESTONE_POINTS: i64 = 5;
/// Thresholds that earn a one-time progress bonus, as percentages
pub const PROGRESS_THRESHOLDS: [u8; 3] = [25, 50, 75];

/// Fold one event into the state.
pub fn apply(state: &mut GamificationState, event: &CompletionEvent) {
    state.points += event.points;
    state.level = level_for_points(state.points);

    // Only real task completions advance the streak and the counters;
    // bonus events (progress, milestone, journal) are points-only.
    if event.kind == EventKind::TaskDone {
        let day = event.timestamp.date_naive();
        match state.last_active_date {
            None => state.streak = 1,
            Some(last) => {
                let gap = (day - last).num_days();
                if gap == 1 {
                    state.streak += 1;
                } else if gap > 1 {
                    state.streak = 1;
                }
                // gap == 0: same day, unchanged; gap < 0 means an
                // out-of-order replay of an older event, also unchanged
            }
        }
        if state
            .last_active_date
            .map(|last| day > last)
            .unwrap_or(true)
        {
            state.last_active_date = Some(day);
        }
        state.completions += 1;
        assign_badges(state);
    }
}

/// Re-derive the state by folding an ordered event sequence from empty.
pub fn replay<'a, I>(events: I) -> GamificationState
where
    I: IntoIterator<Item = &'a CompletionEvent>,
{
    let mut state = GamificationState::default();
    for event in events {
        apply(&mut state, event);
    }
    state
}

pub fn level_for_points(points: i64) -> i64 {
    1.max(1 + points / 100)
}

/// Points into the current level and points needed to reach the next
pub fn progress_to_next_level(state: &GamificationState) -> (i64, i64) {
    let floor = (state.level - 1) * 100;
    let have = (state.points - floor).max(0);
    (have, 100)
}

fn assign_badges(state: &mut GamificationState) {
    if state.completions >= 1 {
        state.award_badge(BADGE_FIRST_STEP);
    }
    if state.streak >= 3 {
        state.award_badge(BADGE_CONSISTENCY_3);
    }
    if state.streak >= 7 {
        state.award_badge(BADGE_CONSISTENCY_7);
    }
    if state.streak >= 30 {
        state.award_badge(BADGE_CONSISTENCY_30);
    }
    if state.completions >= 10 {
        state.award_badge(BADGE_DOUBLE_DIGITS);
    }
    if state.completions >= 100 {
        state.award_badge(BADGE_TASK_MASTER);
    }
}
