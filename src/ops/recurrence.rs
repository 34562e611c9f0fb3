//! Recurring-task regeneration: due-date advancement and the one-shot
//! successor spawn guarded by the completion token.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use uuid::Uuid;

use crate::model::task::{Recurrence, Task};

/// Namespace for deterministic successor ids: the same completion token
/// always maps to the same successor id, so a replayed completion finds the
/// successor already present instead of spawning a second one.
const SPAWN_NAMESPACE: Uuid = Uuid::from_u128(0xc1c4_db05_050c_4b1a_9c8a_2f2b_5756_fa0c);

/// Advance a due date per the recurrence rule. `Once` yields no successor
/// date. Month/year arithmetic clamps the day to the target month's length.
pub fn advance_due(current: NaiveDate, recurrence: Recurrence) -> Option<NaiveDate> {
    match recurrence {
        Recurrence::Once => None,
        Recurrence::Daily => current.checked_add_days(Days::new(1)),
        Recurrence::Weekdays => {
            let mut candidate = current.checked_add_days(Days::new(1))?;
            while matches!(candidate.weekday(), Weekday::Sat | Weekday::Sun) {
                candidate = candidate.checked_add_days(Days::new(1))?;
            }
            Some(candidate)
        }
        Recurrence::Weekly => current.checked_add_days(Days::new(7)),
        Recurrence::Monthly => {
            let (year, month) = if current.month() == 12 {
                (current.year() + 1, 1)
            } else {
                (current.year(), current.month() + 1)
            };
            let day = current.day().min(days_in_month(year, month));
            NaiveDate::from_ymd_opt(year, month, day)
        }
        Recurrence::Yearly => {
            let year = current.year() + 1;
            let day = current.day().min(days_in_month(year, current.month()));
            NaiveDate::from_ymd_opt(year, current.month(), day)
        }
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.and_then(|d| d.pred_opt()).map(|d| d.day()).unwrap_or(28)
}

/// The id a successor spawned from this completion token will carry.
pub fn successor_id(completion_token: &str) -> String {
    Uuid::new_v5(&SPAWN_NAMESPACE, completion_token.as_bytes()).to_string()
}

/// Build the next occurrence of a completed recurring task: advanced due
/// date, progress reset to zero, milestones back to backlog with fresh ids.
/// Returns `None` for non-recurring tasks.
pub fn spawn_successor(completed: &Task, completion_token: &str) -> Option<Task> {
    if completed.recurrence == Recurrence::Once {
        return None;
    }

    let mut successor = completed.clone();
    successor.id = successor_id(completion_token);
    successor.done = false;
    successor.completed_at = None;
    successor.created_at = completed.completed_at.unwrap_or(completed.created_at);
    successor.due_date = completed
        .due_date
        .and_then(|d| advance_due(d, completed.recurrence));
    if let Some(progress) = &mut successor.progress {
        progress.current = 0.0;
    }
    for milestone in &mut successor.milestones {
        milestone.id = Uuid::new_v4().to_string();
        milestone.status = crate::model::task::MilestoneStatus::Backlog;
    }
    Some(successor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::{
        Category, EffortTier, Milestone, MilestoneStatus, ProgressRule, Quadrant,
    };
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn daily_advances_one_day() {
        assert_eq!(
            advance_due(date(2025, 6, 1), Recurrence::Daily),
            Some(date(2025, 6, 2))
        );
    }

    #[test]
    fn weekdays_skips_weekend() {
        // 2025-06-06 is a Friday
        assert_eq!(
            advance_due(date(2025, 6, 6), Recurrence::Weekdays),
            Some(date(2025, 6, 9))
        );
        assert_eq!(
            advance_due(date(2025, 6, 3), Recurrence::Weekdays),
            Some(date(2025, 6, 4))
        );
    }

    #[test]
    fn monthly_clamps_day_to_month_length() {
        assert_eq!(
            advance_due(date(2025, 1, 31), Recurrence::Monthly),
            Some(date(2025, 2, 28))
        );
        assert_eq!(
            advance_due(date(2025, 12, 15), Recurrence::Monthly),
            Some(date(2026, 1, 15))
        );
    }

    #[test]
    fn yearly_clamps_leap_day() {
        assert_eq!(
            advance_due(date(2024, 2, 29), Recurrence::Yearly),
            Some(date(2025, 2, 28))
        );
    }

    #[test]
    fn once_never_advances() {
        assert_eq!(advance_due(date(2025, 6, 1), Recurrence::Once), None);
    }

    #[test]
    fn successor_id_is_deterministic() {
        assert_eq!(successor_id("t1:2025-06-01"), successor_id("t1:2025-06-01"));
        assert_ne!(successor_id("t1:2025-06-01"), successor_id("t1:2025-06-02"));
    }

    #[test]
    fn spawn_resets_progress_and_milestones() {
        let mut task = Task::new(
            "Water plants".into(),
            Category::DailyStructure,
            Quadrant::NotUrgentImportant,
            Utc::now(),
        );
        task.recurrence = Recurrence::Daily;
        task.due_date = Some(date(2025, 6, 1));
        task.done = true;
        task.completed_at = Some(Utc::now());
        task.progress = Some(ProgressRule {
            target: 4.0,
            unit: "pots".into(),
            current: 4.0,
            auto_done_when_target_reached: true,
            criteria: String::new(),
        });
        let mut milestone = Milestone::new("front room".into(), EffortTier::Small, 5);
        milestone.status = MilestoneStatus::Done;
        task.milestones.push(milestone);

        let successor = spawn_successor(&task, "tok").unwrap();
        assert_ne!(successor.id, task.id);
        assert!(!successor.done);
        assert!(successor.completed_at.is_none());
        assert_eq!(successor.due_date, Some(date(2025, 6, 2)));
        assert_eq!(successor.progress.as_ref().unwrap().current, 0.0);
        assert_eq!(successor.milestones[0].status, MilestoneStatus::Backlog);
        assert_ne!(successor.milestones[0].id, task.milestones[0].id);
    }

    #[test]
    fn once_tasks_do_not_spawn() {
        let task = Task::new(
            "one-off".into(),
            Category::Admin,
            Quadrant::UrgentImportant,
            Utc::now(),
        );
        assert!(spawn_successor(&task, "tok").is_none());
    }
}
