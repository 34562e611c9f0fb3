//! Read-only query backing email reminders. The core never sends anything;
//! a delivery layer consumes these snapshots.

use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::model::document::Document;
use crate::model::task::{ReminderOffset, Task};

/// When a reminder for this task should fire, per its preference.
/// Due dates are date-only; the reminder anchors to UTC midnight.
pub fn reminder_at(task: &Task) -> Option<DateTime<Utc>> {
    let due = task.due_date?.and_time(NaiveTime::MIN).and_utc();
    match task.reminder {
        ReminderOffset::None => None,
        ReminderOffset::HourBefore => Some(due - Duration::hours(1)),
        ReminderOffset::DayBefore => Some(due - Duration::days(1)),
    }
}

/// Open tasks whose due date falls within `[reference, reference + window]`.
pub fn due_within<'a>(
    doc: &'a Document,
    reference: DateTime<Utc>,
    window: Duration,
) -> Vec<&'a Task> {
    let end = reference + window;
    doc.open_tasks()
        .filter(|task| {
            task.due_date.is_some_and(|d| {
                let due = d.and_time(NaiveTime::MIN).and_utc();
                reference <= due && due <= end
            })
        })
        .collect()
}

/// Open tasks whose reminder moment has arrived but whose due date hasn't
/// passed yet, relative to `reference`.
pub fn pending_reminders<'a>(doc: &'a Document, reference: DateTime<Utc>) -> Vec<&'a Task> {
    doc.open_tasks()
        .filter(|task| {
            reminder_at(task).is_some_and(|at| {
                let due = task
                    .due_date
                    .map(|d| d.and_time(NaiveTime::MIN).and_utc())
                    .unwrap_or(reference);
                at <= reference && reference <= due
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::{Category, Quadrant};
    use chrono::{NaiveDate, TimeZone};

    fn task_due(day: u32, reminder: ReminderOffset) -> Task {
        let mut task = Task::new(
            "t".into(),
            Category::Admin,
            Quadrant::UrgentImportant,
            Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
        );
        task.due_date = NaiveDate::from_ymd_opt(2025, 6, day);
        task.reminder = reminder;
        task
    }

    #[test]
    fn due_within_filters_open_tasks_in_window() {
        let mut doc = Document::default();
        for (i, day) in [2u32, 5, 20].iter().enumerate() {
            let t = task_due(*day, ReminderOffset::None);
            let mut t = t;
            t.id = format!("t{i}");
            doc.tasks.insert(t.id.clone(), t);
        }
        let mut done = task_due(3, ReminderOffset::None);
        done.id = "done".into();
        done.done = true;
        done.completed_at = Some(Utc.with_ymd_and_hms(2025, 6, 1, 1, 0, 0).unwrap());
        doc.tasks.insert(done.id.clone(), done);

        let reference = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let hits = due_within(&doc, reference, Duration::days(7));
        let ids: Vec<_> = hits.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t0", "t1"]);
    }

    #[test]
    fn reminder_offsets_anchor_to_midnight() {
        let t = task_due(2, ReminderOffset::HourBefore);
        assert_eq!(
            reminder_at(&t),
            Some(Utc.with_ymd_and_hms(2025, 6, 1, 23, 0, 0).unwrap())
        );
        let t = task_due(2, ReminderOffset::DayBefore);
        assert_eq!(
            reminder_at(&t),
            Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap())
        );
        let t = task_due(2, ReminderOffset::None);
        assert_eq!(reminder_at(&t), None);
    }

    #[test]
    fn pending_reminders_respect_window() {
        let mut doc = Document::default();
        let mut t = task_due(2, ReminderOffset::HourBefore);
        t.id = "t0".into();
        doc.tasks.insert(t.id.clone(), t);

        let before = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert!(pending_reminders(&doc, before).is_empty());

        let within = Utc.with_ymd_and_hms(2025, 6, 1, 23, 30, 0).unwrap();
        assert_eq!(pending_reminders(&doc, within).len(), 1);
    }
}
