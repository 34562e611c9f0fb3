//! Derived completion metrics. Everything here is a pure function of the
//! document and a caller-supplied reference date; nothing reads the wall
//! clock, and nothing is persisted. A date rollover needs no reset step:
//! `done_today` is recomputed fresh against the new reference date.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::model::document::Document;
use crate::model::event::EventKind;
use crate::model::task::Category;

/// Snapshot of completion KPIs relative to a reference day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSnapshot {
    /// Task completions in the retained event window
    pub done_total: u64,
    /// Task completions dated on the reference day
    pub done_today: u64,
    pub daily_goal: u32,
    pub goal_hit: bool,
    pub streak: u32,
    /// Completions on the reference day, per category key
    pub by_category_today: BTreeMap<String, u64>,
    /// Category keys that met their daily goal on the reference day
    pub category_goals_hit: Vec<String>,
}

/// Compute the KPI snapshot for `today`.
///
/// Counts use the category snapshotted into each event, not the current
/// (possibly re-categorized) task, so history stays accurate.
pub fn snapshot(doc: &Document, today: NaiveDate) -> KpiSnapshot {
    let mut done_total = 0u64;
    let mut done_today = 0u64;
    let mut by_category_today: BTreeMap<String, u64> = BTreeMap::new();

    for event in doc.events.iter() {
        if event.kind != EventKind::TaskDone {
            continue;
        }
        done_total += 1;
        if event.timestamp.date_naive() == today {
            done_today += 1;
            *by_category_today
                .entry(event.category.key().to_string())
                .or_default() += 1;
        }
    }

    let category_goals_hit = Category::ALL
        .iter()
        .filter_map(|category| {
            let key = category.key().to_string();
            let goal = doc.settings.category_goals.get(&key).copied()?;
            let count = by_category_today.get(&key).copied().unwrap_or(0);
            (goal > 0 && count >= u64::from(goal)).then_some(key)
        })
        .collect();

    KpiSnapshot {
        done_total,
        done_today,
        daily_goal: doc.settings.daily_goal,
        goal_hit: done_today >= u64::from(doc.settings.daily_goal),
        streak: doc.gamification.streak,
        by_category_today,
        category_goals_hit,
    }
}

/// Task completions per day for the trailing week ending at `today`,
/// oldest first. Feeds the weekly chart.
pub fn weekly_counts(doc: &Document, today: NaiveDate) -> Vec<(NaiveDate, u64)> {
    let mut counts: BTreeMap<NaiveDate, u64> = (0..7)
        .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
        .map(|day| (day, 0))
        .collect();
    for event in doc.events.iter() {
        if event.kind != EventKind::TaskDone {
            continue;
        }
        if let Some(count) = counts.get_mut(&event.timestamp.date_naive()) {
            *count += 1;
        }
    }
    counts.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Quadrant;
    use crate::ops::task_ops::{create, toggle_complete, NewTask};
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, hour, 0, 0).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    fn complete_one(doc: &mut Document, title: &str, category: Category, day: u32) {
        let id = create(
            doc,
            NewTask::new(title, category, Quadrant::NotUrgentNotImportant),
            at(day, 8),
        )
        .unwrap();
        toggle_complete(doc, &id, at(day, 9)).unwrap();
    }

    #[test]
    fn done_today_tracks_reference_date_not_wall_clock() {
        let mut doc = Document::default();
        complete_one(&mut doc, "a", Category::Admin, 1);
        complete_one(&mut doc, "b", Category::Admin, 1);
        complete_one(&mut doc, "c", Category::Health, 2);

        let day1 = snapshot(&doc, date(1));
        assert_eq!(day1.done_today, 2);
        assert_eq!(day1.done_total, 3);

        // Rollover: same document, new reference date, no reset needed
        let day2 = snapshot(&doc, date(2));
        assert_eq!(day2.done_today, 1);
        assert_eq!(day2.done_total, 3);

        let day3 = snapshot(&doc, date(3));
        assert_eq!(day3.done_today, 0);
    }

    #[test]
    fn category_counts_use_event_snapshot() {
        let mut doc = Document::default();
        complete_one(&mut doc, "a", Category::Admin, 1);
        // Re-categorizing the task afterwards must not rewrite history
        let id = doc.tasks.keys().next().unwrap().clone();
        doc.tasks.get_mut(&id).unwrap().category = Category::Health;

        let snap = snapshot(&doc, date(1));
        assert_eq!(snap.by_category_today.get("admin"), Some(&1));
        assert_eq!(snap.by_category_today.get("health"), None);
    }

    #[test]
    fn daily_goal_hit() {
        let mut doc = Document::default();
        doc.settings.daily_goal = 2;
        doc.settings.category_goals.insert("admin".into(), 2);
        complete_one(&mut doc, "a", Category::Admin, 1);
        assert!(!snapshot(&doc, date(1)).goal_hit);
        complete_one(&mut doc, "b", Category::Admin, 1);
        let snap = snapshot(&doc, date(1));
        assert!(snap.goal_hit);
        assert!(snap.category_goals_hit.contains(&"admin".to_string()));
    }

    #[test]
    fn weekly_counts_cover_trailing_seven_days() {
        let mut doc = Document::default();
        complete_one(&mut doc, "a", Category::Admin, 8);
        complete_one(&mut doc, "b", Category::Admin, 10);
        complete_one(&mut doc, "c", Category::Admin, 1); // outside the window

        let counts = weekly_counts(&doc, date(10));
        assert_eq!(counts.len(), 7);
        assert_eq!(counts.first().unwrap().0, date(4));
        let lookup: BTreeMap<_, _> = counts.into_iter().collect();
        assert_eq!(lookup[&date(8)], 1);
        assert_eq!(lookup[&date(10)], 1);
        assert_eq!(lookup[&date(9)], 0);
    }
}
