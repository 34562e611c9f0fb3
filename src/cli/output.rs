use serde::Serialize;

use crate::model::gamification::GamificationState;
use crate::model::journal::JournalEntry;
use crate::model::task::{Milestone, MilestoneStatus, Quadrant, Task};
use crate::ops::align::{AlignmentCandidate, AlignmentSuggestion};
use crate::ops::engine;
use crate::ops::kpi::KpiSnapshot;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson<'a> {
    #[serde(flatten)]
    pub task: &'a Task,
    /// Progress ratio in [0, 1], when the task tracks progress
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_ratio: Option<f64>,
}

#[derive(Serialize)]
pub struct TaskListJson<'a> {
    pub quadrant: Quadrant,
    pub tasks: Vec<TaskJson<'a>>,
}

#[derive(Serialize)]
pub struct StatsJson<'a> {
    #[serde(flatten)]
    pub kpi: &'a KpiSnapshot,
    pub points: i64,
    pub level: i64,
    /// (points into current level, points per level)
    pub level_progress: (i64, i64),
    pub badges: &'a [String],
    pub weekly: Vec<WeeklyCountJson>,
}

#[derive(Serialize)]
pub struct WeeklyCountJson {
    pub date: chrono::NaiveDate,
    pub done: u64,
}

#[derive(Serialize)]
pub struct AlignCandidateJson<'a> {
    pub index: usize,
    #[serde(flatten)]
    pub candidate: &'a AlignmentCandidate,
}

pub fn task_to_json(task: &Task) -> TaskJson<'_> {
    TaskJson {
        task,
        progress_ratio: task.progress.as_ref().map(|r| r.ratio()),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn done_char(task: &Task) -> char {
    if task.done { 'x' } else { ' ' }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// One-line task summary
pub fn format_task_line(task: &Task) -> String {
    let mut extras = Vec::new();
    if let Some(due) = task.due_date {
        extras.push(format!("due {due}"));
    }
    if let Some(rule) = &task.progress {
        extras.push(format!("{}/{} {}", rule.current, rule.target, rule.unit));
    }
    if !task.milestones.is_empty() {
        let done = task
            .milestones
            .iter()
            .filter(|m| m.status == MilestoneStatus::Done)
            .count();
        extras.push(format!("{done}/{} milestones", task.milestones.len()));
    }
    let extras_str = if extras.is_empty() {
        String::new()
    } else {
        format!(" ({})", extras.join(", "))
    };
    format!(
        "[{}] {} p{} {}{}",
        done_char(task),
        short_id(&task.id),
        task.priority,
        task.title,
        extras_str
    )
}

/// Quadrant section header for the list view
pub fn format_quadrant_header(quadrant: Quadrant) -> String {
    let name = match quadrant {
        Quadrant::UrgentImportant => "urgent & important",
        Quadrant::NotUrgentImportant => "not urgent & important",
        Quadrant::UrgentNotImportant => "urgent & not important",
        Quadrant::NotUrgentNotImportant => "not urgent & not important",
    };
    format!("== {} - {} ==", quadrant.short_label(), name)
}

/// Detailed task view
pub fn format_task_detail(task: &Task) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!("[{}] {} {}", done_char(task), task.id, task.title));
    lines.push(format!(
        "quadrant: {}  category: {}  priority: {}",
        task.quadrant.short_label(),
        task.category.key(),
        task.priority
    ));
    if !task.description.is_empty() {
        lines.push(format!("note: {}", task.description));
    }
    if let Some(due) = task.due_date {
        lines.push(format!("due: {due} ({:?})", task.recurrence));
    }
    if let Some(rule) = &task.progress {
        lines.push(format!(
            "progress: {}/{} {} ({:.0}%){}",
            rule.current,
            rule.target,
            rule.unit,
            rule.ratio() * 100.0,
            if rule.auto_done_when_target_reached {
                ", auto-done at target"
            } else {
                ""
            }
        ));
        if !rule.criteria.is_empty() {
            lines.push(format!("criteria: {}", rule.criteria));
        }
    }
    if let Some(completed) = task.completed_at {
        lines.push(format!("completed: {completed}"));
    }
    if !task.milestones.is_empty() {
        lines.push("milestones:".to_string());
        for m in &task.milestones {
            lines.push(format!("  {}", format_milestone_line(m)));
        }
    }
    lines
}

pub fn format_milestone_line(milestone: &Milestone) -> String {
    format!(
        "[{:?}] {} {} ({:?}, {} pts)",
        milestone.status,
        short_id(&milestone.id),
        milestone.title,
        milestone.effort,
        milestone.points
    )
}

/// Stats summary: points, level bar, streak, KPIs, badges
pub fn format_stats(kpi: &KpiSnapshot, gamification: &GamificationState) -> Vec<String> {
    let (have, need) = engine::progress_to_next_level(gamification);
    let mut lines = Vec::new();
    lines.push(format!(
        "level {}  {} pts ({have}/{need} to next)",
        gamification.level, gamification.points
    ));
    lines.push(format!(
        "streak: {} day(s)  today: {}/{} done{}",
        kpi.streak,
        kpi.done_today,
        kpi.daily_goal,
        if kpi.goal_hit { "  goal hit!" } else { "" }
    ));
    if !kpi.by_category_today.is_empty() {
        let parts: Vec<String> = kpi
            .by_category_today
            .iter()
            .map(|(category, count)| format!("{category}: {count}"))
            .collect();
        lines.push(format!("by category: {}", parts.join(", ")));
    }
    if !gamification.badges.is_empty() {
        lines.push(format!("badges: {}", gamification.badges.join(", ")));
    }
    lines
}

/// Weekly completion chart, one row per day
pub fn format_weekly(counts: &[(chrono::NaiveDate, u64)]) -> Vec<String> {
    counts
        .iter()
        .map(|(date, count)| format!("{date}  {:<3} {}", count, "#".repeat(*count as usize)))
        .collect()
}

pub fn format_journal_entry(entry: &JournalEntry) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!("== journal {} ==", entry.date));
    if !entry.moods.is_empty() {
        lines.push(format!("mood: {}", entry.moods.join(", ")));
    }
    let sections = [
        ("mood notes", &entry.mood_notes),
        ("triggers", &entry.triggers_and_reactions),
        ("negative thought", &entry.negative_thought),
        ("rational response", &entry.rational_response),
        ("self-care today", &entry.self_care_today),
        ("self-care tomorrow", &entry.self_care_tomorrow),
    ];
    for (label, text) in sections {
        if !text.trim().is_empty() {
            lines.push(format!("{label}: {text}"));
        }
    }
    if !entry.gratitudes.is_empty() {
        lines.push(format!("grateful for: {}", entry.gratitudes.join(", ")));
    }
    if !entry.categories.is_empty() {
        let keys: Vec<&str> = entry.categories.iter().map(|c| c.key()).collect();
        lines.push(format!("categories: {}", keys.join(", ")));
    }
    if !entry.linked_task_ids.is_empty() {
        lines.push(format!("linked tasks: {}", entry.linked_task_ids.join(", ")));
    }
    lines
}

/// Numbered alignment candidates for review
pub fn format_suggestion(suggestion: &AlignmentSuggestion) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(suggestion.summary.clone());
    let candidates = suggestion.candidates();
    if candidates.is_empty() {
        lines.push("no matches.".to_string());
        return lines;
    }
    for (i, candidate) in candidates.iter().enumerate() {
        let target = match &candidate.task_id {
            Some(id) => format!("{} ({})", candidate.task_title, short_id(id)),
            None => format!("{} (new)", candidate.task_title),
        };
        lines.push(format!(
            "{}. {} +{} pts - {}",
            i + 1,
            target,
            candidate.suggested_points,
            candidate.rationale
        ));
        if !candidate.milestones_to_mark_done.is_empty() {
            lines.push(format!(
                "   marks {} milestone(s) done",
                candidate.milestones_to_mark_done.len()
            ));
        }
        if let Some(delta) = candidate.progress_delta_percent {
            lines.push(format!("   progress +{delta}%"));
        }
    }
    lines.push(format!(
        "confirm with: mo align apply <n>{}",
        if suggestion.from_ai { "" } else { "  (heuristic match)" }
    ));
    lines
}
