//! Task store mutations. Every reward-bearing transition funnels through
//! `award_event`, so replays of the same user action (double-click,
//! re-render, reload) award at most once per token.

use chrono::{DateTime, NaiveDate, Utc};

use crate::model::document::Document;
use crate::model::event::{CompletionEvent, EventKind, RecordOutcome};
use crate::model::task::{
    Category, EffortTier, Milestone, MilestoneStatus, ProgressRule, Quadrant, Recurrence,
    ReminderOffset, Task,
};
use crate::ops::{engine, recurrence};

/// Error type for task store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("milestone not found: {0}")]
    MilestoneNotFound(String),
}

/// Fields accepted by [`create`]
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub quadrant: Quadrant,
    pub priority: u8,
    pub due_date: Option<NaiveDate>,
    pub recurrence: Recurrence,
    pub progress: Option<ProgressRule>,
    pub milestones: Vec<Milestone>,
    pub reminder: ReminderOffset,
}

impl NewTask {
    pub fn new(title: impl Into<String>, category: Category, quadrant: Quadrant) -> Self {
        NewTask {
            title: title.into(),
            description: String::new(),
            category,
            quadrant,
            priority: 3,
            due_date: None,
            recurrence: Recurrence::Once,
            progress: None,
            milestones: Vec::new(),
            reminder: ReminderOffset::None,
        }
    }
}

/// What a completion pass did, for caller feedback
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompletionOutcome {
    /// A new event was recorded and folded (false on duplicate token)
    pub awarded: bool,
    /// Id of the recurrence successor, when one was spawned
    pub spawned: Option<String>,
}

/// Result of a [`toggle_complete`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// The task's done flag after the toggle
    pub done: bool,
    pub completion: CompletionOutcome,
}

/// Result of an [`update_progress`] call
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressOutcome {
    /// The clamped value now stored on the task
    pub value: f64,
    /// Thresholds (percent) that earned a first-time bonus this call
    pub thresholds_awarded: Vec<u8>,
    /// The task auto-completed during this call
    pub completed: bool,
    pub completion: CompletionOutcome,
}

// ---------------------------------------------------------------------------
// Creation and editing
// ---------------------------------------------------------------------------

/// Create a task. Validation failures leave the document untouched.
pub fn create(
    doc: &mut Document,
    fields: NewTask,
    now: DateTime<Utc>,
) -> Result<String, StoreError> {
    if fields.title.trim().is_empty() {
        return Err(StoreError::Validation("title must not be empty".into()));
    }
    if !(1..=5).contains(&fields.priority) {
        return Err(StoreError::Validation(format!(
            "priority must be in 1..=5, got {}",
            fields.priority
        )));
    }
    if let Some(rule) = &fields.progress {
        if rule.target <= 0.0 {
            return Err(StoreError::Validation(
                "progress target must be positive".into(),
            ));
        }
    }

    let mut task = Task::new(fields.title, fields.category, fields.quadrant, now);
    task.description = fields.description;
    task.priority = fields.priority;
    task.due_date = fields.due_date;
    task.recurrence = fields.recurrence;
    task.progress = fields.progress;
    task.milestones = fields.milestones;
    task.reminder = fields.reminder;

    let id = task.id.clone();
    doc.tasks.insert(id.clone(), task);

    // A task created already at its auto-complete target completes right away
    auto_complete_if_ready(doc, &id, now);
    Ok(id)
}

/// Partial update for quick-edit. `None` means "leave unchanged"; the nested
/// options on `due_date` and `progress_target` distinguish clearing a value
/// from leaving it alone.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub quadrant: Option<Quadrant>,
    pub priority: Option<u8>,
    pub due_date: Option<Option<NaiveDate>>,
    pub recurrence: Option<Recurrence>,
    pub reminder: Option<ReminderOffset>,
    pub progress_target: Option<Option<f64>>,
    pub progress_unit: Option<String>,
    pub auto_done_when_target_reached: Option<bool>,
    pub criteria: Option<String>,
}

pub fn update(
    doc: &mut Document,
    task_id: &str,
    patch: TaskPatch,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    if let Some(title) = &patch.title {
        if title.trim().is_empty() {
            return Err(StoreError::Validation("title must not be empty".into()));
        }
    }
    if let Some(priority) = patch.priority {
        if !(1..=5).contains(&priority) {
            return Err(StoreError::Validation(format!(
                "priority must be in 1..=5, got {priority}"
            )));
        }
    }
    if let Some(Some(target)) = patch.progress_target {
        if target <= 0.0 {
            return Err(StoreError::Validation(
                "progress target must be positive".into(),
            ));
        }
    }

    let task = doc
        .tasks
        .get_mut(task_id)
        .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;

    if let Some(title) = patch.title {
        task.title = title;
    }
    if let Some(description) = patch.description {
        task.description = description;
    }
    if let Some(category) = patch.category {
        task.category = category;
    }
    if let Some(quadrant) = patch.quadrant {
        task.quadrant = quadrant;
    }
    if let Some(priority) = patch.priority {
        task.priority = priority;
    }
    if let Some(due) = patch.due_date {
        task.due_date = due;
    }
    if let Some(recurrence) = patch.recurrence {
        task.recurrence = recurrence;
    }
    if let Some(reminder) = patch.reminder {
        task.reminder = reminder;
    }
    if let Some(target) = patch.progress_target {
        match target {
            Some(target) => {
                let rule = task.progress.get_or_insert(ProgressRule {
                    target,
                    unit: String::new(),
                    current: 0.0,
                    auto_done_when_target_reached: false,
                    criteria: String::new(),
                });
                rule.target = target;
                rule.current = rule.current.min(target);
            }
            None => task.progress = None,
        }
    }
    if let Some(unit) = patch.progress_unit {
        if let Some(rule) = &mut task.progress {
            rule.unit = unit;
        }
    }
    if let Some(auto) = patch.auto_done_when_target_reached {
        if let Some(rule) = &mut task.progress {
            rule.auto_done_when_target_reached = auto;
        }
    }
    if let Some(criteria) = patch.criteria {
        if let Some(rule) = &mut task.progress {
            rule.criteria = criteria;
        }
    }

    // Lowering a target can put an auto-completing task at 100%
    auto_complete_if_ready(doc, task_id, now);
    Ok(())
}

/// Clone a task into a fresh open one. Identity, timestamps, done state,
/// and processed progress are not carried over: progress restarts at zero
/// and milestones are re-keyed back to the backlog column, so the copy can
/// earn its own rewards.
pub fn duplicate(
    doc: &mut Document,
    task_id: &str,
    now: DateTime<Utc>,
) -> Result<String, StoreError> {
    let source = doc
        .tasks
        .get(task_id)
        .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?
        .clone();

    let mut progress = source.progress;
    if let Some(rule) = &mut progress {
        rule.current = 0.0;
    }
    let milestones = source
        .milestones
        .into_iter()
        .map(|source_ms| {
            let mut milestone = Milestone::new(source_ms.title, source_ms.effort, source_ms.points);
            milestone.description = source_ms.description;
            milestone
        })
        .collect();

    let fields = NewTask {
        title: source.title,
        description: source.description,
        category: source.category,
        quadrant: source.quadrant,
        priority: source.priority,
        due_date: source.due_date,
        recurrence: source.recurrence,
        progress,
        milestones,
        reminder: source.reminder,
    };
    create(doc, fields, now)
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

/// Token guarding a task completion: one award per task per calendar day.
fn completion_token(task_id: &str, date: NaiveDate) -> String {
    format!("{task_id}:{date}")
}

/// Record an event and fold it into gamification state iff its token is new.
fn award_event(doc: &mut Document, event: CompletionEvent) -> bool {
    match doc.events.record(event.clone()) {
        RecordOutcome::Duplicate => false,
        RecordOutcome::New => {
            engine::apply(&mut doc.gamification, &event);
            true
        }
    }
}

/// Reward-and-spawn pass for a task that just flipped to done. The completed
/// task must already be in the store with `done` and `completed_at` set.
fn process_completion(doc: &mut Document, task_id: &str, now: DateTime<Utc>) -> CompletionOutcome {
    let Some(task) = doc.tasks.get(task_id) else {
        return CompletionOutcome::default();
    };
    if !task.done {
        return CompletionOutcome::default();
    }
    let snapshot = task.clone();
    let timestamp = snapshot.completed_at.unwrap_or(now);
    let token = completion_token(&snapshot.id, timestamp.date_naive());

    let event = CompletionEvent {
        token: token.clone(),
        task_id: snapshot.id.clone(),
        category: snapshot.category,
        quadrant: snapshot.quadrant,
        points: doc.settings.quadrant_points.for_quadrant(snapshot.quadrant),
        timestamp,
        kind: EventKind::TaskDone,
    };

    if !award_event(doc, event) {
        // Duplicate token: the reward and any successor spawn already ran
        return CompletionOutcome::default();
    }

    let spawned = recurrence::spawn_successor(&snapshot, &token).and_then(|successor| {
        // The deterministic successor id doubles as a spawn guard across
        // reloads that lost the in-memory log
        if doc.tasks.contains_key(&successor.id) {
            return None;
        }
        let id = successor.id.clone();
        doc.tasks.insert(id.clone(), successor);
        Some(id)
    });

    CompletionOutcome {
        awarded: true,
        spawned,
    }
}

/// Flip a task's done flag.
///
/// Open → done awards points, evaluates badges/streak, and spawns the next
/// occurrence of a recurring task, all exactly once per completion token.
/// Done → open clears `completed_at` but deliberately does not reverse
/// points, badges, or streak.
pub fn toggle_complete(
    doc: &mut Document,
    task_id: &str,
    now: DateTime<Utc>,
) -> Result<ToggleOutcome, StoreError> {
    let task = doc
        .tasks
        .get_mut(task_id)
        .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;

    if task.done {
        task.done = false;
        task.completed_at = None;
        return Ok(ToggleOutcome {
            done: false,
            completion: CompletionOutcome::default(),
        });
    }

    task.done = true;
    task.completed_at = Some(now);
    let completion = process_completion(doc, task_id, now);
    Ok(ToggleOutcome {
        done: true,
        completion,
    })
}

fn auto_complete_if_ready(doc: &mut Document, task_id: &str, now: DateTime<Utc>) {
    let ready = doc.tasks.get(task_id).is_some_and(|task| {
        !task.done
            && task.progress.as_ref().is_some_and(|rule| {
                rule.auto_done_when_target_reached && rule.current >= rule.target
            })
    });
    if ready {
        // NotFound is impossible here; the id was just checked
        let _ = toggle_complete(doc, task_id, now);
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Set a task's progress value, clamped to `[0, target]`.
///
/// Each 25/50/75% threshold crossed for the first time earns a one-time
/// bonus event; reaching the target with auto-complete enabled flips the
/// task done exactly once.
pub fn update_progress(
    doc: &mut Document,
    task_id: &str,
    new_value: f64,
    now: DateTime<Utc>,
) -> Result<ProgressOutcome, StoreError> {
    let task = doc
        .tasks
        .get(task_id)
        .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
    let Some(rule) = &task.progress else {
        return Err(StoreError::Validation(format!(
            "task {task_id} has no progress rule"
        )));
    };

    let target = rule.target;
    let previous = rule.current;
    let clamped = new_value.clamp(0.0, target);
    let category = task.category;
    let quadrant = task.quadrant;

    if let Some(rule) = doc
        .tasks
        .get_mut(task_id)
        .and_then(|t| t.progress.as_mut())
    {
        rule.current = clamped;
    }

    let mut thresholds_awarded = Vec::new();
    for pct in engine::PROGRESS_THRESHOLDS {
        let threshold_value = target * f64::from(pct) / 100.0;
        if previous < threshold_value && threshold_value <= clamped {
            let event = CompletionEvent {
                token: format!("progress:{task_id}:{pct}"),
                task_id: task_id.to_string(),
                category,
                quadrant,
                points: engine::PROGRESS_THRESHOLD_POINTS,
                timestamp: now,
                kind: EventKind::ProgressThreshold,
            };
            if award_event(doc, event) {
                thresholds_awarded.push(pct);
            }
        }
    }

    let mut completed = false;
    let mut completion = CompletionOutcome::default();
    let auto = doc
        .tasks
        .get(task_id)
        .and_then(|t| t.progress.as_ref())
        .is_some_and(|r| r.auto_done_when_target_reached);
    let already_done = doc.tasks.get(task_id).is_some_and(|t| t.done);
    if auto && clamped >= target && !already_done {
        let outcome = toggle_complete(doc, task_id, now)?;
        completed = outcome.done;
        completion = outcome.completion;
    }

    Ok(ProgressOutcome {
        value: clamped,
        thresholds_awarded,
        completed,
        completion,
    })
}

// ---------------------------------------------------------------------------
// Deletion (two-phase)
// ---------------------------------------------------------------------------

/// Phase one: validate the id and return the task that would be removed.
/// Nothing is mutated until [`delete_confirm`].
pub fn delete_request<'a>(doc: &'a Document, task_id: &str) -> Result<&'a Task, StoreError> {
    doc.tasks
        .get(task_id)
        .ok_or_else(|| StoreError::NotFound(task_id.to_string()))
}

/// Phase two: remove the task. Preserves the order of the remaining tasks.
pub fn delete_confirm(doc: &mut Document, task_id: &str) -> Result<Task, StoreError> {
    doc.tasks
        .shift_remove(task_id)
        .ok_or_else(|| StoreError::NotFound(task_id.to_string()))
}

// ---------------------------------------------------------------------------
// Milestones
// ---------------------------------------------------------------------------

/// Direction to move a milestone across the board columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Left,
    Right,
}

pub fn add_milestone(
    doc: &mut Document,
    task_id: &str,
    title: impl Into<String>,
    effort: EffortTier,
    points: i64,
) -> Result<String, StoreError> {
    let title = title.into();
    if title.trim().is_empty() {
        return Err(StoreError::Validation(
            "milestone title must not be empty".into(),
        ));
    }
    let task = doc
        .tasks
        .get_mut(task_id)
        .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
    let milestone = Milestone::new(title, effort, points);
    let id = milestone.id.clone();
    task.milestones.push(milestone);
    Ok(id)
}

/// Partial milestone edit. `None` leaves a field unchanged; status moves go
/// through [`move_milestone`] so awards cannot be bypassed.
#[derive(Debug, Clone, Default)]
pub struct MilestonePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub effort: Option<EffortTier>,
    pub points: Option<i64>,
}

pub fn update_milestone(
    doc: &mut Document,
    task_id: &str,
    milestone_id: &str,
    patch: MilestonePatch,
) -> Result<(), StoreError> {
    if let Some(title) = &patch.title {
        if title.trim().is_empty() {
            return Err(StoreError::Validation(
                "milestone title must not be empty".into(),
            ));
        }
    }
    let milestone = doc
        .tasks
        .get_mut(task_id)
        .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?
        .find_milestone_mut(milestone_id)
        .ok_or_else(|| StoreError::MilestoneNotFound(milestone_id.to_string()))?;

    if let Some(title) = patch.title {
        milestone.title = title;
    }
    if let Some(description) = patch.description {
        milestone.description = description;
    }
    if let Some(effort) = patch.effort {
        milestone.effort = effort;
    }
    if let Some(points) = patch.points {
        milestone.points = points;
    }
    Ok(())
}

/// Move a milestone one column left or right. At the board edge the status
/// is unchanged. Arriving at `Done` awards the milestone's points once.
pub fn move_milestone(
    doc: &mut Document,
    task_id: &str,
    milestone_id: &str,
    direction: MoveDirection,
    now: DateTime<Utc>,
) -> Result<MilestoneStatus, StoreError> {
    let task = doc
        .tasks
        .get_mut(task_id)
        .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
    let category = task.category;
    let quadrant = task.quadrant;
    let milestone = task
        .find_milestone_mut(milestone_id)
        .ok_or_else(|| StoreError::MilestoneNotFound(milestone_id.to_string()))?;

    let order = MilestoneStatus::ORDER;
    let index = order
        .iter()
        .position(|s| *s == milestone.status)
        .unwrap_or(0);
    let new_index = match direction {
        MoveDirection::Left => index.checked_sub(1),
        MoveDirection::Right => (index + 1 < order.len()).then_some(index + 1),
    };
    let Some(new_index) = new_index else {
        return Ok(milestone.status);
    };

    let new_status = order[new_index];
    let was_done = milestone.status == MilestoneStatus::Done;
    milestone.status = new_status;
    let points = milestone.points;

    if new_status == MilestoneStatus::Done && !was_done {
        let event = CompletionEvent {
            token: format!("milestone:{task_id}:{milestone_id}"),
            task_id: task_id.to_string(),
            category,
            quadrant,
            points: points.max(engine::MIN_MILESTONE_POINTS),
            timestamp: now,
            kind: EventKind::Milestone,
        };
        award_event(doc, event);
    }
    Ok(new_status)
}

/// Put a milestone straight into the done column (used by confirmed journal
/// alignment actions). Shares the award token with [`move_milestone`], so
/// the two paths cannot double-award the same milestone.
pub fn complete_milestone(
    doc: &mut Document,
    task_id: &str,
    milestone_id: &str,
    now: DateTime<Utc>,
) -> Result<(), StoreError> {
    let task = doc
        .tasks
        .get_mut(task_id)
        .ok_or_else(|| StoreError::NotFound(task_id.to_string()))?;
    let category = task.category;
    let quadrant = task.quadrant;
    let milestone = task
        .find_milestone_mut(milestone_id)
        .ok_or_else(|| StoreError::MilestoneNotFound(milestone_id.to_string()))?;

    if milestone.status == MilestoneStatus::Done {
        return Ok(());
    }
    milestone.status = MilestoneStatus::Done;
    let points = milestone.points;
    let event = CompletionEvent {
        token: format!("milestone:{task_id}:{milestone_id}"),
        task_id: task_id.to_string(),
        category,
        quadrant,
        points: points.max(engine::MIN_MILESTONE_POINTS),
        timestamp: now,
        kind: EventKind::Milestone,
    };
    award_event(doc, event);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, hour, 0, 0).unwrap()
    }

    fn basic_task(doc: &mut Document) -> String {
        create(
            doc,
            NewTask::new("Pay rent", Category::Admin, Quadrant::UrgentImportant),
            at(1, 9),
        )
        .unwrap()
    }

    #[test]
    fn create_rejects_empty_title() {
        let mut doc = Document::default();
        let err = create(
            &mut doc,
            NewTask::new("  ", Category::Admin, Quadrant::UrgentImportant),
            at(1, 9),
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(doc.tasks.is_empty());
    }

    #[test]
    fn create_rejects_priority_out_of_range() {
        let mut doc = Document::default();
        let mut fields = NewTask::new("x", Category::Admin, Quadrant::UrgentImportant);
        fields.priority = 6;
        assert!(matches!(
            create(&mut doc, fields, at(1, 9)),
            Err(StoreError::Validation(_))
        ));
        assert!(doc.tasks.is_empty());
    }

    #[test]
    fn toggle_awards_points_once_per_day() {
        let mut doc = Document::default();
        let id = basic_task(&mut doc);

        let outcome = toggle_complete(&mut doc, &id, at(1, 10)).unwrap();
        assert!(outcome.done);
        assert!(outcome.completion.awarded);
        assert_eq!(doc.gamification.points, 20);

        // Undo keeps the points, clears completed_at
        let outcome = toggle_complete(&mut doc, &id, at(1, 11)).unwrap();
        assert!(!outcome.done);
        assert_eq!(doc.gamification.points, 20);
        assert!(doc.task(&id).unwrap().completed_at.is_none());

        // Re-complete on the same day: same token, no second award
        let outcome = toggle_complete(&mut doc, &id, at(1, 12)).unwrap();
        assert!(outcome.done);
        assert!(!outcome.completion.awarded);
        assert_eq!(doc.gamification.points, 20);
        assert_eq!(doc.events.len(), 1);
    }

    #[test]
    fn toggle_unknown_id_is_not_found() {
        let mut doc = Document::default();
        assert!(matches!(
            toggle_complete(&mut doc, "missing", at(1, 9)),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn recurring_completion_spawns_exactly_one_successor() {
        let mut doc = Document::default();
        let mut fields = NewTask::new("Water plants", Category::DailyStructure, Quadrant::NotUrgentImportant);
        fields.recurrence = Recurrence::Daily;
        fields.due_date = NaiveDate::from_ymd_opt(2025, 6, 1);
        let id = create(&mut doc, fields, at(1, 8)).unwrap();

        let outcome = toggle_complete(&mut doc, &id, at(1, 9)).unwrap();
        let spawned = outcome.completion.spawned.clone().unwrap();
        assert_eq!(doc.tasks.len(), 2);
        let successor = doc.task(&spawned).unwrap();
        assert_eq!(successor.due_date, NaiveDate::from_ymd_opt(2025, 6, 2));
        assert!(!successor.done);

        // Toggle off and on again the same day: duplicate token, no respawn
        toggle_complete(&mut doc, &id, at(1, 10)).unwrap();
        let outcome = toggle_complete(&mut doc, &id, at(1, 11)).unwrap();
        assert!(outcome.completion.spawned.is_none());
        assert_eq!(doc.tasks.len(), 2);
    }

    #[test]
    fn progress_clamps_and_awards_thresholds_once() {
        let mut doc = Document::default();
        let mut fields = NewTask::new("Read book", Category::Health, Quadrant::NotUrgentImportant);
        fields.progress = Some(ProgressRule {
            target: 100.0,
            unit: "pages".into(),
            current: 0.0,
            auto_done_when_target_reached: false,
            criteria: String::new(),
        });
        let id = create(&mut doc, fields, at(1, 8)).unwrap();

        let outcome = update_progress(&mut doc, &id, 60.0, at(1, 9)).unwrap();
        assert_eq!(outcome.value, 60.0);
        assert_eq!(outcome.thresholds_awarded, vec![25, 50]);
        assert_eq!(doc.gamification.points, 10);

        // Dropping back down and crossing again awards nothing new
        update_progress(&mut doc, &id, 10.0, at(1, 10)).unwrap();
        let outcome = update_progress(&mut doc, &id, 80.0, at(1, 11)).unwrap();
        assert_eq!(outcome.thresholds_awarded, vec![75]);
        assert_eq!(doc.gamification.points, 15);

        // Values outside the range clamp
        let outcome = update_progress(&mut doc, &id, 500.0, at(1, 12)).unwrap();
        assert_eq!(outcome.value, 100.0);
        let outcome = update_progress(&mut doc, &id, -3.0, at(1, 13)).unwrap();
        assert_eq!(outcome.value, 0.0);
    }

    #[test]
    fn progress_auto_completes_exactly_once() {
        let mut doc = Document::default();
        let mut fields = NewTask::new("Apply to jobs", Category::JobSearch, Quadrant::UrgentImportant);
        fields.progress = Some(ProgressRule {
            target: 5.0,
            unit: "applications".into(),
            current: 0.0,
            auto_done_when_target_reached: true,
            criteria: String::new(),
        });
        let id = create(&mut doc, fields, at(1, 8)).unwrap();

        let outcome = update_progress(&mut doc, &id, 5.0, at(1, 9)).unwrap();
        assert!(outcome.completed);
        assert!(doc.task(&id).unwrap().done);
        // 3 thresholds * 5 + quadrant I completion 20
        assert_eq!(doc.gamification.points, 35);

        // A repeated progress update cannot re-complete or re-award
        let outcome = update_progress(&mut doc, &id, 5.0, at(1, 10)).unwrap();
        assert!(!outcome.completed);
        assert_eq!(doc.gamification.points, 35);
    }

    #[test]
    fn progress_on_task_without_rule_is_validation_error() {
        let mut doc = Document::default();
        let id = basic_task(&mut doc);
        assert!(matches!(
            update_progress(&mut doc, &id, 1.0, at(1, 9)),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn delete_is_two_phase() {
        let mut doc = Document::default();
        let id = basic_task(&mut doc);

        let pending = delete_request(&doc, &id).unwrap();
        assert_eq!(pending.title, "Pay rent");
        assert_eq!(doc.tasks.len(), 1);

        delete_confirm(&mut doc, &id).unwrap();
        assert!(doc.tasks.is_empty());
        assert!(matches!(
            delete_confirm(&mut doc, &id),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn duplicate_resets_identity_and_done_state() {
        let mut doc = Document::default();
        let id = basic_task(&mut doc);
        toggle_complete(&mut doc, &id, at(1, 9)).unwrap();

        let copy_id = duplicate(&mut doc, &id, at(2, 9)).unwrap();
        assert_ne!(copy_id, id);
        let copy = doc.task(&copy_id).unwrap();
        assert_eq!(copy.title, "Pay rent");
        assert!(!copy.done);
        assert!(copy.completed_at.is_none());
        assert_eq!(copy.created_at, at(2, 9));
    }

    #[test]
    fn duplicate_resets_progress_and_rekeys_milestones() {
        let mut doc = Document::default();
        let mut fields = NewTask::new("Apply to jobs", Category::JobSearch, Quadrant::UrgentImportant);
        fields.progress = Some(ProgressRule {
            target: 5.0,
            unit: "applications".into(),
            current: 0.0,
            auto_done_when_target_reached: true,
            criteria: String::new(),
        });
        let id = create(&mut doc, fields, at(1, 8)).unwrap();
        let ms = add_milestone(&mut doc, &id, "polish cv", EffortTier::Small, 2).unwrap();
        update_progress(&mut doc, &id, 5.0, at(1, 9)).unwrap();
        complete_milestone(&mut doc, &id, &ms, at(1, 10)).unwrap();
        assert!(doc.task(&id).unwrap().done);
        let points_before = doc.gamification.points;

        let copy_id = duplicate(&mut doc, &id, at(2, 9)).unwrap();
        let copy = doc.task(&copy_id).unwrap();
        assert!(!copy.done);
        assert_eq!(copy.progress.as_ref().unwrap().current, 0.0);
        let copy_ms = &copy.milestones[0];
        assert_ne!(copy_ms.id, ms);
        assert_eq!(copy_ms.status, MilestoneStatus::Backlog);
        assert_eq!(copy_ms.title, "polish cv");
        assert_eq!(copy_ms.points, 2);

        // A carried-over current at target would have auto-completed the
        // copy on creation and awarded again
        assert_eq!(doc.gamification.points, points_before);
    }

    #[test]
    fn milestone_done_awards_floored_points_once() {
        let mut doc = Document::default();
        let id = basic_task(&mut doc);
        let ms = add_milestone(&mut doc, &id, "fill out form", EffortTier::Small, 2).unwrap();

        // backlog -> ready -> in_progress -> review -> done
        for _ in 0..4 {
            move_milestone(&mut doc, &id, &ms, MoveDirection::Right, at(1, 9)).unwrap();
        }
        assert_eq!(
            doc.task(&id).unwrap().find_milestone(&ms).unwrap().status,
            MilestoneStatus::Done
        );
        // 2 points floored to the 5-point minimum
        assert_eq!(doc.gamification.points, 5);

        // Bouncing out of done and back does not re-award
        move_milestone(&mut doc, &id, &ms, MoveDirection::Left, at(1, 10)).unwrap();
        move_milestone(&mut doc, &id, &ms, MoveDirection::Right, at(1, 11)).unwrap();
        assert_eq!(doc.gamification.points, 5);
    }

    #[test]
    fn milestone_edit_is_partial_and_validated() {
        let mut doc = Document::default();
        let id = basic_task(&mut doc);
        let ms = add_milestone(&mut doc, &id, "draft", EffortTier::Small, 8).unwrap();

        let patch = MilestonePatch {
            title: Some("first draft".into()),
            points: Some(12),
            ..MilestonePatch::default()
        };
        update_milestone(&mut doc, &id, &ms, patch).unwrap();
        let milestone = doc.task(&id).unwrap().find_milestone(&ms).unwrap();
        assert_eq!(milestone.title, "first draft");
        assert_eq!(milestone.points, 12);
        assert_eq!(milestone.effort, EffortTier::Small);

        let patch = MilestonePatch {
            title: Some("  ".into()),
            ..MilestonePatch::default()
        };
        assert!(matches!(
            update_milestone(&mut doc, &id, &ms, patch),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn move_at_board_edge_is_a_no_op() {
        let mut doc = Document::default();
        let id = basic_task(&mut doc);
        let ms = add_milestone(&mut doc, &id, "step", EffortTier::Medium, 10).unwrap();
        let status = move_milestone(&mut doc, &id, &ms, MoveDirection::Left, at(1, 9)).unwrap();
        assert_eq!(status, MilestoneStatus::Backlog);
    }

    #[test]
    fn edit_lowering_target_can_auto_complete() {
        let mut doc = Document::default();
        let mut fields = NewTask::new("Run km", Category::Health, Quadrant::NotUrgentImportant);
        fields.progress = Some(ProgressRule {
            target: 10.0,
            unit: "km".into(),
            current: 0.0,
            auto_done_when_target_reached: true,
            criteria: String::new(),
        });
        let id = create(&mut doc, fields, at(1, 8)).unwrap();
        update_progress(&mut doc, &id, 6.0, at(1, 9)).unwrap();
        assert!(!doc.task(&id).unwrap().done);

        let patch = TaskPatch {
            progress_target: Some(Some(6.0)),
            ..TaskPatch::default()
        };
        update(&mut doc, &id, patch, at(1, 10)).unwrap();
        assert!(doc.task(&id).unwrap().done);
    }

    #[test]
    fn failed_update_leaves_task_unchanged() {
        let mut doc = Document::default();
        let id = basic_task(&mut doc);
        let before = doc.task(&id).unwrap().clone();
        let patch = TaskPatch {
            title: Some(String::new()),
            priority: Some(4),
            ..TaskPatch::default()
        };
        assert!(update(&mut doc, &id, patch, at(1, 9)).is_err());
        assert_eq!(doc.task(&id).unwrap(), &before);
    }
}
