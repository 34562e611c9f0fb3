//! Journal alignment: match a day's journal text against open tasks and
//! propose point awards and follow-up actions.
//!
//! Proposal generation is pure; nothing mutates until the user confirms a
//! single candidate, at which point [`apply_candidate`] runs the mutation
//! through the ordinary task-store/event-log path. An AI provider may supply
//! proposals, but its output is validated on ingress and any failure drops
//! to the deterministic keyword matcher, never into the user's way.

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::document::Document;
use crate::model::event::{CompletionEvent, EventKind, RecordOutcome};
use crate::model::journal::JournalEntry;
use crate::model::task::{Category, EffortTier, MilestoneStatus, Quadrant, Task};
use crate::ops::{engine, task_ops};
use crate::ops::task_ops::{NewTask, ProgressOutcome, StoreError};

/// Cap applied to suggested journal point awards, whatever their source
pub const MAX_JOURNAL_POINTS: i64 = 50;

/// Error from an external suggestion provider. Always handled at the
/// boundary by falling back; never surfaced as a failed user action.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("suggestion provider unavailable")]
    Unavailable,
    #[error("suggestion provider timed out")]
    Timeout,
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

/// One alignment hit: a task the journal text appears to make progress on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentCandidate {
    /// Existing task id, or `None` to log a spontaneous completed activity
    pub task_id: Option<String>,
    pub task_title: String,
    pub suggested_points: i64,
    pub follow_up: String,
    pub rationale: String,
    #[serde(default)]
    pub progress_delta_percent: Option<f64>,
    #[serde(default)]
    pub milestones_to_mark_done: Vec<String>,
}

/// Tagged proposal schema shared by the AI-backed and fallback matchers.
/// Downstream confirmation logic is provider-agnostic over this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Proposal {
    /// Suggest a quadrant for an uncategorized task
    Quadrant {
        task_title: String,
        quadrant: Quadrant,
        rationale: String,
    },
    /// Suggest an initial milestone breakdown for a task
    MilestoneSet {
        task_id: String,
        milestones: Vec<MilestoneDraft>,
    },
    /// Journal text aligned with an open task or goal
    AlignmentMatch(AlignmentCandidate),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneDraft {
    pub title: String,
    #[serde(default)]
    pub effort: EffortTier,
    #[serde(default)]
    pub points: i64,
}

/// The full suggestion for one journal entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignmentSuggestion {
    pub proposals: Vec<Proposal>,
    pub summary: String,
    pub from_ai: bool,
}

impl AlignmentSuggestion {
    fn empty(summary: &str) -> Self {
        AlignmentSuggestion {
            proposals: Vec::new(),
            summary: summary.to_string(),
            from_ai: false,
        }
    }

    /// Alignment-match candidates, in order (the confirmable subset)
    pub fn candidates(&self) -> Vec<&AlignmentCandidate> {
        self.proposals
            .iter()
            .filter_map(|p| match p {
                Proposal::AlignmentMatch(c) => Some(c),
                _ => None,
            })
            .collect()
    }
}

/// External suggestion provider seam. Implementations are responsible for
/// bounding their own latency (returning [`ProviderError::Timeout`] when a
/// deadline passes); the core only ever sees a finished result or an error,
/// so no reward-bearing state can change while a call is in flight.
pub trait SuggestionProvider {
    fn suggest_alignment(
        &self,
        entry: &JournalEntry,
        open_tasks: &[&Task],
    ) -> Result<AlignmentSuggestion, ProviderError>;
}

/// Validate provider output on ingress: clamp point values, drop empty or
/// non-positive candidates. Malformed pieces are discarded rather than
/// trusted.
fn sanitize(mut suggestion: AlignmentSuggestion) -> AlignmentSuggestion {
    suggestion.proposals.retain_mut(|proposal| match proposal {
        Proposal::AlignmentMatch(c) => {
            c.suggested_points = c.suggested_points.clamp(0, MAX_JOURNAL_POINTS);
            c.suggested_points > 0 && !c.task_title.trim().is_empty()
        }
        Proposal::Quadrant { task_title, .. } => !task_title.trim().is_empty(),
        Proposal::MilestoneSet { milestones, .. } => {
            milestones.retain(|m| !m.title.trim().is_empty());
            !milestones.is_empty()
        }
    });
    suggestion
}

/// Generate alignment proposals for a journal entry.
///
/// Uses the provider when one is supplied and enabled; any provider error
/// degrades to the deterministic keyword matcher. Both paths produce the
/// same shape.
pub fn align_entry(
    provider: Option<&dyn SuggestionProvider>,
    entry: &JournalEntry,
    open_tasks: &[&Task],
) -> AlignmentSuggestion {
    let text = entry.full_text();
    if text.trim().is_empty() {
        return AlignmentSuggestion::empty("nothing to match: the entry has no content");
    }

    if let Some(provider) = provider {
        match provider.suggest_alignment(entry, open_tasks) {
            Ok(suggestion) => {
                let mut suggestion = sanitize(suggestion);
                suggestion.from_ai = true;
                return suggestion;
            }
            Err(err) => {
                tracing::warn!(error = %err, "suggestion provider failed, using keyword fallback");
            }
        }
    }

    keyword_fallback(&text, open_tasks)
}

/// Deterministic fallback: case-folded containment between the entry text
/// and open task/milestone titles.
fn keyword_fallback(text: &str, open_tasks: &[&Task]) -> AlignmentSuggestion {
    let lowered = text.to_lowercase();
    let word = Regex::new(r"[\w\-]{5,}").expect("static pattern");
    let keywords: BTreeSet<&str> = word.find_iter(&lowered).map(|m| m.as_str()).collect();

    let mut proposals = Vec::new();
    for task in open_tasks {
        let title_lower = task.title.to_lowercase();
        let mut progress_delta = 0.0f64;
        let mut milestones_to_mark_done = Vec::new();

        if !title_lower.is_empty()
            && (lowered.contains(&title_lower) || keywords.iter().any(|k| title_lower.contains(*k)))
        {
            progress_delta = 10.0;
        }

        for milestone in &task.milestones {
            if milestone.status == MilestoneStatus::Done {
                continue;
            }
            let ms_lower = milestone.title.to_lowercase();
            if ms_lower.is_empty() {
                continue;
            }
            let fragment_hit = ms_lower
                .split_whitespace()
                .any(|fragment| fragment.len() >= 5 && lowered.contains(fragment));
            if lowered.contains(&ms_lower)
                || fragment_hit
                || keywords.iter().any(|k| ms_lower.contains(*k))
            {
                milestones_to_mark_done.push(milestone.id.clone());
                progress_delta = progress_delta.max(20.0);
            }
        }

        if progress_delta == 0.0 && milestones_to_mark_done.is_empty() {
            continue;
        }

        proposals.push(Proposal::AlignmentMatch(AlignmentCandidate {
            task_id: Some(task.id.clone()),
            task_title: task.title.clone(),
            suggested_points: 10,
            follow_up: "progress detected, please confirm".into(),
            rationale: "title or milestone mentioned in today's journal".into(),
            progress_delta_percent: (task.progress.is_some() && progress_delta > 0.0)
                .then_some(progress_delta),
            milestones_to_mark_done,
        }));
    }

    AlignmentSuggestion {
        proposals,
        summary: "keyword heuristic: matches based on titles, review before confirming".into(),
        from_ai: false,
    }
}

/// What a confirmed candidate actually changed
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApplyOutcome {
    pub task_id: String,
    /// The journal award was recorded (false when its token was a duplicate)
    pub journal_awarded: bool,
    pub milestones_done: Vec<String>,
    pub progress: Option<ProgressOutcome>,
}

fn slug(title: &str) -> String {
    title.trim().to_lowercase().replace(' ', "-")
}

/// Run one explicitly confirmed candidate through the mutation path.
///
/// Awards the journal points at most once per `(entry date, target title)`,
/// marks the confirmed milestones done, applies the progress delta, and
/// links the task into the day's journal entry. A candidate without a task
/// id records a spontaneous activity as a new completed task.
pub fn apply_candidate(
    doc: &mut Document,
    candidate: &AlignmentCandidate,
    entry_date: NaiveDate,
    now: DateTime<Utc>,
) -> Result<ApplyOutcome, StoreError> {
    let task_id = match &candidate.task_id {
        Some(id) => {
            if !doc.tasks.contains_key(id) {
                return Err(StoreError::NotFound(id.clone()));
            }
            id.clone()
        }
        None => {
            // Spontaneous activity: create it and complete it on the spot
            let fields = NewTask::new(
                candidate.task_title.clone(),
                Category::DailyStructure,
                Quadrant::NotUrgentNotImportant,
            );
            let id = task_ops::create(doc, fields, now)?;
            task_ops::toggle_complete(doc, &id, now)?;
            id
        }
    };

    let mut outcome = ApplyOutcome {
        task_id: task_id.clone(),
        ..ApplyOutcome::default()
    };

    // Journal award, deduped per entry date and target title
    let points = candidate.suggested_points.clamp(0, MAX_JOURNAL_POINTS);
    if points > 0 {
        if let Some(task) = doc.tasks.get(&task_id) {
            let event = CompletionEvent {
                token: format!("journal:{entry_date}:{}", slug(&candidate.task_title)),
                task_id: task_id.clone(),
                category: task.category,
                quadrant: task.quadrant,
                points,
                timestamp: now,
                kind: EventKind::Journal,
            };
            if doc.events.record(event.clone()) == RecordOutcome::New {
                engine::apply(&mut doc.gamification, &event);
                outcome.journal_awarded = true;
            }
        }
    }

    for milestone_id in &candidate.milestones_to_mark_done {
        match task_ops::complete_milestone(doc, &task_id, milestone_id, now) {
            Ok(()) => outcome.milestones_done.push(milestone_id.clone()),
            Err(StoreError::MilestoneNotFound(_)) => {
                // Stale suggestion (milestone edited away since); skip it
                tracing::warn!(milestone_id, "confirmed milestone no longer exists");
            }
            Err(err) => return Err(err),
        }
    }

    if let Some(delta) = candidate.progress_delta_percent {
        let new_value = doc
            .tasks
            .get(&task_id)
            .and_then(|t| t.progress.as_ref())
            .map(|rule| rule.current + rule.target * delta / 100.0);
        if let Some(new_value) = new_value {
            outcome.progress = Some(task_ops::update_progress(doc, &task_id, new_value, now)?);
        }
    }

    doc.journal_entries
        .entry(entry_date)
        .or_insert_with(|| JournalEntry::new(entry_date))
        .link_task(&task_id);

    Ok(outcome)
}
