use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate, Utc};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::document_io;
use crate::model::document::Document;
use crate::model::task::{
    Category, EffortTier, ProgressRule, Quadrant, Recurrence, ReminderOffset,
};
use crate::ops::align::{self, SuggestionProvider};
use crate::ops::task_ops::{self, MoveDirection, NewTask, TaskPatch};
use crate::ops::{kpi, reminders};

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;
    let path = PathBuf::from(&cli.file);

    match cli.command {
        // Read commands
        Commands::List(args) => cmd_list(&path, args, json),
        Commands::Show(args) => cmd_show(&path, args, json),
        Commands::Stats(args) => cmd_stats(&path, args, json),
        Commands::Due(args) => cmd_due(&path, args, json),

        // Write commands
        Commands::Add(args) => cmd_add(&path, args, json),
        Commands::Done(args) => cmd_done(&path, args, json),
        Commands::Progress(args) => cmd_progress(&path, args, json),
        Commands::Edit(args) => cmd_edit(&path, args, json),
        Commands::Delete(args) => cmd_delete(&path, args, json),
        Commands::Dup(args) => cmd_dup(&path, args, json),
        Commands::Milestone(args) => cmd_milestone(&path, args, json),

        // Journal and alignment
        Commands::Journal(args) => cmd_journal(&path, args, json),
        Commands::Align(args) => cmd_align(&path, args, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{s}' (expected YYYY-MM-DD)"))
}

fn parse_date_or_today(s: Option<&str>) -> Result<NaiveDate, String> {
    match s {
        Some(s) => parse_date(s),
        None => Ok(Utc::now().date_naive()),
    }
}

fn parse_category(s: &str) -> Result<Category, String> {
    Category::parse(s).ok_or_else(|| {
        format!(
            "unknown category '{s}' (expected: {})",
            Category::ALL.map(|c| c.key()).join(", ")
        )
    })
}

fn parse_quadrant(s: &str) -> Result<Quadrant, String> {
    Quadrant::parse(s).ok_or_else(|| format!("unknown quadrant '{s}' (expected: I..IV or q1..q4)"))
}

fn parse_recurrence(s: &str) -> Result<Recurrence, String> {
    Recurrence::parse(s).ok_or_else(|| {
        format!("unknown recurrence '{s}' (expected: once, daily, weekdays, weekly, monthly, yearly)")
    })
}

fn parse_reminder(s: &str) -> Result<ReminderOffset, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "none" => Ok(ReminderOffset::None),
        "hour" | "hour_before" => Ok(ReminderOffset::HourBefore),
        "day" | "day_before" => Ok(ReminderOffset::DayBefore),
        _ => Err(format!("unknown reminder '{s}' (expected: none, hour, day)")),
    }
}

fn parse_effort(s: &str) -> Result<EffortTier, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "small" | "s" => Ok(EffortTier::Small),
        "medium" | "m" => Ok(EffortTier::Medium),
        "large" | "l" => Ok(EffortTier::Large),
        _ => Err(format!("unknown effort '{s}' (expected: small, medium, large)")),
    }
}

/// Resolve a task id or unique id prefix.
fn resolve_task_id(doc: &Document, prefix: &str) -> Result<String, String> {
    if doc.tasks.contains_key(prefix) {
        return Ok(prefix.to_string());
    }
    let matches: Vec<&String> = doc.tasks.keys().filter(|id| id.starts_with(prefix)).collect();
    match matches.as_slice() {
        [id] => Ok((*id).clone()),
        [] => Err(format!("no task matches '{prefix}'")),
        _ => Err(format!("'{prefix}' is ambiguous ({} matches)", matches.len())),
    }
}

/// Resolve a milestone id or unique prefix within a task.
fn resolve_milestone_id(doc: &Document, task_id: &str, prefix: &str) -> Result<String, String> {
    let Some(task) = doc.task(task_id) else {
        return Err(format!("no task matches '{task_id}'"));
    };
    let matches: Vec<&String> = task
        .milestones
        .iter()
        .map(|m| &m.id)
        .filter(|id| id.starts_with(prefix))
        .collect();
    match matches.as_slice() {
        [id] => Ok((*id).clone()),
        [] => Err(format!("no milestone matches '{prefix}'")),
        _ => Err(format!("'{prefix}' is ambiguous ({} matches)", matches.len())),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read command handlers
// ---------------------------------------------------------------------------

fn cmd_list(path: &Path, args: ListArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let doc = document_io::load(path);
    let category = args.category.as_deref().map(parse_category).transpose()?;
    let quadrant = args.quadrant.as_deref().map(parse_quadrant).transpose()?;

    let keep = |task: &&crate::model::task::Task| -> bool {
        (args.all || !task.done)
            && category.is_none_or(|c| task.category == c)
            && quadrant.is_none_or(|q| task.quadrant == q)
    };

    if json {
        let sections: Vec<TaskListJson> = Quadrant::ALL
            .iter()
            .map(|&q| TaskListJson {
                quadrant: q,
                tasks: doc
                    .tasks
                    .values()
                    .filter(|t| t.quadrant == q)
                    .filter(keep)
                    .map(task_to_json)
                    .collect(),
            })
            .collect();
        return print_json(&sections);
    }

    let mut first = true;
    for q in Quadrant::ALL {
        let tasks: Vec<_> = doc
            .tasks
            .values()
            .filter(|t| t.quadrant == q)
            .filter(keep)
            .collect();
        if tasks.is_empty() {
            continue;
        }
        if !first {
            println!();
        }
        first = false;
        println!("{}", format_quadrant_header(q));
        for task in tasks {
            println!("{}", format_task_line(task));
        }
    }
    if first {
        println!("no tasks.");
    }
    Ok(())
}

fn cmd_show(path: &Path, args: ShowArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let doc = document_io::load(path);
    let id = resolve_task_id(&doc, &args.id)?;
    let task = doc.task(&id).ok_or("task disappeared")?;
    if json {
        return print_json(&task_to_json(task));
    }
    for line in format_task_detail(task) {
        println!("{line}");
    }
    Ok(())
}

fn cmd_stats(path: &Path, args: StatsArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let doc = document_io::load(path);
    let today = parse_date_or_today(args.date.as_deref())?;
    let snapshot = kpi::snapshot(&doc, today);
    let weekly = kpi::weekly_counts(&doc, today);

    if json {
        return print_json(&StatsJson {
            kpi: &snapshot,
            points: doc.gamification.points,
            level: doc.gamification.level,
            level_progress: crate::ops::engine::progress_to_next_level(&doc.gamification),
            badges: &doc.gamification.badges,
            weekly: weekly
                .iter()
                .map(|(date, done)| WeeklyCountJson { date: *date, done: *done })
                .collect(),
        });
    }

    for line in format_stats(&snapshot, &doc.gamification) {
        println!("{line}");
    }
    println!();
    for line in format_weekly(&weekly) {
        println!("{line}");
    }
    Ok(())
}

fn cmd_due(path: &Path, args: DueArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let doc = document_io::load(path);
    let now = Utc::now();
    let upcoming = reminders::due_within(&doc, now, Duration::days(args.days));
    if json {
        let tasks: Vec<_> = upcoming.iter().map(|t| task_to_json(t)).collect();
        return print_json(&tasks);
    }
    if upcoming.is_empty() {
        println!("nothing due in the next {} day(s).", args.days);
        return Ok(());
    }
    for task in upcoming {
        println!("{}", format_task_line(task));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write command handlers
// ---------------------------------------------------------------------------

fn cmd_add(path: &Path, args: AddArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = document_io::load(path);
    let now = Utc::now();

    let mut fields = NewTask::new(
        args.title,
        parse_category(&args.category)?,
        parse_quadrant(&args.quadrant)?,
    );
    fields.priority = args.priority;
    fields.description = args.note.unwrap_or_default();
    fields.due_date = args.due.as_deref().map(parse_date).transpose()?;
    if let Some(repeat) = &args.repeat {
        fields.recurrence = parse_recurrence(repeat)?;
    }
    if let Some(remind) = &args.remind {
        fields.reminder = parse_reminder(remind)?;
    }
    if let Some(target) = args.target {
        fields.progress = Some(ProgressRule {
            target,
            unit: args.unit.unwrap_or_default(),
            current: 0.0,
            auto_done_when_target_reached: args.auto_done,
            criteria: args.criteria.unwrap_or_default(),
        });
    }

    let id = task_ops::create(&mut doc, fields, now)?;
    document_io::save(path, &doc)?;

    let task = doc.task(&id).ok_or("task disappeared")?;
    if json {
        return print_json(&task_to_json(task));
    }
    println!("added {}", format_task_line(task));
    Ok(())
}

fn cmd_done(path: &Path, args: DoneArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = document_io::load(path);
    let id = resolve_task_id(&doc, &args.id)?;
    let outcome = task_ops::toggle_complete(&mut doc, &id, Utc::now())?;
    document_io::save(path, &doc)?;

    if json {
        #[derive(serde::Serialize)]
        struct DoneJson<'a> {
            id: &'a str,
            done: bool,
            awarded: bool,
            spawned: Option<&'a str>,
            points: i64,
            streak: u32,
        }
        return print_json(&DoneJson {
            id: &id,
            done: outcome.done,
            awarded: outcome.completion.awarded,
            spawned: outcome.completion.spawned.as_deref(),
            points: doc.gamification.points,
            streak: doc.gamification.streak,
        });
    }

    if !outcome.done {
        println!("reopened {id} (points stay earned)");
        return Ok(());
    }
    if outcome.completion.awarded {
        println!(
            "done! {} pts total, streak {} day(s)",
            doc.gamification.points, doc.gamification.streak
        );
    } else {
        println!("done (already rewarded today)");
    }
    if let Some(spawned) = outcome.completion.spawned {
        if let Some(next) = doc.task(&spawned) {
            println!("next occurrence: {}", format_task_line(next));
        }
    }
    Ok(())
}

fn cmd_progress(
    path: &Path,
    args: ProgressArgs,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = document_io::load(path);
    let id = resolve_task_id(&doc, &args.id)?;
    let outcome = task_ops::update_progress(&mut doc, &id, args.value, Utc::now())?;
    document_io::save(path, &doc)?;

    if json {
        return print_json(&serde_json::json!({
            "id": id,
            "value": outcome.value,
            "thresholds_awarded": outcome.thresholds_awarded,
            "completed": outcome.completed,
            "points": doc.gamification.points,
        }));
    }
    println!("progress set to {}", outcome.value);
    for pct in &outcome.thresholds_awarded {
        println!("crossed {pct}% (+{} pts)", crate::ops::engine::PROGRESS_THRESHOLD_POINTS);
    }
    if outcome.completed {
        println!("target reached, task completed!");
    }
    Ok(())
}

fn cmd_edit(path: &Path, args: EditArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = document_io::load(path);
    let id = resolve_task_id(&doc, &args.id)?;

    let patch = TaskPatch {
        title: args.title,
        description: args.note,
        category: args.category.as_deref().map(parse_category).transpose()?,
        quadrant: args.quadrant.as_deref().map(parse_quadrant).transpose()?,
        priority: args.priority,
        due_date: match args.due.as_deref() {
            None => None,
            Some("none") => Some(None),
            Some(s) => Some(Some(parse_date(s)?)),
        },
        recurrence: args.repeat.as_deref().map(parse_recurrence).transpose()?,
        reminder: args.remind.as_deref().map(parse_reminder).transpose()?,
        progress_target: match args.target.as_deref() {
            None => None,
            Some("none") => Some(None),
            Some(s) => Some(Some(s.parse::<f64>().map_err(|_| {
                format!("invalid target '{s}' (expected a number or 'none')")
            })?)),
        },
        progress_unit: args.unit,
        auto_done_when_target_reached: args.auto_done,
        criteria: args.criteria,
    };

    task_ops::update(&mut doc, &id, patch, Utc::now())?;
    document_io::save(path, &doc)?;

    let task = doc.task(&id).ok_or("task disappeared")?;
    if json {
        return print_json(&task_to_json(task));
    }
    println!("updated {}", format_task_line(task));
    Ok(())
}

fn cmd_delete(path: &Path, args: DeleteArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = document_io::load(path);
    let id = resolve_task_id(&doc, &args.id)?;

    if !args.confirm {
        let pending = task_ops::delete_request(&doc, &id)?;
        if json {
            return print_json(&serde_json::json!({
                "would_delete": task_to_json(pending),
                "confirmed": false,
            }));
        }
        println!("would delete {}", format_task_line(pending));
        println!("re-run with --confirm to delete permanently");
        return Ok(());
    }

    let removed = task_ops::delete_confirm(&mut doc, &id)?;
    document_io::save(path, &doc)?;
    if json {
        return print_json(&serde_json::json!({ "deleted": removed.id }));
    }
    println!("deleted {}", format_task_line(&removed));
    Ok(())
}

fn cmd_dup(path: &Path, args: DupArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = document_io::load(path);
    let id = resolve_task_id(&doc, &args.id)?;
    let copy_id = task_ops::duplicate(&mut doc, &id, Utc::now())?;
    document_io::save(path, &doc)?;

    let copy = doc.task(&copy_id).ok_or("task disappeared")?;
    if json {
        return print_json(&task_to_json(copy));
    }
    println!("duplicated as {}", format_task_line(copy));
    Ok(())
}

fn cmd_milestone(
    path: &Path,
    cmd: MilestoneCmd,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd.action {
        MilestoneAction::Add(args) => {
            let mut doc = document_io::load(path);
            let id = resolve_task_id(&doc, &args.id)?;
            let effort = parse_effort(&args.effort)?;
            let ms_id = task_ops::add_milestone(&mut doc, &id, args.title, effort, args.points)?;
            document_io::save(path, &doc)?;

            let task = doc.task(&id).ok_or("task disappeared")?;
            let milestone = task.find_milestone(&ms_id).ok_or("milestone disappeared")?;
            if json {
                return print_json(milestone);
            }
            println!("added {}", format_milestone_line(milestone));
        }
        MilestoneAction::Mv(args) => {
            let mut doc = document_io::load(path);
            let id = resolve_task_id(&doc, &args.id)?;
            let ms_id = resolve_milestone_id(&doc, &id, &args.milestone)?;
            let direction = match args.direction.to_ascii_lowercase().as_str() {
                "left" | "l" => MoveDirection::Left,
                "right" | "r" => MoveDirection::Right,
                other => return Err(format!("unknown direction '{other}' (left or right)").into()),
            };
            let status = task_ops::move_milestone(&mut doc, &id, &ms_id, direction, Utc::now())?;
            document_io::save(path, &doc)?;
            if json {
                return print_json(&serde_json::json!({ "milestone": ms_id, "status": status }));
            }
            println!("moved to {status:?} ({} pts total)", doc.gamification.points);
        }
        MilestoneAction::List(args) => {
            let doc = document_io::load(path);
            let id = resolve_task_id(&doc, &args.id)?;
            let task = doc.task(&id).ok_or("task disappeared")?;
            if json {
                return print_json(&task.milestones);
            }
            if task.milestones.is_empty() {
                println!("no milestones.");
                return Ok(());
            }
            for milestone in &task.milestones {
                println!("{}", format_milestone_line(milestone));
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Journal and alignment handlers
// ---------------------------------------------------------------------------

fn cmd_journal(path: &Path, cmd: JournalCmd, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    match cmd.action {
        JournalAction::Set(args) => {
            let mut doc = document_io::load(path);
            let date = parse_date_or_today(args.date.as_deref())?;
            let categories = args
                .category
                .iter()
                .map(|s| parse_category(s))
                .collect::<Result<Vec<_>, _>>()?;

            let entry = doc
                .journal_entries
                .entry(date)
                .or_insert_with(|| crate::model::journal::JournalEntry::new(date));
            if !args.mood.is_empty() {
                entry.moods = args.mood;
            }
            if let Some(v) = args.mood_notes {
                entry.mood_notes = v;
            }
            if let Some(v) = args.triggers {
                entry.triggers_and_reactions = v;
            }
            if let Some(v) = args.negative_thought {
                entry.negative_thought = v;
            }
            if let Some(v) = args.rational_response {
                entry.rational_response = v;
            }
            if let Some(v) = args.self_care_today {
                entry.self_care_today = v;
            }
            if let Some(v) = args.self_care_tomorrow {
                entry.self_care_tomorrow = v;
            }
            if !args.gratitude.is_empty() {
                entry.gratitudes = args.gratitude;
            }
            if !categories.is_empty() {
                entry.categories = categories;
            }
            document_io::save(path, &doc)?;

            let entry = doc.journal_entries.get(&date).ok_or("entry disappeared")?;
            if json {
                return print_json(entry);
            }
            for line in format_journal_entry(entry) {
                println!("{line}");
            }
        }
        JournalAction::Show(args) => {
            let doc = document_io::load(path);
            let date = parse_date_or_today(args.date.as_deref())?;
            let Some(entry) = doc.journal_entries.get(&date) else {
                return Err(format!("no journal entry for {date}").into());
            };
            if json {
                return print_json(entry);
            }
            for line in format_journal_entry(entry) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn cmd_align(path: &Path, args: AlignArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = document_io::load(path);
    let date = parse_date_or_today(args.date.as_deref())?;
    let Some(entry) = doc.journal_entries.get(&date).cloned() else {
        return Err(format!("no journal entry for {date}").into());
    };

    // No provider is wired into the CLI yet; suggestions always come from
    // the deterministic matcher. The seam stays so one can be plugged in.
    let provider: Option<&dyn SuggestionProvider> = None;
    let open_tasks: Vec<_> = doc.open_tasks().collect();
    let suggestion = align::align_entry(provider, &entry, &open_tasks);

    match args.action {
        None => {
            if json {
                let candidates: Vec<AlignCandidateJson> = suggestion
                    .candidates()
                    .into_iter()
                    .enumerate()
                    .map(|(i, candidate)| AlignCandidateJson {
                        index: i + 1,
                        candidate,
                    })
                    .collect();
                return print_json(&candidates);
            }
            for line in format_suggestion(&suggestion) {
                println!("{line}");
            }
            Ok(())
        }
        Some(AlignAction::Apply(apply)) => {
            let candidates = suggestion.candidates();
            let candidate = candidates
                .get(apply.index.wrapping_sub(1))
                .copied()
                .cloned()
                .ok_or_else(|| {
                    format!(
                        "no candidate {} (have {})",
                        apply.index,
                        candidates.len()
                    )
                })?;
            drop(candidates);

            let outcome = align::apply_candidate(&mut doc, &candidate, date, Utc::now())?;
            document_io::save(path, &doc)?;

            if json {
                return print_json(&serde_json::json!({
                    "task_id": outcome.task_id,
                    "journal_awarded": outcome.journal_awarded,
                    "milestones_done": outcome.milestones_done,
                    "points": doc.gamification.points,
                }));
            }
            if outcome.journal_awarded {
                println!(
                    "applied: +{} pts ({} total)",
                    candidate.suggested_points.min(align::MAX_JOURNAL_POINTS),
                    doc.gamification.points
                );
            } else {
                println!("applied (already rewarded for this entry)");
            }
            if !outcome.milestones_done.is_empty() {
                println!("{} milestone(s) marked done", outcome.milestones_done.len());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_id_prefix_resolution() {
        let mut doc = Document::default();
        let now = Utc::now();
        let a = task_ops::create(
            &mut doc,
            NewTask::new("one", Category::Admin, Quadrant::UrgentImportant),
            now,
        )
        .unwrap();

        assert_eq!(resolve_task_id(&doc, &a).unwrap(), a);
        assert_eq!(resolve_task_id(&doc, &a[..8]).unwrap(), a);
        assert!(resolve_task_id(&doc, "zzz").is_err());
    }

    #[test]
    fn date_parsing() {
        assert!(parse_date("2025-06-01").is_ok());
        assert!(parse_date("01.06.2025").is_err());
        assert!(parse_date_or_today(None).is_ok());
    }

    #[test]
    fn reminder_and_effort_spellings() {
        assert_eq!(parse_reminder("hour").unwrap(), ReminderOffset::HourBefore);
        assert_eq!(parse_reminder("day_before").unwrap(), ReminderOffset::DayBefore);
        assert!(parse_reminder("week").is_err());
        assert_eq!(parse_effort("s").unwrap(), EffortTier::Small);
        assert!(parse_effort("huge").is_err());
    }
}
