//! Load/save of the single JSON state document.
//!
//! Loading is lenient: legacy documents carry naive datetimes, bare date
//! strings, list-shaped task collections, and split gratitude fields. All of
//! that is normalized before typed deserialization, and anything unreadable
//! degrades to the default document with a warning — a broken file never
//! takes the session down. Saving goes through a temp file rename so a
//! failed write cannot leave a half-written document behind.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{json, Map, Value};

use crate::model::document::Document;
use crate::ops::engine;

/// Error type for document I/O
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Load the document, falling back to the empty default on any failure.
pub fn load(path: &Path) -> Document {
    if !path.exists() {
        return Document::default();
    }
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "unreadable state document, starting empty");
            return Document::default();
        }
    };
    match parse_document(&text) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "corrupt state document, starting empty");
            Document::default()
        }
    }
}

/// Parse and normalize document text. Exposed for tests; `load` wraps this
/// with the fallback policy.
pub fn parse_document(text: &str) -> Result<Document, DocumentError> {
    let mut value: Value = serde_json::from_str(text)?;
    normalize(&mut value);
    let mut doc: Document = serde_json::from_value(value)?;
    doc.events.truncate_to_cap();
    doc.gamification.level = engine::level_for_points(doc.gamification.points);
    Ok(doc)
}

/// Save the document as pretty JSON via a temp-file rename. In-memory state
/// is untouched whether or not the write succeeds.
pub fn save(path: &Path, doc: &Document) -> Result<(), DocumentError> {
    let text = serde_json::to_string_pretty(doc)?;
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = tempfile::NamedTempFile::new_in(dir.unwrap_or(Path::new(".")))
        .map_err(|e| DocumentError::Write {
            path: path.to_path_buf(),
            source: e,
        })?;
    tmp.write_all(text.as_bytes())
        .map_err(|e| DocumentError::Write {
            path: path.to_path_buf(),
            source: e,
        })?;
    tmp.persist(path).map_err(|e| DocumentError::Write {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Legacy normalization
// ---------------------------------------------------------------------------

fn normalize(value: &mut Value) {
    let Some(root) = value.as_object_mut() else {
        *value = json!({});
        return;
    };

    normalize_tasks(root);
    normalize_events(root);
    normalize_journal(root);
}

fn normalize_tasks(root: &mut Map<String, Value>) {
    let tasks = root.entry("tasks").or_insert_with(|| json!({}));

    // Oldest documents stored tasks as a list; key them by id
    if let Some(list) = tasks.as_array().cloned() {
        let mut map = Map::new();
        for task in list {
            if let Some(id) = task.get("id").and_then(Value::as_str) {
                map.insert(id.to_string(), task.clone());
            }
        }
        *tasks = Value::Object(map);
    }

    let Some(tasks) = tasks.as_object_mut() else {
        *tasks = json!({});
        return;
    };

    for (key, task) in tasks.iter_mut() {
        let Some(task) = task.as_object_mut() else {
            continue;
        };
        // The map key is authoritative for the id
        task.insert("id".into(), json!(key));

        let created = normalize_datetime(task.get("created_at"))
            .unwrap_or_else(Utc::now);
        task.insert("created_at".into(), json!(created.to_rfc3339()));

        let completed = normalize_datetime(task.get("completed_at"));
        let done = task.get("done").and_then(Value::as_bool).unwrap_or(false);
        match completed {
            Some(ts) => {
                task.insert("completed_at".into(), json!(ts.to_rfc3339()));
            }
            None if done => {
                // Restore the done => completed_at invariant
                task.insert("completed_at".into(), json!(created.to_rfc3339()));
            }
            None => {
                task.insert("completed_at".into(), Value::Null);
            }
        }

        match normalize_date(task.get("due_date")) {
            Some(date) => task.insert("due_date".into(), json!(date.to_string())),
            None => task.insert("due_date".into(), Value::Null),
        };

        // A rule with a non-positive target can never be satisfied and would
        // defeat the clamp in update_progress; drop it like create/update
        // would have rejected it
        let bad_target = task
            .get("progress")
            .and_then(Value::as_object)
            .is_some_and(|p| p.get("target").and_then(Value::as_f64).unwrap_or(0.0) <= 0.0);
        if bad_target {
            task.insert("progress".into(), Value::Null);
        } else if let Some(progress) = task.get_mut("progress").and_then(Value::as_object_mut) {
            let target = progress.get("target").and_then(Value::as_f64).unwrap_or(0.0);
            let current = progress.get("current").and_then(Value::as_f64).unwrap_or(0.0);
            progress.insert("current".into(), json!(current.clamp(0.0, target)));
        }
    }
}

fn normalize_events(root: &mut Map<String, Value>) {
    let events = root.entry("events").or_insert_with(|| json!([]));
    let Some(list) = events.as_array_mut() else {
        *events = json!([]);
        return;
    };
    list.retain_mut(|event| {
        let Some(event) = event.as_object_mut() else {
            return false;
        };
        if event.get("token").and_then(Value::as_str).is_none() {
            return false;
        }
        match normalize_datetime(event.get("timestamp")) {
            Some(ts) => {
                event.insert("timestamp".into(), json!(ts.to_rfc3339()));
                true
            }
            None => false,
        }
    });
}

fn normalize_journal(root: &mut Map<String, Value>) {
    let entries = root.entry("journal_entries").or_insert_with(|| json!({}));
    let Some(entries) = entries.as_object_mut() else {
        *entries = json!({});
        return;
    };

    let keys: Vec<String> = entries.keys().cloned().collect();
    for key in keys {
        let valid_key = NaiveDate::parse_from_str(&key, "%Y-%m-%d").is_ok();
        if !valid_key {
            entries.remove(&key);
            continue;
        }
        let Some(entry) = entries.get_mut(&key).and_then(Value::as_object_mut) else {
            entries.remove(&key);
            continue;
        };
        // The map key is authoritative for the date
        entry.insert("date".into(), json!(key));

        // Fold legacy gratitude_1..3 fields into the list
        let has_list = entry
            .get("gratitudes")
            .and_then(Value::as_array)
            .is_some_and(|g| !g.is_empty());
        if !has_list {
            let legacy: Vec<Value> = (1..=3)
                .filter_map(|i| {
                    entry
                        .get(&format!("gratitude_{i}"))
                        .and_then(Value::as_str)
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(|s| json!(s))
                })
                .collect();
            entry.insert("gratitudes".into(), Value::Array(legacy));
        }
        for i in 1..=3 {
            entry.remove(&format!("gratitude_{i}"));
        }

        // Drop category values that no longer parse
        if let Some(categories) = entry.get_mut("categories").and_then(Value::as_array_mut) {
            categories.retain(|c| {
                c.as_str()
                    .is_some_and(|s| crate::model::task::Category::parse(s).is_some())
            });
        }
    }
}

/// Parse a legacy timestamp: RFC 3339, naive datetime, or bare date.
/// Naive values are assumed UTC; bare dates become UTC midnight.
fn normalize_datetime(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let s = value?.as_str()?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN).and_utc());
    }
    None
}

/// Parse a legacy date: bare date or any datetime form (date part taken).
fn normalize_date(value: Option<&Value>) -> Option<NaiveDate> {
    let s = value?.as_str()?.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    normalize_datetime(value).map(|dt| dt.date_naive())
}
