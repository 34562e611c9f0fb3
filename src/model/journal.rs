use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::task::Category;

/// One journal entry per calendar day (the map key in the document).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub date: NaiveDate,
    #[serde(default)]
    pub moods: Vec<String>,
    #[serde(default)]
    pub mood_notes: String,
    #[serde(default)]
    pub triggers_and_reactions: String,
    #[serde(default)]
    pub negative_thought: String,
    #[serde(default)]
    pub rational_response: String,
    #[serde(default)]
    pub self_care_today: String,
    #[serde(default)]
    pub self_care_tomorrow: String,
    #[serde(default)]
    pub gratitudes: Vec<String>,
    #[serde(default)]
    pub categories: Vec<Category>,
    /// Filled only after an alignment proposal is confirmed
    #[serde(default)]
    pub linked_task_ids: Vec<String>,
}

impl JournalEntry {
    pub fn new(date: NaiveDate) -> Self {
        JournalEntry {
            date,
            moods: Vec::new(),
            mood_notes: String::new(),
            triggers_and_reactions: String::new(),
            negative_thought: String::new(),
            rational_response: String::new(),
            self_care_today: String::new(),
            self_care_tomorrow: String::new(),
            gratitudes: Vec::new(),
            categories: Vec::new(),
            linked_task_ids: Vec::new(),
        }
    }

    /// Concatenated free text, the input to alignment matching
    pub fn full_text(&self) -> String {
        let mut sections: Vec<&str> = vec![
            &self.mood_notes,
            &self.triggers_and_reactions,
            &self.negative_thought,
            &self.rational_response,
            &self.self_care_today,
            &self.self_care_tomorrow,
        ];
        let gratitude_line = self.gratitudes.join(" ");
        sections.push(&gratitude_line);
        sections
            .iter()
            .filter(|s| !s.trim().is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Link a task id, skipping duplicates
    pub fn link_task(&mut self, task_id: &str) {
        if !self.linked_task_ids.iter().any(|id| id == task_id) {
            self.linked_task_ids.push(task_id.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_text_skips_empty_sections() {
        let mut entry = JournalEntry::new(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        entry.self_care_today = "went for a run".into();
        entry.gratitudes = vec!["sunshine".into(), "coffee".into()];
        assert_eq!(entry.full_text(), "went for a run\nsunshine coffee");
    }

    #[test]
    fn link_task_dedupes() {
        let mut entry = JournalEntry::new(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        entry.link_task("a");
        entry.link_task("a");
        entry.link_task("b");
        assert_eq!(entry.linked_task_ids, vec!["a", "b"]);
    }
}
