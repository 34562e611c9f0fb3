use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Eisenhower-matrix quadrant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    UrgentImportant,
    NotUrgentImportant,
    UrgentNotImportant,
    NotUrgentNotImportant,
}

impl Quadrant {
    /// Short roman-numeral label as shown in the matrix (`I`..`IV`)
    pub fn short_label(self) -> &'static str {
        match self {
            Quadrant::UrgentImportant => "I",
            Quadrant::NotUrgentImportant => "II",
            Quadrant::UrgentNotImportant => "III",
            Quadrant::NotUrgentNotImportant => "IV",
        }
    }

    /// Parse user-facing spellings (`I`, `q1`, `urgent_important`, ...)
    pub fn parse(s: &str) -> Option<Quadrant> {
        match s.trim().to_ascii_lowercase().as_str() {
            "i" | "q1" | "1" | "urgent_important" => Some(Quadrant::UrgentImportant),
            "ii" | "q2" | "2" | "not_urgent_important" => Some(Quadrant::NotUrgentImportant),
            "iii" | "q3" | "3" | "urgent_not_important" => Some(Quadrant::UrgentNotImportant),
            "iv" | "q4" | "4" | "not_urgent_not_important" => {
                Some(Quadrant::NotUrgentNotImportant)
            }
            _ => None,
        }
    }

    pub const ALL: [Quadrant; 4] = [
        Quadrant::UrgentImportant,
        Quadrant::NotUrgentImportant,
        Quadrant::UrgentNotImportant,
        Quadrant::NotUrgentNotImportant,
    ];
}

/// High-level life domain a task belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    JobSearch,
    Admin,
    FriendsFamily,
    Health,
    DailyStructure,
}

impl Category {
    pub fn parse(s: &str) -> Option<Category> {
        match s.trim().to_ascii_lowercase().as_str() {
            "job_search" | "job" => Some(Category::JobSearch),
            "admin" => Some(Category::Admin),
            "friends_family" | "family" => Some(Category::FriendsFamily),
            "health" => Some(Category::Health),
            "daily_structure" | "daily" => Some(Category::DailyStructure),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Category::JobSearch => "job_search",
            Category::Admin => "admin",
            Category::FriendsFamily => "friends_family",
            Category::Health => "health",
            Category::DailyStructure => "daily_structure",
        }
    }

    pub const ALL: [Category; 5] = [
        Category::JobSearch,
        Category::Admin,
        Category::FriendsFamily,
        Category::Health,
        Category::DailyStructure,
    ];
}

/// How a task regenerates after completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    #[default]
    Once,
    Daily,
    Weekdays,
    Weekly,
    Monthly,
    Yearly,
}

impl Recurrence {
    pub fn parse(s: &str) -> Option<Recurrence> {
        match s.trim().to_ascii_lowercase().as_str() {
            "once" | "none" => Some(Recurrence::Once),
            "daily" => Some(Recurrence::Daily),
            "weekdays" => Some(Recurrence::Weekdays),
            "weekly" => Some(Recurrence::Weekly),
            "monthly" => Some(Recurrence::Monthly),
            "yearly" => Some(Recurrence::Yearly),
            _ => None,
        }
    }
}

/// Email reminder preference relative to the due date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderOffset {
    #[default]
    None,
    HourBefore,
    DayBefore,
}

/// Numeric target tracking attached to a task, with optional auto-completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRule {
    pub target: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub current: f64,
    #[serde(default)]
    pub auto_done_when_target_reached: bool,
    /// Free-text completion criteria
    #[serde(default)]
    pub criteria: String,
}

impl ProgressRule {
    /// Fraction of the target reached, in `[0, 1]`
    pub fn ratio(&self) -> f64 {
        if self.target <= 0.0 {
            return 0.0;
        }
        (self.current / self.target).clamp(0.0, 1.0)
    }
}

/// Kanban-style status of a milestone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    #[default]
    Backlog,
    Ready,
    InProgress,
    Review,
    Done,
}

impl MilestoneStatus {
    /// Board order, left to right
    pub const ORDER: [MilestoneStatus; 5] = [
        MilestoneStatus::Backlog,
        MilestoneStatus::Ready,
        MilestoneStatus::InProgress,
        MilestoneStatus::Review,
        MilestoneStatus::Done,
    ];
}

/// Rough effort estimate for a milestone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffortTier {
    Small,
    #[default]
    Medium,
    Large,
}

/// An intermediate step toward a task, worth its own points when done
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub effort: EffortTier,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub status: MilestoneStatus,
}

impl Milestone {
    pub fn new(title: String, effort: EffortTier, points: i64) -> Self {
        Milestone {
            id: Uuid::new_v4().to_string(),
            title,
            description: String::new(),
            effort,
            points,
            status: MilestoneStatus::Backlog,
        }
    }
}

/// A tracked task. The id is assigned at creation and never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    pub quadrant: Quadrant,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub recurrence: Recurrence,
    #[serde(default)]
    pub progress: Option<ProgressRule>,
    /// Insertion order is preserved
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub done: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reminder: ReminderOffset,
}

fn default_priority() -> u8 {
    3
}

impl Task {
    /// Create a new open task with a fresh id
    pub fn new(title: String, category: Category, quadrant: Quadrant, now: DateTime<Utc>) -> Self {
        Task {
            id: Uuid::new_v4().to_string(),
            title,
            description: String::new(),
            category,
            quadrant,
            priority: default_priority(),
            due_date: None,
            recurrence: Recurrence::Once,
            progress: None,
            milestones: Vec::new(),
            done: false,
            created_at: now,
            completed_at: None,
            reminder: ReminderOffset::None,
        }
    }

    pub fn find_milestone(&self, milestone_id: &str) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.id == milestone_id)
    }

    pub fn find_milestone_mut(&mut self, milestone_id: &str) -> Option<&mut Milestone> {
        self.milestones.iter_mut().find(|m| m.id == milestone_id)
    }
}
