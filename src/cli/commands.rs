use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mo", about = concat!("[>] momentum v", env!("CARGO_PKG_VERSION"), " - points for getting things done"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// State file to operate on
    #[arg(short, long, global = true, default_value = "tracker.json")]
    pub file: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a task
    Add(AddArgs),
    /// List open tasks by quadrant
    List(ListArgs),
    /// Show task details
    Show(ShowArgs),
    /// Toggle a task done/open
    Done(DoneArgs),
    /// Set a task's progress value
    Progress(ProgressArgs),
    /// Edit task fields
    Edit(EditArgs),
    /// Permanently delete a task
    Delete(DeleteArgs),
    /// Duplicate a task into a fresh open copy
    Dup(DupArgs),
    /// Milestone board management
    Milestone(MilestoneCmd),
    /// Show KPIs, streak, level, and badges
    Stats(StatsArgs),
    /// Show tasks due soon
    Due(DueArgs),
    /// Daily journal
    Journal(JournalCmd),
    /// Match a journal entry against open tasks
    Align(AlignArgs),
}

// ---------------------------------------------------------------------------
// Task command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,
    /// Category (job_search, admin, friends_family, health, daily_structure)
    #[arg(short, long)]
    pub category: String,
    /// Eisenhower quadrant (I..IV, q1..q4, or full name)
    #[arg(short, long)]
    pub quadrant: String,
    /// Priority 1 (highest) to 5
    #[arg(short, long, default_value = "3")]
    pub priority: u8,
    /// Longer description
    #[arg(long)]
    pub note: Option<String>,
    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,
    /// Recurrence (once, daily, weekdays, weekly, monthly, yearly)
    #[arg(long)]
    pub repeat: Option<String>,
    /// Reminder offset (none, hour, day)
    #[arg(long)]
    pub remind: Option<String>,
    /// Numeric progress target (enables progress tracking)
    #[arg(long)]
    pub target: Option<f64>,
    /// Unit for the progress target (pages, km, applications, ...)
    #[arg(long)]
    pub unit: Option<String>,
    /// Complete the task automatically when the target is reached
    #[arg(long)]
    pub auto_done: bool,
    /// Free-text completion criteria
    #[arg(long)]
    pub criteria: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Filter by category
    #[arg(short, long)]
    pub category: Option<String>,
    /// Filter by quadrant
    #[arg(short, long)]
    pub quadrant: Option<String>,
    /// Include completed tasks
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Task ID (or unique prefix)
    pub id: String,
}

#[derive(Args)]
pub struct DoneArgs {
    /// Task ID (or unique prefix)
    pub id: String,
}

#[derive(Args)]
pub struct ProgressArgs {
    /// Task ID (or unique prefix)
    pub id: String,
    /// New progress value (clamped to [0, target])
    pub value: f64,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID (or unique prefix)
    pub id: String,
    /// New title
    #[arg(long)]
    pub title: Option<String>,
    /// New description
    #[arg(long)]
    pub note: Option<String>,
    /// New category
    #[arg(short, long)]
    pub category: Option<String>,
    /// New quadrant
    #[arg(short, long)]
    pub quadrant: Option<String>,
    /// New priority 1..5
    #[arg(short, long)]
    pub priority: Option<u8>,
    /// New due date (YYYY-MM-DD), or "none" to clear
    #[arg(long)]
    pub due: Option<String>,
    /// New recurrence
    #[arg(long)]
    pub repeat: Option<String>,
    /// New reminder offset (none, hour, day)
    #[arg(long)]
    pub remind: Option<String>,
    /// New progress target, or "none" to drop progress tracking
    #[arg(long)]
    pub target: Option<String>,
    /// New progress unit
    #[arg(long)]
    pub unit: Option<String>,
    /// Auto-complete at target (true/false)
    #[arg(long)]
    pub auto_done: Option<bool>,
    /// New completion criteria
    #[arg(long)]
    pub criteria: Option<String>,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Task ID (or unique prefix)
    pub id: String,
    /// Actually delete (without this, shows what would be removed)
    #[arg(long)]
    pub confirm: bool,
}

#[derive(Args)]
pub struct DupArgs {
    /// Task ID (or unique prefix)
    pub id: String,
}

// ---------------------------------------------------------------------------
// Milestones
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct MilestoneCmd {
    #[command(subcommand)]
    pub action: MilestoneAction,
}

#[derive(Subcommand)]
pub enum MilestoneAction {
    /// Add a milestone to a task
    Add(MilestoneAddArgs),
    /// Move a milestone one board column left or right
    Mv(MilestoneMvArgs),
    /// List a task's milestone board
    List(MilestoneListArgs),
}

#[derive(Args)]
pub struct MilestoneAddArgs {
    /// Task ID (or unique prefix)
    pub id: String,
    /// Milestone title
    pub title: String,
    /// Effort estimate (small, medium, large)
    #[arg(long, default_value = "medium")]
    pub effort: String,
    /// Points awarded when the milestone reaches done
    #[arg(long, default_value = "10")]
    pub points: i64,
}

#[derive(Args)]
pub struct MilestoneMvArgs {
    /// Task ID (or unique prefix)
    pub id: String,
    /// Milestone ID (or unique prefix)
    pub milestone: String,
    /// Direction: "left" or "right"
    pub direction: String,
}

#[derive(Args)]
pub struct MilestoneListArgs {
    /// Task ID (or unique prefix)
    pub id: String,
}

// ---------------------------------------------------------------------------
// Stats and reminders
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct StatsArgs {
    /// Reference date (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Args)]
pub struct DueArgs {
    /// Window in days
    #[arg(long, default_value = "7")]
    pub days: i64,
}

// ---------------------------------------------------------------------------
// Journal and alignment
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct JournalCmd {
    #[command(subcommand)]
    pub action: JournalAction,
}

#[derive(Subcommand)]
pub enum JournalAction {
    /// Create or update the entry for a day
    Set(JournalSetArgs),
    /// Show the entry for a day
    Show(JournalShowArgs),
}

#[derive(Args)]
pub struct JournalSetArgs {
    /// Entry date (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub date: Option<String>,
    /// Mood (repeatable)
    #[arg(long)]
    pub mood: Vec<String>,
    /// Notes on mood
    #[arg(long)]
    pub mood_notes: Option<String>,
    /// Triggers and reactions
    #[arg(long)]
    pub triggers: Option<String>,
    /// Negative thought to examine
    #[arg(long)]
    pub negative_thought: Option<String>,
    /// Rational response to it
    #[arg(long)]
    pub rational_response: Option<String>,
    /// Self-care done today
    #[arg(long)]
    pub self_care_today: Option<String>,
    /// Self-care planned for tomorrow
    #[arg(long)]
    pub self_care_tomorrow: Option<String>,
    /// Gratitude item (repeatable)
    #[arg(long)]
    pub gratitude: Vec<String>,
    /// Category the day touched (repeatable)
    #[arg(long)]
    pub category: Vec<String>,
}

#[derive(Args)]
pub struct JournalShowArgs {
    /// Entry date (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub date: Option<String>,
}

#[derive(Args)]
pub struct AlignArgs {
    /// Entry date (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub date: Option<String>,
    #[command(subcommand)]
    pub action: Option<AlignAction>,
}

#[derive(Subcommand)]
pub enum AlignAction {
    /// Confirm and apply one suggested candidate
    Apply(AlignApplyArgs),
}

#[derive(Args)]
pub struct AlignApplyArgs {
    /// 1-based index of the candidate to apply
    pub index: usize,
}
