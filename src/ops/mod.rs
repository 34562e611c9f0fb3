pub mod align;
pub mod engine;
pub mod kpi;
pub mod recurrence;
pub mod reminders;
pub mod task_ops;
