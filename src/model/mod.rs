pub mod document;
pub mod event;
pub mod gamification;
pub mod journal;
pub mod task;
