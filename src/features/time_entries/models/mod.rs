mod project_task;
mod time_entry;

pub use project_task::ProjectTask;
pub use time_entry::{EntryTarget, TimeEntry, TimeEntryFilter};
