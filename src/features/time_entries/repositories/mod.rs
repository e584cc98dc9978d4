mod project_task_repository;
mod time_entry_repository;

pub use project_task_repository::{PgProjectTaskRepository, ProjectTaskRepository};
pub use time_entry_repository::{PgTimeEntryRepository, TimeEntryRepository};
