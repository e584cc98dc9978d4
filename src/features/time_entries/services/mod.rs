mod time_entry_service;

pub use time_entry_service::TimeEntryService;
