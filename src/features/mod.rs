pub mod categories;
pub mod delays;
pub mod notifications;
pub mod sla;
pub mod tickets;
pub mod time_entries;
pub mod users;
