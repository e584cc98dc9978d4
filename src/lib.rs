//! Service layer of the service desk: tickets, assignment, SLA, delays and
//! the time entry ledger.

pub mod core;
pub mod features;
pub mod shared;
