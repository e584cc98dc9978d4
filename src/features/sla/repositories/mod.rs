mod sla_repository;

pub use sla_repository::{PgSlaRepository, SlaRuleRepository, TicketSlaRepository};
