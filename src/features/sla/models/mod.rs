mod sla;

pub use sla::{DurationUnit, SlaRule, SlaStatus, TicketSla};
