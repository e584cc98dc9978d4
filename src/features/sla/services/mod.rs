mod sla_service;

pub use sla_service::{completion_status, initial_status, SlaService};
