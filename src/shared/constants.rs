/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed for caller-facing lists
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// TICKETS
// =============================================================================

/// Prefix of generated ticket codes (`TKT-2025-0007`)
pub const TICKET_CODE_PREFIX: &str = "TKT";

/// Share of the SLA window below which a ticket is considered at risk
pub const SLA_AT_RISK_RATIO: f64 = 0.25;

// =============================================================================
// HISTORY ACTIONS
// =============================================================================

pub const HISTORY_CREATED: &str = "created";
pub const HISTORY_UPDATED: &str = "updated";
pub const HISTORY_ASSIGNED: &str = "assigned";
pub const HISTORY_STATUS_CHANGED: &str = "status_changed";
pub const HISTORY_VALIDATED: &str = "validated";
pub const HISTORY_COMMENTED: &str = "commented";
pub const HISTORY_DELETED: &str = "deleted";
