use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::shared::constants::TICKET_CODE_PREFIX;

lazy_static! {
    /// Regex for generated ticket codes
    /// - Valid: "TKT-2025-0007", "TKT-2024-12345"
    /// - Invalid: "TKT-25-0007", "tkt-2025-0007", "TKT-2025-07"
    static ref TICKET_CODE_REGEX: Regex = Regex::new(r"^TKT-(\d{4})-(\d{4,})$").unwrap();

    /// Calendar date as sent by clients (YYYY-MM-DD)
    static ref DATE_REGEX: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
}

pub fn format_ticket_code(year: i32, sequence: i64) -> String {
    format!("{}-{:04}-{:04}", TICKET_CODE_PREFIX, year, sequence)
}

/// Extract (year, sequence) from a ticket code
pub fn parse_ticket_code(code: &str) -> Option<(i32, i64)> {
    let caps = TICKET_CODE_REGEX.captures(code)?;
    let year = caps.get(1)?.as_str().parse().ok()?;
    let sequence = caps.get(2)?.as_str().parse().ok()?;
    Some((year, sequence))
}

/// Parse a `YYYY-MM-DD` date, rejecting anything else
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    if !DATE_REGEX.is_match(value) {
        return Err(AppError::Validation(format!(
            "{} must use the YYYY-MM-DD format, got '{}'",
            field, value
        )));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("{} is not a valid date: '{}'", field, value)))
}

/// Reject the nil UUID used by clients as a "no value" placeholder
pub fn require_id(field: &str, id: Uuid) -> Result<Uuid> {
    if id.is_nil() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    Ok(id)
}
