use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::tickets::repositories::TicketRepository;
use crate::shared::validation::format_ticket_code;

/// Allocates `TKT-<year>-<seq>` codes.
///
/// The repository suggests the next sequence; concurrent creations can make
/// that suggestion stale, so each candidate is probed and the sequence bumped
/// on collision, up to `max_attempts` candidates.
pub struct CodeGenerator {
    tickets: Arc<dyn TicketRepository>,
    max_attempts: u32,
}

impl CodeGenerator {
    pub fn new(tickets: Arc<dyn TicketRepository>, max_attempts: u32) -> Self {
        Self {
            tickets,
            max_attempts: max_attempts.max(1),
        }
    }

    pub async fn generate(&self, year: i32) -> Result<String> {
        let start = self.tickets.next_sequence_number(year).await?;

        for attempt in 0..self.max_attempts {
            let code = format_ticket_code(year, start + i64::from(attempt));
            if !self.tickets.code_exists(&code).await? {
                return Ok(code);
            }
            tracing::debug!("Ticket code {} already taken, retrying", code);
        }

        tracing::error!(
            "Ticket code generation failed after {} attempts (year={}, start={})",
            self.max_attempts,
            year,
            start
        );
        Err(AppError::Internal("Ticket code generation failed".into()))
    }
}
