mod delay_repository;
mod justification_repository;

pub use delay_repository::{DelayRepository, PgDelayRepository};
pub use justification_repository::{DelayJustificationRepository, PgDelayJustificationRepository};
