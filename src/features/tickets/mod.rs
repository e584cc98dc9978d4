pub mod dtos;
pub mod models;
pub mod repositories;
pub mod services;
pub mod workers;

pub use services::{CommentService, TicketService};
pub use workers::HistoryWriter;
