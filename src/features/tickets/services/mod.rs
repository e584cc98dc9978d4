pub mod assignment;
pub mod code_generator;
mod comment_service;
mod ticket_service;

pub use assignment::{normalize_assignees, Assignment};
pub use code_generator::CodeGenerator;
pub use comment_service::CommentService;
pub use ticket_service::TicketService;
