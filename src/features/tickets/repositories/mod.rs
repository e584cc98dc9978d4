mod assignee_repository;
mod comment_repository;
mod history_repository;
mod ticket_repository;

pub use assignee_repository::{PgTicketAssigneeRepository, TicketAssigneeRepository};
pub use comment_repository::{PgTicketCommentRepository, TicketCommentRepository};
pub use history_repository::{PgTicketHistoryRepository, TicketHistoryRepository};
pub use ticket_repository::{PgTicketRepository, TicketRepository};
