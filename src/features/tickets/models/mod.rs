mod assignee;
mod comment;
mod history;
mod ticket;

pub use assignee::TicketAssignee;
pub use comment::TicketComment;
pub use history::{NewTicketHistory, TicketHistory};
pub use ticket::{Ticket, TicketFilter, TicketPriority, TicketStatus};
