mod category;

pub use category::TicketCategory;
