mod comment_dto;
mod ticket_dto;

pub use comment_dto::*;
pub use ticket_dto::*;
