mod delay_dto;

pub use delay_dto::*;
