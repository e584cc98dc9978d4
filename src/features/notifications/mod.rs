pub mod models;
pub mod repositories;
pub mod services;

pub use services::NotificationService;
