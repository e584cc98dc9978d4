pub mod config;
pub mod database;
pub mod error;
pub mod repositories;
pub mod services;
