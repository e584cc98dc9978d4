pub mod dtos;
pub mod models;
pub mod repositories;
pub mod services;
pub mod workers;

pub use services::{DelayReconciler, DelayService};
pub use workers::{DelaySyncScheduler, DelaySyncWorker};
