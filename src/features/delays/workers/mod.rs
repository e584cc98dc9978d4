mod delay_sync;

pub use delay_sync::{DelaySyncScheduler, DelaySyncWorker};
