mod delay;
mod justification;

pub use delay::{Delay, DelayFilter, DelayStatus};
pub use justification::{DelayJustification, JustificationStatus};
