mod delay_service;
mod reconciler;

pub use delay_service::DelayService;
pub use reconciler::{
    assess, delay_percentage, Assessment, DelayReconciler, ReconcileOutcome, SyncReport,
};
