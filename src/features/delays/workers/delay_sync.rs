use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::time::interval;

use crate::core::config::DelaySyncConfig;
use crate::core::error::Result;
use crate::features::delays::services::{DelayReconciler, SyncReport};

#[derive(Debug, Default)]
struct SyncState {
    syncing: bool,
    last_sync: Option<DateTime<Utc>>,
}

/// Process-wide throttle for the delay reconciliation sweep.
///
/// At most one sweep runs at a time, and a new one starts only once the
/// cooldown has elapsed since the previous sweep finished.
pub struct DelaySyncScheduler {
    reconciler: Arc<DelayReconciler>,
    state: Mutex<SyncState>,
    cooldown: chrono::Duration,
    page_size: i64,
}

impl DelaySyncScheduler {
    pub fn new(reconciler: Arc<DelayReconciler>, config: &DelaySyncConfig) -> Self {
        Self {
            reconciler,
            state: Mutex::new(SyncState::default()),
            cooldown: chrono::Duration::from_std(config.cooldown)
                .unwrap_or_else(|_| chrono::Duration::seconds(120)),
            page_size: config.page_size,
        }
    }

    /// Claim the sweep slot if it is free and the cooldown has elapsed
    pub async fn try_begin_at(&self, now: DateTime<Utc>) -> bool {
        let mut state = self.state.lock().await;
        if state.syncing {
            return false;
        }
        if let Some(last) = state.last_sync {
            if now - last < self.cooldown {
                return false;
            }
        }

        state.syncing = true;
        true
    }

    pub async fn complete_at(&self, now: DateTime<Utc>) {
        let mut state = self.state.lock().await;
        state.syncing = false;
        state.last_sync = Some(now);
    }

    pub async fn is_syncing(&self) -> bool {
        self.state.lock().await.syncing
    }

    pub async fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.last_sync
    }

    /// Start a background sweep unless one is running or cooling down.
    /// Returns whether a sweep was started.
    pub async fn trigger(self: &Arc<Self>) -> bool {
        if !self.try_begin_at(Utc::now()).await {
            return false;
        }

        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = scheduler.sweep().await {
                tracing::error!("Delay reconciliation sweep failed: {:?}", e);
            }
            scheduler.complete_at(Utc::now()).await;
        });

        true
    }

    async fn sweep(&self) -> Result<SyncReport> {
        tracing::debug!("Starting delay reconciliation sweep");

        let report = self.reconciler.sync_all(self.page_size).await?;
        tracing::info!(
            "Delay sweep finished: scanned={}, created={}, updated={}, deleted={}, failed={}",
            report.scanned,
            report.created,
            report.updated,
            report.deleted,
            report.failed
        );

        Ok(report)
    }
}

/// Daemon worker that periodically triggers the sweep
pub struct DelaySyncWorker {
    scheduler: Arc<DelaySyncScheduler>,
    period: Duration,
}

impl DelaySyncWorker {
    pub fn new(scheduler: Arc<DelaySyncScheduler>, config: &DelaySyncConfig) -> Self {
        Self {
            scheduler,
            period: config.interval,
        }
    }

    /// Run the worker in a background loop
    pub async fn run(&self) {
        tracing::info!(
            "Starting delay sync worker (every {}s)",
            self.period.as_secs()
        );

        let mut interval = interval(self.period.max(Duration::from_secs(1)));

        loop {
            interval.tick().await;

            if !self.scheduler.trigger().await {
                tracing::debug!("Delay sweep skipped: running or cooling down");
            }
        }
    }
}
