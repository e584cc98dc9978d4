use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::features::tickets::models::NewTicketHistory;
use crate::features::tickets::repositories::TicketHistoryRepository;

enum HistoryCommand {
    Record(NewTicketHistory),
    Flush(oneshot::Sender<()>),
}

/// Append-only ticket history log.
///
/// Entries go through a bounded queue drained by a single consumer task, so
/// they are persisted in the order they were recorded. Recording never waits:
/// when the queue is full or the consumer is gone the entry is dropped and
/// logged. Persistence failures are logged by the consumer.
#[derive(Clone)]
pub struct HistoryWriter {
    tx: mpsc::Sender<HistoryCommand>,
}

impl HistoryWriter {
    /// Start the consumer task and return a handle to feed it
    pub fn spawn(
        repository: Arc<dyn TicketHistoryRepository>,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(consume(repository, rx));
        (Self { tx }, handle)
    }

    pub fn record(&self, entry: NewTicketHistory) {
        match self.tx.try_send(HistoryCommand::Record(entry)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(HistoryCommand::Record(entry))) => {
                tracing::warn!(
                    "History queue full, dropping '{}' entry for ticket {}",
                    entry.action,
                    entry.ticket_id
                );
            }
            Err(mpsc::error::TrySendError::Closed(HistoryCommand::Record(entry))) => {
                tracing::error!(
                    "History writer stopped, dropping '{}' entry for ticket {}",
                    entry.action,
                    entry.ticket_id
                );
            }
            Err(_) => {}
        }
    }

    /// Wait until every entry recorded before this call has been handled
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(HistoryCommand::Flush(ack_tx)).await.is_err() {
            return;
        }
        let _ = ack_rx.await;
    }
}

async fn consume(
    repository: Arc<dyn TicketHistoryRepository>,
    mut rx: mpsc::Receiver<HistoryCommand>,
) {
    tracing::info!("Starting ticket history writer");

    while let Some(command) = rx.recv().await {
        match command {
            HistoryCommand::Record(entry) => {
                if let Err(e) = repository.create(&entry).await {
                    tracing::error!(
                        "Failed to write '{}' history for ticket {}: {:?}",
                        entry.action,
                        entry.ticket_id,
                        e
                    );
                }
            }
            HistoryCommand::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }

    tracing::info!("Ticket history writer stopped");
}
