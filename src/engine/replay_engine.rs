use std::path::{Path, PathBuf};
use std::sync::Arc;

use csv::{ReaderBuilder, Trim};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{spawn_blocking, JoinHandle};
use tracing::{debug, error, warn};

use crate::config::CHANNEL_CAPACITY;
use crate::engine::{Operation, OperationType};
use crate::ledger::Ledger;
use crate::models::LedgerError;
use crate::storage::{JournalStore, MemoryDirectory};
use crate::types::AccountId;

#[derive(Debug, Error)]
enum RejectedOperation {
    #[error("Operation [{0:?}] on account [{1}] is missing its {2}")]
    MissingField(OperationType, AccountId, &'static str),
    #[error("Account [{0}] is already open")]
    AlreadyOpen(AccountId),
    #[error("{0}")]
    Ledger(#[from] LedgerError)
}

/// Outcome counts of one replay run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: usize,
    pub rejected: usize
}

/// Replays a CSV of operations against a ledger, in file order.
pub struct ReplayEngine<S: JournalStore> {
    ledger: Arc<Ledger<S, MemoryDirectory>>,
    directory: Arc<MemoryDirectory>,
    backpressure: usize
}

impl<S: JournalStore> ReplayEngine<S> {
    /// `directory` must be the directory the ledger was built with; `open` rows register into it.
    pub fn new(ledger: Arc<Ledger<S, MemoryDirectory>>, directory: Arc<MemoryDirectory>) -> Self {
        Self {
            ledger,
            directory,
            backpressure: CHANNEL_CAPACITY
        }
    }

    pub fn with_backpressure(mut self, backpressure: usize) -> Self {
        self.backpressure = backpressure.max(1);
        self
    }

    /// Streams the file through the ledger. Unreadable files and rows are
    /// logged and skipped, as are operations the ledger rejects.
    pub async fn run(&self, path: impl AsRef<Path>) -> anyhow::Result<ReplaySummary> {
        let (sender, receiver) = mpsc::channel::<Operation>(self.backpressure);
        let csv_handle = self.spawn_csv_reader(path.as_ref().to_path_buf(), sender);
        let summary = self.process_operations(receiver).await;

        if let Err(error) = csv_handle.await {
            error!("CSV ingestion failed: {error}");
        }

        Ok(summary)
    }

    fn spawn_csv_reader(&self, path: PathBuf, sender: mpsc::Sender<Operation>) -> JoinHandle<()> {
        spawn_blocking(move || {
            if let Err(error) = forward_operations(&path, &sender) {
                error!("Cannot read operations from [{}]: {error}", path.display());
            }
        })
    }

    async fn process_operations(&self, mut receiver: mpsc::Receiver<Operation>) -> ReplaySummary {
        let mut summary = ReplaySummary::default();

        while let Some(operation) = receiver.recv().await {
            match self.apply(&operation).await {
                Ok(_) => {
                    summary.applied += 1;
                    debug!("Operation [{:?}] for account [{}] applied", operation.operation_type, operation.account);
                }
                Err(RejectedOperation::Ledger(LedgerError::StorageFailure(error))) => {
                    summary.rejected += 1;
                    error!("Operation [{:?}] for account [{}] could not be stored: {error}", operation.operation_type, operation.account);
                }
                Err(error) => {
                    summary.rejected += 1;
                    warn!("{error}");
                }
            }
        }

        summary
    }

    async fn apply(&self, operation: &Operation) -> Result<(), RejectedOperation> {
        let account = operation.account;
        let operation_type = operation.operation_type;
        let description = operation.description.as_deref().unwrap_or_default();
        let amount = || operation.amount.ok_or(RejectedOperation::MissingField(operation_type, account, "amount"));

        match operation_type {
            OperationType::Open => {
                if !self.directory.register(account) {
                    return Err(RejectedOperation::AlreadyOpen(account));
                }
            }
            OperationType::Deposit => {
                self.ledger.deposit(account, amount()?, description).await?;
            }
            OperationType::Withdraw => {
                self.ledger.withdraw(account, amount()?, description).await?;
            }
            OperationType::Transfer => {
                let receiver = operation.counterparty
                    .ok_or(RejectedOperation::MissingField(operation_type, account, "counterparty"))?;
                self.ledger.transfer(account, receiver, amount()?, description).await?;
            }
        }

        Ok(())
    }
}

/// Streams rows into `sender` until the file ends or the receiver hangs up.
/// Malformed rows are logged with their line and skipped.
fn forward_operations(path: &Path, sender: &mpsc::Sender<Operation>) -> Result<(), csv::Error> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_path(path)?;

    for row in reader.deserialize::<Operation>() {
        let operation = match row {
            Ok(operation) => operation,
            Err(error) => {
                let line = error.position().map(|position| position.line()).unwrap_or_default();
                error!("Skipping row at line [{line}]: {error}");
                continue;
            }
        };

        if sender.blocking_send(operation).is_err() {
            debug!("Operation receiver closed, stopping CSV ingestion");
            break;
        }
    }

    Ok(())
}
