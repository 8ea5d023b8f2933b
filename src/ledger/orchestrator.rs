use std::sync::Arc;

use tracing::debug;

use crate::ledger::{AccountLocks, BalanceAggregator};
use crate::models::{Entry, LedgerError, NewEntry, NewTransfer};
use crate::storage::{AccountDirectory, JournalStore};
use crate::types::{AccountId, Amount};

/// The only component that writes linked entry pairs.
pub struct TransferOrchestrator<S: JournalStore, D: AccountDirectory> {
    store: Arc<S>,
    directory: Arc<D>,
    aggregator: Arc<BalanceAggregator<S>>,
    locks: Arc<AccountLocks>
}

impl<S: JournalStore, D: AccountDirectory> TransferOrchestrator<S, D> {
    pub fn new(store: Arc<S>, directory: Arc<D>, aggregator: Arc<BalanceAggregator<S>>, locks: Arc<AccountLocks>) -> Self {
        Self {
            store,
            directory,
            aggregator,
            locks
        }
    }

    /// Moves `amount` from `sender_id` to `receiver_id` and returns the sender's withdraw leg.
    ///
    /// Checks run in a fixed order: self transfer, sender, receiver, funds.
    /// The funds check and the append happen under both accounts' write locks.
    ///
    /// # Errors
    /// - `SelfTransfer` if both ids are equal.
    /// - `SenderNotFound` / `ReceiverNotFound` if either party is unknown.
    /// - `InsufficientFunds` if the sender's balance is below `amount`.
    /// - `StorageFailure` if the pair could not be committed; nothing is visible then.
    pub async fn execute(&self, sender_id: AccountId, receiver_id: AccountId, amount: Amount, description: &str) -> Result<Entry, LedgerError> {
        if sender_id == receiver_id {
            return Err(LedgerError::SelfTransfer { account_id: sender_id });
        }

        if !self.directory.exists(sender_id) {
            return Err(LedgerError::SenderNotFound { account_id: sender_id });
        }

        if !self.directory.exists(receiver_id) {
            return Err(LedgerError::ReceiverNotFound { account_id: receiver_id });
        }

        let (_sender_guard, _receiver_guard) = self.locks.write_pair(sender_id, receiver_id).await;

        let balance = self.aggregator.balance(sender_id).await?;

        if balance < amount.value() {
            return Err(LedgerError::insufficient_funds(sender_id, balance, amount));
        }

        let (withdraw, deposit, transfer) = self.store.append_pair(
            NewEntry::withdraw(sender_id, amount, description),
            NewEntry::deposit(receiver_id, amount, description),
            NewTransfer::new(sender_id, receiver_id)
        )?;

        self.aggregator.record(&withdraw).await;
        self.aggregator.record(&deposit).await;

        debug!("Transfer [{}] moved [{amount}] from account [{sender_id}] to account [{receiver_id}]", transfer.id);

        Ok(withdraw)
    }
}
