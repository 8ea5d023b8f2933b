mod balance;
mod locks;
mod orchestrator;

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::{Entry, EntryView, LedgerError, NewEntry};
use crate::storage::{AccountDirectory, JournalStore};
use crate::types::{AccountId, Amount, EntryId};

pub use balance::{Balance, BalanceAggregator};
pub use locks::AccountLocks;
pub use orchestrator::TransferOrchestrator;

/// Caller-facing ledger operations over a journal store and an account directory.
///
/// Every operation that takes an amount validates it first. Appends to an
/// account are serialized by that account's write lock; reads share it.
pub struct Ledger<S: JournalStore, D: AccountDirectory> {
    store: Arc<S>,
    directory: Arc<D>,
    aggregator: Arc<BalanceAggregator<S>>,
    locks: Arc<AccountLocks>,
    orchestrator: TransferOrchestrator<S, D>
}

impl<S: JournalStore, D: AccountDirectory> Ledger<S, D> {
    pub fn new(store: Arc<S>, directory: Arc<D>) -> Self {
        let aggregator = Arc::new(BalanceAggregator::new(store.clone()));
        Self::assemble(store, directory, aggregator)
    }

    /// Keeps a running balance per account instead of refolding the journal on every check.
    pub fn with_balance_cache(self, capacity: u64, time_to_idle: Option<Duration>) -> Self {
        let aggregator = BalanceAggregator::new(self.store.clone()).with_cache(capacity, time_to_idle);
        Self::assemble(self.store, self.directory, Arc::new(aggregator))
    }

    fn assemble(store: Arc<S>, directory: Arc<D>, aggregator: Arc<BalanceAggregator<S>>) -> Self {
        let locks = Arc::new(AccountLocks::new());
        let orchestrator = TransferOrchestrator::new(store.clone(), directory.clone(), aggregator.clone(), locks.clone());

        Self {
            store,
            directory,
            aggregator,
            locks,
            orchestrator
        }
    }

    pub async fn deposit(&self, account_id: AccountId, amount: Decimal, description: &str) -> Result<Entry, LedgerError> {
        let amount = Amount::try_from(amount)?;
        require_description(account_id, description)?;
        self.require_account(account_id)?;

        let _guard = self.locks.write(account_id).await;
        let entry = self.store.append(NewEntry::deposit(account_id, amount, description))?;
        self.aggregator.record(&entry).await;

        debug!("Deposited [{amount}] into account [{account_id}] as entry [{}]", entry.id);

        Ok(entry)
    }

    pub async fn withdraw(&self, account_id: AccountId, amount: Decimal, description: &str) -> Result<Entry, LedgerError> {
        let amount = Amount::try_from(amount)?;
        require_description(account_id, description)?;
        self.require_account(account_id)?;

        let _guard = self.locks.write(account_id).await;
        let balance = self.aggregator.balance(account_id).await?;

        if balance < amount.value() {
            return Err(LedgerError::insufficient_funds(account_id, balance, amount));
        }

        let entry = self.store.append(NewEntry::withdraw(account_id, amount, description))?;
        self.aggregator.record(&entry).await;

        debug!("Withdrew [{amount}] from account [{account_id}] as entry [{}]", entry.id);

        Ok(entry)
    }

    pub async fn transfer(&self, sender_id: AccountId, receiver_id: AccountId, amount: Decimal, description: &str) -> Result<Entry, LedgerError> {
        let amount = Amount::try_from(amount)?;
        require_description(sender_id, description)?;

        self.orchestrator.execute(sender_id, receiver_id, amount, description).await
    }

    pub async fn get_balance(&self, account_id: AccountId, include_entries: bool) -> Result<Balance, LedgerError> {
        self.require_account(account_id)?;

        let _guard = self.locks.read(account_id).await;
        self.aggregator.compute_balance(account_id, include_entries).await
    }

    /// Looks up one entry of `account_id`. Entries of other accounts are reported as not found.
    pub async fn get_entry(&self, account_id: AccountId, entry_id: EntryId) -> Result<EntryView, LedgerError> {
        self.require_account(account_id)?;

        let _guard = self.locks.read(account_id).await;
        let entry = self.store.find_by_id(account_id, entry_id)?
            .ok_or_else(|| LedgerError::entry_not_found(account_id, entry_id))?;

        self.aggregator.view(&entry)
    }

    fn require_account(&self, account_id: AccountId) -> Result<(), LedgerError> {
        if self.directory.exists(account_id) {
            Ok(())
        } else {
            Err(LedgerError::AccountNotFound { account_id })
        }
    }
}

fn require_description(account_id: AccountId, description: &str) -> Result<(), LedgerError> {
    if description.trim().is_empty() {
        return Err(LedgerError::InvalidDescription { account_id });
    }

    Ok(())
}
