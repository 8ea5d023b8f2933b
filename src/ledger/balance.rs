use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use rust_decimal::Decimal;

use crate::models::{Entry, EntryView, LedgerError};
use crate::storage::{JournalStore, StorageError};
use crate::types::{AccountId, DECIMAL_PLACES};

/// Point-in-time balance of an account, optionally with its statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balance {
    pub balance: Decimal,
    pub entries: Option<Vec<EntryView>>
}

/// Derives balances by folding an account's journal entries.
///
/// With a cache attached, balances are remembered per account and adjusted by
/// writers through `record`. Every method expects the caller to hold the
/// account's lock (shared for reads, exclusive for writes) so the cache never
/// sees a fill racing an append.
pub struct BalanceAggregator<S: JournalStore> {
    store: Arc<S>,
    cache: Option<Cache<AccountId, Decimal>>
}

impl<S: JournalStore> BalanceAggregator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            cache: None
        }
    }

    pub fn with_cache(mut self, capacity: u64, time_to_idle: Option<Duration>) -> Self {
        let mut builder = Cache::builder().max_capacity(capacity);

        if let Some(time_to_idle) = time_to_idle {
            builder = builder.time_to_idle(time_to_idle);
        }

        self.cache = Some(builder.build());
        self
    }

    pub async fn balance(&self, account_id: AccountId) -> Result<Decimal, LedgerError> {
        if let Some(cache) = &self.cache {
            if let Some(balance) = cache.get(&account_id).await {
                return Ok(balance);
            }
        }

        let entries = self.store.find_by_account(account_id)?;
        let balance = fold_balance(account_id, &entries)?;

        if let Some(cache) = &self.cache {
            cache.insert(account_id, balance).await;
        }

        Ok(balance)
    }

    /// Balance plus, when requested, every entry as a view ordered by `(created_at, id)`.
    pub async fn compute_balance(&self, account_id: AccountId, include_entries: bool) -> Result<Balance, LedgerError> {
        if !include_entries {
            return Ok(Balance {
                balance: self.balance(account_id).await?,
                entries: None
            });
        }

        let mut entries = self.store.find_by_account(account_id)?;
        entries.sort_by(|left, right| left.created_at.cmp(&right.created_at).then(left.id.cmp(&right.id)));

        let balance = fold_balance(account_id, &entries)?;
        let views = entries.iter()
            .map(|entry| self.view(entry))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Balance {
            balance,
            entries: Some(views)
        })
    }

    /// Loads the entry's transfer, if it links one, and maps the pair to a view.
    pub fn view(&self, entry: &Entry) -> Result<EntryView, LedgerError> {
        let transfer = match entry.transfer_id {
            Some(transfer_id) => {
                let transfer = self.store.find_transfer_by_id(transfer_id)?.ok_or_else(|| {
                    StorageError::Corrupt(format!("entry [{}] links missing transfer [{transfer_id}]", entry.id))
                })?;
                Some(transfer)
            }
            None => None
        };

        Ok(EntryView::from_entry(entry, transfer.as_ref()))
    }

    /// Applies a committed entry to the cached balance of its account.
    pub async fn record(&self, entry: &Entry) {
        let Some(cache) = &self.cache else {
            return;
        };

        if let Some(current) = cache.get(&entry.account_id).await {
            match current.checked_add(entry.signed_amount()) {
                Some(next) => cache.insert(entry.account_id, next).await,
                None => cache.invalidate(&entry.account_id).await
            }
        }
    }
}

fn fold_balance(account_id: AccountId, entries: &[Entry]) -> Result<Decimal, LedgerError> {
    let mut balance = entries.iter()
        .try_fold(Decimal::ZERO, |total, entry| total.checked_add(entry.signed_amount()))
        .ok_or(LedgerError::Overflow { account_id })?;

    balance.rescale(DECIMAL_PLACES);

    Ok(balance)
}
