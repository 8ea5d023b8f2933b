use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

use crate::types::AccountId;

/// Per-account reader/writer locks.
///
/// Readers of an account share its lock; anything that appends to an account
/// holds it exclusively across the whole check-then-append sequence.
pub struct AccountLocks {
    locks: DashMap<AccountId, Arc<RwLock<()>>>
}

impl AccountLocks {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new()
        }
    }

    fn lock_for(&self, account_id: AccountId) -> Arc<RwLock<()>> {
        self.locks.entry(account_id).or_default().clone()
    }

    pub async fn read(&self, account_id: AccountId) -> OwnedRwLockReadGuard<()> {
        self.lock_for(account_id).read_owned().await
    }

    pub async fn write(&self, account_id: AccountId) -> OwnedRwLockWriteGuard<()> {
        self.lock_for(account_id).write_owned().await
    }

    /// Locks two distinct accounts exclusively, always in ascending id order so
    /// that opposing transfers cannot deadlock. Guards are returned as `(first, second)`.
    pub async fn write_pair(&self, first: AccountId, second: AccountId) -> (OwnedRwLockWriteGuard<()>, OwnedRwLockWriteGuard<()>) {
        debug_assert_ne!(first, second, "an account cannot be locked twice");

        if first < second {
            let first_guard = self.write(first).await;
            let second_guard = self.write(second).await;
            (first_guard, second_guard)
        } else {
            let second_guard = self.write(second).await;
            let first_guard = self.write(first).await;
            (first_guard, second_guard)
        }
    }
}
