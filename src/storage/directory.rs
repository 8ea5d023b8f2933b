use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::storage::AccountDirectory;
use crate::types::AccountId;

/// In-process account directory; records when each account was opened.
pub struct MemoryDirectory {
    accounts: DashMap<AccountId, DateTime<Utc>>
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new()
        }
    }

    /// Registers an account. Returns `false` if it was already registered.
    pub fn register(&self, account_id: AccountId) -> bool {
        match self.accounts.entry(account_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(Utc::now());
                true
            }
        }
    }

    /// All registered accounts in ascending order.
    pub fn accounts(&self) -> Vec<AccountId> {
        let mut accounts: Vec<AccountId> = self.accounts.iter().map(|item| *item.key()).collect();
        accounts.sort_unstable();
        accounts
    }
}

impl AccountDirectory for MemoryDirectory {
    fn exists(&self, account_id: AccountId) -> bool {
        self.accounts.contains_key(&account_id)
    }
}
