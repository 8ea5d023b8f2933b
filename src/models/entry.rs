use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::EntryKind;
use crate::types::{AccountId, Amount, EntryId, TransferId};

/// One immutable record of the journal.
///
/// Entries are only ever produced by a journal store; once returned they are
/// never updated or removed. `updated_at` always equals `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Store-assigned identifier, unique across all accounts.
    pub id: EntryId,
    /// The account that owns this movement.
    pub account_id: AccountId,
    pub kind: EntryKind,
    pub amount: Amount,
    pub description: String,
    /// Present iff the entry is one leg of a transfer.
    pub transfer_id: Option<TransferId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>
}

impl Entry {
    /// The entry's contribution to its account balance.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            EntryKind::Deposit => self.amount.value(),
            EntryKind::Withdraw => -self.amount.value()
        }
    }

    pub fn is_transfer(&self) -> bool {
        self.transfer_id.is_some()
    }
}

/// An entry that has not been appended yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub account_id: AccountId,
    pub kind: EntryKind,
    pub amount: Amount,
    pub description: String
}

impl NewEntry {
    pub fn deposit(account_id: AccountId, amount: Amount, description: impl Into<String>) -> Self {
        Self {
            account_id,
            kind: EntryKind::Deposit,
            amount,
            description: description.into()
        }
    }

    pub fn withdraw(account_id: AccountId, amount: Amount, description: impl Into<String>) -> Self {
        Self {
            account_id,
            kind: EntryKind::Withdraw,
            amount,
            description: description.into()
        }
    }

    pub(crate) fn into_entry(self, id: EntryId, transfer_id: Option<TransferId>, now: DateTime<Utc>) -> Entry {
        Entry {
            id,
            account_id: self.account_id,
            kind: self.kind,
            amount: self.amount,
            description: self.description,
            transfer_id,
            created_at: now,
            updated_at: now
        }
    }
}
