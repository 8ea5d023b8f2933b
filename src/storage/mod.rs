mod commit_log;
mod directory;
mod errors;
mod memory_journal;
#[cfg(test)]
mod tests;

use crate::models::{Entry, NewEntry, NewTransfer, Transfer};
use crate::types::{AccountId, EntryId, TransferId};

pub use commit_log::LogSink;
pub use directory::MemoryDirectory;
pub use errors::StorageError;
pub use memory_journal::MemoryJournal;

/// Append-only store of journal entries and the transfers that pair them.
pub trait JournalStore: Send + Sync + 'static {
    /// Persists a standalone entry, assigning its id and timestamps.
    fn append(&self, entry: NewEntry) -> Result<Entry, StorageError>;

    /// Persists a transfer and both of its legs as one unit: either all three
    /// become visible to readers or none do.
    fn append_pair(&self, withdraw: NewEntry, deposit: NewEntry, transfer: NewTransfer) -> Result<(Entry, Entry, Transfer), StorageError>;

    fn find_by_account(&self, account_id: AccountId) -> Result<Vec<Entry>, StorageError>;

    /// Looks up an entry scoped to its owner. An entry owned by another
    /// account is reported as absent.
    fn find_by_id(&self, account_id: AccountId, entry_id: EntryId) -> Result<Option<Entry>, StorageError>;

    fn find_transfer_by_id(&self, transfer_id: TransferId) -> Result<Option<Transfer>, StorageError>;
}

/// Existence check for accounts, owned by whatever manages account identity.
pub trait AccountDirectory: Send + Sync + 'static {
    fn exists(&self, account_id: AccountId) -> bool;
}
