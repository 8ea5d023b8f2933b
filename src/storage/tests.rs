use super::{AccountDirectory, JournalStore, LogSink, MemoryDirectory, MemoryJournal, StorageError};
use crate::models::{EntryKind, NewEntry, NewTransfer};
use crate::types::Amount;

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use tempfile::tempdir;

/// Accepts `budget` bytes, then fails every write.
struct FlakySink {
    budget: usize,
    written: Arc<Mutex<Vec<u8>>>
}

impl Write for FlakySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.budget == 0 {
            return Err(io::Error::other("disk full"));
        }

        let accepted = buf.len().min(self.budget);
        self.budget -= accepted;
        self.written.lock().map_err(|_| io::Error::other("poisoned"))?.extend_from_slice(&buf[..accepted]);

        Ok(accepted)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogSink for FlakySink {}

fn amount(value: &str) -> Result<Amount> {
    Ok(Amount::from_str(value)?)
}

#[test]
fn test_append_assigns_sequential_ids_and_timestamps() -> Result<()> {
    let journal = MemoryJournal::new();

    let first = journal.append(NewEntry::deposit(1, amount("200")?, "salary"))?;
    let second = journal.append(NewEntry::withdraw(1, amount("50")?, "groceries"))?;

    assert_eq!(first.id, 1);
    assert_eq!(second.id, 2);
    assert_eq!(first.transfer_id, None);
    assert_eq!(first.created_at, first.updated_at);
    assert_eq!(journal.find_by_account(1)?.len(), 2);
    assert!(journal.find_by_account(2)?.is_empty());

    Ok(())
}

#[test]
fn test_find_by_id_is_scoped_to_the_owning_account() -> Result<()> {
    let journal = MemoryJournal::new();
    let entry = journal.append(NewEntry::deposit(1, amount("10")?, "gift"))?;

    assert!(journal.find_by_id(1, entry.id)?.is_some());
    assert!(journal.find_by_id(2, entry.id)?.is_none());
    assert!(journal.find_by_id(1, 999)?.is_none());

    Ok(())
}

#[test]
fn test_append_pair_links_both_legs_to_one_transfer() -> Result<()> {
    let journal = MemoryJournal::new();
    let value = amount("75.50")?;

    let (withdraw, deposit, transfer) = journal.append_pair(
        NewEntry::withdraw(1, value, "dinner"),
        NewEntry::deposit(2, value, "dinner"),
        NewTransfer::new(1, 2)
    )?;

    assert_eq!(withdraw.kind, EntryKind::Withdraw);
    assert_eq!(deposit.kind, EntryKind::Deposit);
    assert_eq!(withdraw.transfer_id, Some(transfer.id));
    assert_eq!(deposit.transfer_id, Some(transfer.id));
    assert_ne!(withdraw.id, deposit.id);

    let stored = journal.find_transfer_by_id(transfer.id)?.ok_or_else(|| anyhow!("transfer missing"))?;

    assert_eq!(stored.sender_id, 1);
    assert_eq!(stored.receiver_id, 2);
    assert_eq!(journal.find_by_account(1)?, vec![withdraw]);
    assert_eq!(journal.find_by_account(2)?, vec![deposit]);

    Ok(())
}

#[test]
fn test_append_pair_rejects_mismatched_legs() -> Result<()> {
    let journal = MemoryJournal::new();
    let value = amount("10")?;

    let swapped = journal.append_pair(
        NewEntry::deposit(1, value, "x"),
        NewEntry::withdraw(2, value, "x"),
        NewTransfer::new(1, 2)
    );
    let unequal = journal.append_pair(
        NewEntry::withdraw(1, value, "x"),
        NewEntry::deposit(2, amount("11")?, "x"),
        NewTransfer::new(1, 2)
    );
    let same_account = journal.append_pair(
        NewEntry::withdraw(1, value, "x"),
        NewEntry::deposit(1, value, "x"),
        NewTransfer::new(1, 1)
    );

    assert!(matches!(swapped, Err(StorageError::InvalidPair(_))));
    assert!(matches!(unequal, Err(StorageError::InvalidPair(_))));
    assert!(matches!(same_account, Err(StorageError::InvalidPair(_))));
    assert!(journal.find_by_account(1)?.is_empty());
    assert!(journal.find_by_account(2)?.is_empty());
    assert!(journal.find_transfer_by_id(1)?.is_none());

    Ok(())
}

#[test]
fn test_failed_log_write_leaves_no_partial_transfer_visible() -> Result<()> {
    let written = Arc::new(Mutex::new(Vec::new()));
    let journal = MemoryJournal::with_log_writer(Box::new(FlakySink { budget: 40, written: written.clone() }));
    let value = amount("10")?;

    let result = journal.append_pair(
        NewEntry::withdraw(1, value, "rent"),
        NewEntry::deposit(2, value, "rent"),
        NewTransfer::new(1, 2)
    );

    assert!(matches!(result, Err(StorageError::Io(_))));
    assert!(journal.find_by_account(1)?.is_empty());
    assert!(journal.find_by_account(2)?.is_empty());
    assert!(journal.find_transfer_by_id(1)?.is_none());

    let later = journal.append(NewEntry::deposit(1, value, "retry"));

    assert!(matches!(later, Err(StorageError::LogClosed)));
    assert!(journal.find_by_account(1)?.is_empty());

    let partial = written.lock().map_err(|_| anyhow!("poisoned"))?;
    assert_eq!(partial.len(), 40);

    Ok(())
}

#[test]
fn test_open_replays_committed_batches_and_continues_ids() -> Result<()> {
    let directory = tempdir()?;
    let path = directory.path().join("journal.csv");
    let value = amount("25")?;

    {
        let journal = MemoryJournal::open(&path)?;
        journal.append(NewEntry::deposit(1, amount("100")?, "opening, with a comma"))?;
        journal.append_pair(
            NewEntry::withdraw(1, value, "split bill"),
            NewEntry::deposit(2, value, "split bill"),
            NewTransfer::new(1, 2)
        )?;
    }

    let journal = MemoryJournal::open(&path)?;
    let sender_entries = journal.find_by_account(1)?;
    let receiver_entries = journal.find_by_account(2)?;

    assert_eq!(sender_entries.len(), 2);
    assert_eq!(sender_entries[0].description, "opening, with a comma");
    assert_eq!(sender_entries[0].amount.to_string(), "100.00");
    assert_eq!(receiver_entries.len(), 1);
    assert_eq!(receiver_entries[0].transfer_id, Some(1));
    assert!(journal.find_transfer_by_id(1)?.is_some());

    let next = journal.append(NewEntry::deposit(3, value, "after restart"))?;

    assert_eq!(next.id, 4);

    Ok(())
}

#[test]
fn test_open_discards_and_truncates_an_uncommitted_tail() -> Result<()> {
    let directory = tempdir()?;
    let path = directory.path().join("journal.csv");

    {
        let journal = MemoryJournal::open(&path)?;
        journal.append(NewEntry::deposit(1, amount("100")?, "salary"))?;
    }

    let committed_length = fs::metadata(&path)?.len();

    {
        let mut file = OpenOptions::new().append(true).open(&path)?;
        file.write_all(b"transfer,1,1,2,,,,,2024-01-01T00:00:00Z\nentry,2,1,,withdraw,50.00,torn")?;
    }

    {
        let journal = MemoryJournal::open(&path)?;

        assert_eq!(journal.find_by_account(1)?.len(), 1);
        assert!(journal.find_by_account(2)?.is_empty());
        assert!(journal.find_transfer_by_id(1)?.is_none());
        assert_eq!(fs::metadata(&path)?.len(), committed_length);

        journal.append(NewEntry::withdraw(1, amount("40")?, "cash"))?;
    }

    let journal = MemoryJournal::open(&path)?;
    let entries = journal.find_by_account(1)?;

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].kind, EntryKind::Withdraw);
    assert_eq!(entries[1].amount.to_string(), "40.00");

    Ok(())
}

#[test]
fn test_directory_registers_accounts_once() {
    let directory = MemoryDirectory::new();

    assert!(!directory.exists(1));
    assert!(directory.register(3));
    assert!(directory.register(1));
    assert!(!directory.register(1));
    assert!(directory.exists(1));
    assert_eq!(directory.accounts(), vec![1, 3]);
}
