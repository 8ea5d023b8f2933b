use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::{Mutex, RwLock};

use chrono::Utc;
use tracing::{debug, info};

use crate::models::{Entry, EntryKind, NewEntry, NewTransfer, Transfer};
use crate::storage::commit_log::{replay, CommitLog, LogSink};
use crate::storage::{JournalStore, StorageError};
use crate::types::{AccountId, EntryId, TransferId};

struct JournalState {
    entries: HashMap<EntryId, Entry>,
    by_account: HashMap<AccountId, Vec<EntryId>>,
    transfers: HashMap<TransferId, Transfer>,
    next_entry_id: EntryId,
    next_transfer_id: TransferId
}

impl JournalState {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            by_account: HashMap::new(),
            transfers: HashMap::new(),
            next_entry_id: 1,
            next_transfer_id: 1
        }
    }

    fn insert_entry(&mut self, entry: Entry) {
        self.next_entry_id = self.next_entry_id.max(entry.id + 1);
        self.by_account.entry(entry.account_id).or_default().push(entry.id);
        self.entries.insert(entry.id, entry);
    }

    fn insert_transfer(&mut self, transfer: Transfer) {
        self.next_transfer_id = self.next_transfer_id.max(transfer.id + 1);
        self.transfers.insert(transfer.id, transfer);
    }
}

/// Journal held in memory, optionally made durable by a write-ahead commit log.
///
/// All state sits behind a single lock so a transfer and both of its legs are
/// published by one write guard. When a log is attached, a batch is committed
/// to the log before it is applied in memory; a failed log write leaves the
/// in-memory journal untouched.
pub struct MemoryJournal {
    state: RwLock<JournalState>,
    log: Option<Mutex<CommitLog>>
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(JournalState::new()),
            log: None
        }
    }

    /// Attaches an arbitrary sink as the commit log of an empty journal.
    pub fn with_log_writer(sink: Box<dyn LogSink>) -> Self {
        Self {
            state: RwLock::new(JournalState::new()),
            log: Some(Mutex::new(CommitLog::new(sink, 0)))
        }
    }

    /// Opens (or creates) a durable journal backed by the log file at `path`.
    ///
    /// Committed batches are replayed; anything after the last commit marker is
    /// truncated away before new batches are appended.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let recovered = replay(&mut file)?;
        let mut state = JournalState::new();

        for transfer in recovered.transfers {
            state.insert_transfer(transfer);
        }

        for entry in recovered.entries {
            state.insert_entry(entry);
        }

        let length = file.metadata()?.len();

        if length > recovered.committed_bytes {
            info!("Truncating commit log [{}] from [{length}] to [{}] bytes", path.display(), recovered.committed_bytes);
            file.set_len(recovered.committed_bytes)?;
        }

        terminate_last_line(&mut file, recovered.committed_bytes)?;

        info!(
            "Opened journal [{}] with [{}] entries and [{}] transfers",
            path.display(),
            state.entries.len(),
            state.transfers.len()
        );

        Ok(Self {
            state: RwLock::new(state),
            log: Some(Mutex::new(CommitLog::new(Box::new(file), recovered.commits)))
        })
    }

    fn commit(&self, entries: &[&Entry], transfer: Option<&Transfer>) -> Result<(), StorageError> {
        let Some(log) = &self.log else {
            return Ok(());
        };

        let mut log = log.lock().map_err(|_| StorageError::Poisoned)?;
        log.commit(entries, transfer)
    }
}

/// Positions the log at its end, making sure the next record starts on a fresh line.
fn terminate_last_line(file: &mut File, length: u64) -> Result<(), StorageError> {
    if length == 0 {
        file.seek(SeekFrom::Start(0))?;
        return Ok(());
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::Start(length - 1))?;
    file.read_exact(&mut last)?;
    file.seek(SeekFrom::End(0))?;

    if last[0] != b'\n' {
        file.write_all(b"\n")?;
        file.sync_data()?;
    }

    Ok(())
}

fn validate_pair(withdraw: &NewEntry, deposit: &NewEntry, transfer: &NewTransfer) -> Result<(), StorageError> {
    let rejected = |reason: &str| Err(StorageError::InvalidPair(reason.to_string()));

    if transfer.sender_id == transfer.receiver_id {
        return rejected("sender and receiver are the same account");
    }

    if withdraw.kind != EntryKind::Withdraw || deposit.kind != EntryKind::Deposit {
        return rejected("legs must be one withdraw and one deposit");
    }

    if withdraw.account_id != transfer.sender_id || deposit.account_id != transfer.receiver_id {
        return rejected("leg owners do not match the transfer parties");
    }

    if withdraw.amount != deposit.amount || withdraw.description != deposit.description {
        return rejected("legs must carry the same amount and description");
    }

    Ok(())
}

impl JournalStore for MemoryJournal {
    fn append(&self, entry: NewEntry) -> Result<Entry, StorageError> {
        let mut state = self.state.write().map_err(|_| StorageError::Poisoned)?;
        let entry = entry.into_entry(state.next_entry_id, None, Utc::now());

        self.commit(&[&entry], None)?;
        state.insert_entry(entry.clone());

        debug!("Appended entry [{}]:[{:?}] for account [{}]", entry.id, entry.kind, entry.account_id);

        Ok(entry)
    }

    fn append_pair(&self, withdraw: NewEntry, deposit: NewEntry, transfer: NewTransfer) -> Result<(Entry, Entry, Transfer), StorageError> {
        validate_pair(&withdraw, &deposit, &transfer)?;

        let mut state = self.state.write().map_err(|_| StorageError::Poisoned)?;
        let now = Utc::now();
        let transfer = transfer.into_transfer(state.next_transfer_id, now);
        let withdraw = withdraw.into_entry(state.next_entry_id, Some(transfer.id), now);
        let deposit = deposit.into_entry(state.next_entry_id + 1, Some(transfer.id), now);

        self.commit(&[&withdraw, &deposit], Some(&transfer))?;
        state.insert_transfer(transfer.clone());
        state.insert_entry(withdraw.clone());
        state.insert_entry(deposit.clone());

        debug!(
            "Appended transfer [{}] from account [{}] to account [{}]",
            transfer.id, transfer.sender_id, transfer.receiver_id
        );

        Ok((withdraw, deposit, transfer))
    }

    fn find_by_account(&self, account_id: AccountId) -> Result<Vec<Entry>, StorageError> {
        let state = self.state.read().map_err(|_| StorageError::Poisoned)?;

        let entries = state.by_account.get(&account_id)
            .map(|ids| ids.iter().filter_map(|id| state.entries.get(id).cloned()).collect())
            .unwrap_or_default();

        Ok(entries)
    }

    fn find_by_id(&self, account_id: AccountId, entry_id: EntryId) -> Result<Option<Entry>, StorageError> {
        let state = self.state.read().map_err(|_| StorageError::Poisoned)?;

        Ok(state.entries.get(&entry_id)
            .filter(|entry| entry.account_id == account_id)
            .cloned())
    }

    fn find_transfer_by_id(&self, transfer_id: TransferId) -> Result<Option<Transfer>, StorageError> {
        let state = self.state.read().map_err(|_| StorageError::Poisoned)?;

        Ok(state.transfers.get(&transfer_id).cloned())
    }
}
