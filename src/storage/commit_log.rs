use std::fs::File;
use std::io::{self, Read, Write};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{Entry, EntryKind, Transfer};
use crate::storage::StorageError;
use crate::types::{AccountId, Amount};

/// Destination of the commit log.
pub trait LogSink: Write + Send {
    /// Makes everything written so far durable.
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogSink for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_data()
    }
}

impl LogSink for Vec<u8> {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RecordType {
    Entry,
    Transfer,
    Commit
}

/// One CSV row of the log. Entries and transfers share the layout; for a
/// transfer `account_id` is the sender and `counterparty_id` the receiver.
#[derive(Debug, Serialize, Deserialize)]
struct LogRecord {
    record: RecordType,
    id: u64,
    account_id: Option<AccountId>,
    counterparty_id: Option<AccountId>,
    kind: Option<EntryKind>,
    amount: Option<String>,
    description: Option<String>,
    transfer_id: Option<u64>,
    created_at: Option<DateTime<Utc>>
}

impl LogRecord {
    fn entry(entry: &Entry) -> Self {
        Self {
            record: RecordType::Entry,
            id: entry.id,
            account_id: Some(entry.account_id),
            counterparty_id: None,
            kind: Some(entry.kind),
            amount: Some(entry.amount.to_string()),
            description: Some(entry.description.clone()),
            transfer_id: entry.transfer_id,
            created_at: Some(entry.created_at)
        }
    }

    fn transfer(transfer: &Transfer) -> Self {
        Self {
            record: RecordType::Transfer,
            id: transfer.id,
            account_id: Some(transfer.sender_id),
            counterparty_id: Some(transfer.receiver_id),
            kind: None,
            amount: None,
            description: None,
            transfer_id: None,
            created_at: Some(transfer.created_at)
        }
    }

    fn commit(sequence: u64) -> Self {
        Self {
            record: RecordType::Commit,
            id: sequence,
            account_id: None,
            counterparty_id: None,
            kind: None,
            amount: None,
            description: None,
            transfer_id: None,
            created_at: None
        }
    }

    fn into_entry(self) -> Result<Entry, StorageError> {
        let id = self.id;
        let corrupt = |field: &str| StorageError::Corrupt(format!("entry [{id}] is missing {field}"));

        let amount = self.amount.ok_or_else(|| corrupt("amount"))?;
        let amount = Amount::from_str(&amount)
            .map_err(|error| StorageError::Corrupt(format!("entry [{id}] has an invalid amount: {error}")))?;
        let created_at = self.created_at.ok_or_else(|| corrupt("created_at"))?;

        Ok(Entry {
            id,
            account_id: self.account_id.ok_or_else(|| corrupt("account_id"))?,
            kind: self.kind.ok_or_else(|| corrupt("kind"))?,
            amount,
            description: self.description.unwrap_or_default(),
            transfer_id: self.transfer_id,
            created_at,
            updated_at: created_at
        })
    }

    fn into_transfer(self) -> Result<Transfer, StorageError> {
        let id = self.id;
        let corrupt = |field: &str| StorageError::Corrupt(format!("transfer [{id}] is missing {field}"));
        let created_at = self.created_at.ok_or_else(|| corrupt("created_at"))?;

        Ok(Transfer {
            id,
            sender_id: self.account_id.ok_or_else(|| corrupt("sender"))?,
            receiver_id: self.counterparty_id.ok_or_else(|| corrupt("receiver"))?,
            created_at,
            updated_at: created_at
        })
    }
}

/// Write-ahead log in front of the in-memory journal.
///
/// Every batch is written as its records followed by a `commit` marker and
/// synced before the caller publishes it. After the first failed write the
/// log refuses all further batches.
pub(crate) struct CommitLog {
    sink: Box<dyn LogSink>,
    commits: u64,
    closed: bool
}

impl CommitLog {
    pub(crate) fn new(sink: Box<dyn LogSink>, commits: u64) -> Self {
        Self {
            sink,
            commits,
            closed: false
        }
    }

    pub(crate) fn commit(&mut self, entries: &[&Entry], transfer: Option<&Transfer>) -> Result<(), StorageError> {
        if self.closed {
            return Err(StorageError::LogClosed);
        }

        let result = self.write_batch(entries, transfer);

        if result.is_err() {
            self.closed = true;
        }

        result
    }

    fn write_batch(&mut self, entries: &[&Entry], transfer: Option<&Transfer>) -> Result<(), StorageError> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());

        if let Some(transfer) = transfer {
            writer.serialize(LogRecord::transfer(transfer))?;
        }

        for entry in entries {
            writer.serialize(LogRecord::entry(entry))?;
        }

        let sequence = self.commits + 1;
        writer.serialize(LogRecord::commit(sequence))?;

        let batch = writer.into_inner()
            .map_err(|error| StorageError::Io(io::Error::other(error.to_string())))?;

        self.sink.write_all(&batch)?;
        self.sink.flush()?;
        self.sink.sync()?;
        self.commits = sequence;

        Ok(())
    }
}

/// Committed contents of a log, as recovered by `replay`.
#[derive(Debug, Default)]
pub(crate) struct Replay {
    pub(crate) entries: Vec<Entry>,
    pub(crate) transfers: Vec<Transfer>,
    pub(crate) commits: u64,
    /// Length of the log prefix that ends with the last commit marker.
    pub(crate) committed_bytes: u64
}

/// Reads a log and keeps only the batches that reached their commit marker.
///
/// Reading stops at the first unreadable row; a torn tail is expected after a
/// crash and is not an error. A committed row that cannot be converted is.
pub(crate) fn replay<R: Read>(reader: R) -> Result<Replay, StorageError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut replay = Replay::default();
    let mut pending = Vec::new();
    let mut row = StringRecord::new();

    loop {
        match reader.read_record(&mut row) {
            Ok(true) => {}
            Ok(false) => break,
            Err(error) => {
                warn!("Commit log has an unreadable tail, discarding it: {error}");
                break;
            }
        }

        let record: LogRecord = match row.deserialize(None) {
            Ok(record) => record,
            Err(error) => {
                warn!("Commit log has an undecodable row, discarding the tail: {error}");
                break;
            }
        };

        if record.record != RecordType::Commit {
            pending.push(record);
            continue;
        }

        for record in pending.drain(..) {
            match record.record {
                RecordType::Entry => replay.entries.push(record.into_entry()?),
                RecordType::Transfer => replay.transfers.push(record.into_transfer()?),
                RecordType::Commit => {}
            }
        }

        replay.commits = record.id;
        replay.committed_bytes = reader.position().byte();
    }

    if !pending.is_empty() {
        warn!("Discarding [{}] uncommitted commit log records", pending.len());
    }

    Ok(replay)
}
