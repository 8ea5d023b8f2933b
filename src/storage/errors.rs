use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Journal I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Journal encoding error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Journal lock was poisoned")]
    Poisoned,
    #[error("Journal commit log is closed after an earlier write failure")]
    LogClosed,
    #[error("Journal is corrupt: {0}")]
    Corrupt(String),
    #[error("Transfer pair rejected: {0}")]
    InvalidPair(String)
}
