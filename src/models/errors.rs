use rust_decimal::Decimal;
use thiserror::Error;

use crate::storage::StorageError;
use crate::types::{AccountId, Amount, AmountError, EntryId};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Account [{account_id}] was not found")]
    AccountNotFound {
        account_id: AccountId
    },
    #[error("Sender account [{account_id}] was not found")]
    SenderNotFound {
        account_id: AccountId
    },
    #[error("Receiver account [{account_id}] was not found")]
    ReceiverNotFound {
        account_id: AccountId
    },
    #[error("Account [{account_id}] cannot transfer to itself")]
    SelfTransfer {
        account_id: AccountId
    },
    #[error("Insufficient funds for account [{account_id}]: balance [{balance}], requested [{requested}]")]
    InsufficientFunds {
        account_id: AccountId,
        balance: Decimal,
        requested: Amount
    },
    #[error("Entry [{entry_id}] was not found for account [{account_id}]")]
    EntryNotFound {
        account_id: AccountId,
        entry_id: EntryId
    },
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),
    #[error("Description is required for operations on account [{account_id}]")]
    InvalidDescription {
        account_id: AccountId
    },
    #[error("Numeric overflow occurred computing the balance of account [{account_id}]")]
    Overflow {
        account_id: AccountId
    },
    #[error("Storage failure: {0}")]
    StorageFailure(#[from] StorageError)
}

/// Fieldless classification of a `LedgerError`, for callers that map failures
/// onto their own presentation (status codes, exit codes, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AccountNotFound,
    SenderNotFound,
    ReceiverNotFound,
    SelfTransfer,
    InsufficientFunds,
    EntryNotFound,
    InvalidAmount,
    InvalidDescription,
    Overflow,
    StorageFailure
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AccountNotFound { .. } => ErrorKind::AccountNotFound,
            Self::SenderNotFound { .. } => ErrorKind::SenderNotFound,
            Self::ReceiverNotFound { .. } => ErrorKind::ReceiverNotFound,
            Self::SelfTransfer { .. } => ErrorKind::SelfTransfer,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::EntryNotFound { .. } => ErrorKind::EntryNotFound,
            Self::InvalidAmount(_) => ErrorKind::InvalidAmount,
            Self::InvalidDescription { .. } => ErrorKind::InvalidDescription,
            Self::Overflow { .. } => ErrorKind::Overflow,
            Self::StorageFailure(_) => ErrorKind::StorageFailure
        }
    }

    pub fn insufficient_funds(account_id: AccountId, balance: Decimal, requested: Amount) -> Self {
        Self::InsufficientFunds { account_id, balance, requested }
    }

    pub fn entry_not_found(account_id: AccountId, entry_id: EntryId) -> Self {
        Self::EntryNotFound { account_id, entry_id }
    }
}
