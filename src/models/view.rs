use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{Entry, EntryKind, Transfer};
use crate::types::{AccountId, Amount, EntryId};

/// Externally visible shape of a journal entry.
///
/// Serializes with a `type` tag of `deposit`, `withdraw`, `transfer_sent` or
/// `transfer_received`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryView {
    Deposit(PlainView),
    Withdraw(PlainView),
    TransferSent(TransferView),
    TransferReceived(TransferView)
}

/// A standalone deposit or withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlainView {
    pub id: EntryId,
    pub account_id: AccountId,
    pub amount: Amount,
    pub description: String,
    pub kind: EntryKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>
}

/// One leg of a transfer, seen from the owning account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferView {
    pub id: EntryId,
    pub account_id: AccountId,
    pub amount: Amount,
    pub description: String,
    pub counterparty_id: AccountId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>
}

impl EntryView {
    /// Maps an entry and its (optional) transfer into a view. Pure; performs no I/O.
    ///
    /// A transfer that is not the one the entry links to is ignored.
    pub fn from_entry(entry: &Entry, transfer: Option<&Transfer>) -> Self {
        let transfer = transfer.filter(|transfer| entry.transfer_id == Some(transfer.id));

        match (entry.kind, transfer) {
            (EntryKind::Withdraw, Some(transfer)) => {
                EntryView::TransferSent(TransferView::new(entry, transfer.receiver_id))
            }
            (EntryKind::Deposit, Some(transfer)) => {
                EntryView::TransferReceived(TransferView::new(entry, transfer.sender_id))
            }
            (EntryKind::Deposit, None) => EntryView::Deposit(PlainView::from(entry)),
            (EntryKind::Withdraw, None) => EntryView::Withdraw(PlainView::from(entry))
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            EntryView::Deposit(_) => "deposit",
            EntryView::Withdraw(_) => "withdraw",
            EntryView::TransferSent(_) => "transfer_sent",
            EntryView::TransferReceived(_) => "transfer_received"
        }
    }

    pub fn id(&self) -> EntryId {
        match self {
            EntryView::Deposit(view) | EntryView::Withdraw(view) => view.id,
            EntryView::TransferSent(view) | EntryView::TransferReceived(view) => view.id
        }
    }

    pub fn amount(&self) -> Amount {
        match self {
            EntryView::Deposit(view) | EntryView::Withdraw(view) => view.amount,
            EntryView::TransferSent(view) | EntryView::TransferReceived(view) => view.amount
        }
    }

    pub fn counterparty_id(&self) -> Option<AccountId> {
        match self {
            EntryView::Deposit(_) | EntryView::Withdraw(_) => None,
            EntryView::TransferSent(view) | EntryView::TransferReceived(view) => Some(view.counterparty_id)
        }
    }
}

impl From<&Entry> for PlainView {
    fn from(entry: &Entry) -> Self {
        Self {
            id: entry.id,
            account_id: entry.account_id,
            amount: entry.amount,
            description: entry.description.clone(),
            kind: entry.kind,
            created_at: entry.created_at,
            updated_at: entry.updated_at
        }
    }
}

impl TransferView {
    fn new(entry: &Entry, counterparty_id: AccountId) -> Self {
        Self {
            id: entry.id,
            account_id: entry.account_id,
            amount: entry.amount,
            description: entry.description.clone(),
            counterparty_id,
            created_at: entry.created_at,
            updated_at: entry.updated_at
        }
    }
}
