mod entry;
mod errors;
mod transfer;
mod view;

use serde::{Deserialize, Serialize};

pub use entry::{Entry, NewEntry};
pub use errors::{ErrorKind, LedgerError};
pub use transfer::{NewTransfer, Transfer};
pub use view::{EntryView, PlainView, TransferView};

/// Direction of a single journal entry. Transfers are a `Withdraw` on the
/// sender plus a `Deposit` on the receiver, told apart by their transfer link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Deposit,
    Withdraw
}
