use chrono::{DateTime, Utc};

use crate::types::{AccountId, TransferId};

/// Pairing record linking the sender's withdraw leg with the receiver's deposit leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub id: TransferId,
    pub sender_id: AccountId,
    pub receiver_id: AccountId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewTransfer {
    pub sender_id: AccountId,
    pub receiver_id: AccountId
}

impl NewTransfer {
    pub fn new(sender_id: AccountId, receiver_id: AccountId) -> Self {
        Self { sender_id, receiver_id }
    }

    pub(crate) fn into_transfer(self, id: TransferId, now: DateTime<Utc>) -> Transfer {
        Transfer {
            id,
            sender_id: self.sender_id,
            receiver_id: self.receiver_id,
            created_at: now,
            updated_at: now
        }
    }
}
