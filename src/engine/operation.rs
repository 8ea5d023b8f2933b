use rust_decimal::Decimal;
use serde::Deserialize;

use crate::types::AccountId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Open,
    Deposit,
    Withdraw,
    Transfer
}

/// A single row of the input CSV: one call against the ledger.
///
/// `counterparty` is only read for transfers (the receiver); `amount` and
/// `description` are ignored when opening an account.
#[derive(Debug, Clone, Deserialize)]
pub struct Operation {
    #[serde(rename = "type")]
    pub operation_type: OperationType,
    pub account: AccountId,
    pub counterparty: Option<AccountId>,
    pub amount: Option<Decimal>,
    pub description: Option<String>
}
