mod amount;
mod errors;

pub use amount::{Amount, DECIMAL_PLACES};
pub use errors::AmountError;

pub type AccountId = u16;
pub type EntryId = u64;
pub type TransferId = u64;
