use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("Amount error: {0}")]
    InvalidFormat(String),
    #[error("Amount error: [{0}] must be greater than zero")]
    NotPositive(Decimal),
    #[error("Amount error: [{0}] has more than two decimal places")]
    TooPrecise(Decimal),
    #[error("Amount error: [{0}] exceeds the supported range")]
    OutOfRange(Decimal)
}
