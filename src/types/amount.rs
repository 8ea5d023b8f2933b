use crate::types::errors::AmountError;
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Number of fractional digits carried by every amount and balance (currency minor units).
pub const DECIMAL_PLACES: u32 = 2;

/// Largest accepted amount expressed in minor units (13 integer digits).
const MAX_MINOR_UNITS: i64 = 999_999_999_999_999;

/// A strictly positive monetary amount with exactly two fractional digits.
///
/// Every `Amount` in the system went through `TryFrom<Decimal>`, so holding one
/// is proof that the value is positive, in range and not more precise than a cent.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Amount(Decimal);

impl Amount {
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn upper_bound() -> Decimal {
        Decimal::new(MAX_MINOR_UNITS, DECIMAL_PLACES)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive(value));
        }

        let mut normalized = value.normalize();

        if normalized.scale() > DECIMAL_PLACES {
            return Err(AmountError::TooPrecise(value));
        }

        if normalized > Self::upper_bound() {
            return Err(AmountError::OutOfRange(value));
        }

        normalized.rescale(DECIMAL_PLACES);

        Ok(Amount(normalized))
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl Display for Amount {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();

        if value.is_empty() {
            return Err(AmountError::InvalidFormat("Value is an empty string".to_string()));
        }

        let decimal = Decimal::from_str(value).map_err(|error| {
            AmountError::InvalidFormat(format!("Value [{value}] is not a decimal: {error}"))
        })?;

        Amount::try_from(decimal)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        Serialize::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Amount::try_from(value).map_err(de::Error::custom)
    }
}
