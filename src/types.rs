// 1.0: all the primitives live here. nothing in the engine works without these types.
// IDs, timestamps, fixed-point amounts, feed prices. each is a newtype so the compiler catches mixups.

use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// 1e18. every value-unit and debt amount carries 18 fractional digits.
pub const PRECISION: u64 = 1_000_000_000_000_000_000;

/// Fractional digits of the value unit.
pub const VALUE_DECIMALS: u8 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeedId(pub u32);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "account#{}", self.0)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset#{}", self.0)
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "feed#{}", self.0)
    }
}

/// Checked arithmetic failures. never expected under correct accounting,
/// always fatal to the enclosing action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MathError {
    #[error("arithmetic overflow")]
    Overflow,

    #[error("arithmetic underflow")]
    Underflow,

    #[error("division by zero")]
    DivisionByZero,
}

// 1.1: unsigned amount in the smallest denomination. collateral is in the
// asset's native units, value and debt are 18-decimal fixed point.
// every operation is checked: overflow and underflow are errors, never wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(U256);

impl Amount {
    pub const ZERO: Amount = Amount(U256([0; 4]));
    pub const MAX: Amount = Amount(U256::MAX);

    /// Raw smallest-denomination units.
    pub fn from_units(units: u128) -> Self {
        Self(U256::from(units))
    }

    /// Whole units of an 18-decimal quantity (`from_whole(5)` is 5e18).
    pub fn from_whole(whole: u64) -> Self {
        Self(U256::from(whole) * U256::from(PRECISION))
    }

    pub fn raw(&self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, other: Amount) -> Result<Amount, MathError> {
        self.0.checked_add(other.0).map(Self).ok_or(MathError::Overflow)
    }

    pub fn checked_sub(self, other: Amount) -> Result<Amount, MathError> {
        self.0.checked_sub(other.0).map(Self).ok_or(MathError::Underflow)
    }

    pub fn checked_div(self, other: Amount) -> Result<Amount, MathError> {
        self.0.checked_div(other.0).map(Self).ok_or(MathError::DivisionByZero)
    }

    /// `self * mul / div`, multiplication first.
    pub fn mul_div(self, mul: U256, div: U256) -> Result<Amount, MathError> {
        let product = self.0.checked_mul(mul).ok_or(MathError::Overflow)?;
        product.checked_div(div).map(Self).ok_or(MathError::DivisionByZero)
    }

    /// Human-readable value at 18 decimals. `None` when the integer part is
    /// too wide for a `Decimal` mantissa.
    pub fn to_decimal(&self) -> Option<Decimal> {
        to_decimal_with_scale(self.0, VALUE_DECIMALS)
    }
}

pub(crate) fn to_decimal_with_scale(raw: U256, scale: u8) -> Option<Decimal> {
    if raw.bits() > 96 {
        return None;
    }
    let mantissa = raw.low_u128() as i128;
    Some(Decimal::from_i128_with_scale(mantissa, scale as u32).normalize())
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// serialized as a decimal integer string so 256-bit values survive JSON
impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        U256::from_dec_str(&s)
            .map(Amount)
            .map_err(|e| de::Error::custom(format!("invalid amount {s:?}: {e:?}")))
    }
}

// 1.2: positive feed answer plus the feed's native decimals. the scale
// adjustment lifts it to the 18-decimal value unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    answer: Amount,
    decimals: u8,
}

impl Price {
    /// `None` for non-positive answers or feeds finer than the value unit.
    #[must_use]
    pub fn new(answer: i128, decimals: u8) -> Option<Self> {
        if answer <= 0 || decimals > VALUE_DECIMALS {
            return None;
        }
        Some(Self {
            answer: Amount::from_units(answer as u128),
            decimals,
        })
    }

    pub fn answer(&self) -> Amount {
        self.answer
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// `10^(18 - decimals)`: 1e10 for the usual 8-decimal feeds.
    pub fn scale_adjust(&self) -> U256 {
        U256::exp10((VALUE_DECIMALS - self.decimals) as usize)
    }

    /// Price expressed in the 18-decimal value unit.
    pub fn to_value_unit(&self) -> Result<Amount, MathError> {
        self.answer.mul_div(self.scale_adjust(), U256::one())
    }

    pub fn to_decimal(&self) -> Option<Decimal> {
        to_decimal_with_scale(self.answer.raw(), self.decimals)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_decimal() {
            Some(d) => write!(f, "{d}"),
            None => write!(f, "{}e-{}", self.answer, self.decimals),
        }
    }
}

// 1.3: unix timestamp in seconds, the granularity price feeds report in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp().max(0) as u64)
    }

    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Seconds from `earlier` to `self`; `None` if `earlier` is in the future.
    pub fn secs_since(&self, earlier: Timestamp) -> Option<u64> {
        self.0.checked_sub(earlier.0)
    }

    pub fn plus_secs(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }
}
