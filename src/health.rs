//! Health factor math.
//!
//! health = (collateral value * threshold / precision) * 1e18 / debt
//!
//! A position without debt has infinite health and can never be liquidated.
//! Anything at or above the minimum (1.0) is solvent; below it the position is
//! liquidatable and no caller-initiated action may leave it there.

use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Amount, MathError, PRECISION};
use crate::valuation::adjusted_collateral;

/// 18-decimal solvency ratio. `HealthFactor::MAX` stands for "no debt".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HealthFactor(Amount);

impl HealthFactor {
    pub const MAX: HealthFactor = HealthFactor(Amount::MAX);

    pub fn from_amount(raw: Amount) -> Self {
        Self(raw)
    }

    pub fn value(&self) -> Amount {
        self.0
    }

    pub fn is_infinite(&self) -> bool {
        *self == Self::MAX
    }

    pub fn is_below(&self, minimum: Amount) -> bool {
        self.0 < minimum
    }

    /// `None` for infinite health.
    pub fn to_decimal(&self) -> Option<Decimal> {
        if self.is_infinite() {
            return None;
        }
        self.0.to_decimal()
    }
}

impl fmt::Display for HealthFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_decimal() {
            Some(d) => write!(f, "{d}"),
            None if self.is_infinite() => write!(f, "inf"),
            None => write!(f, "{}e-18", self.0),
        }
    }
}

/// Solvency status of a position, mirroring how liquidators see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionStatus {
    NoDebt,
    Healthy { health_factor: HealthFactor },
    Liquidatable { health_factor: HealthFactor },
}

pub fn calculate_health_factor(
    total_debt: Amount,
    collateral_value: Amount,
    threshold: (U256, U256),
) -> Result<HealthFactor, MathError> {
    if total_debt.is_zero() {
        return Ok(HealthFactor::MAX);
    }
    let adjusted = adjusted_collateral(collateral_value, threshold)?;
    let ratio = adjusted.mul_div(U256::from(PRECISION), total_debt.raw())?;
    Ok(HealthFactor(ratio))
}

pub fn evaluate_position(
    total_debt: Amount,
    collateral_value: Amount,
    threshold: (U256, U256),
    min_health_factor: Amount,
) -> Result<PositionStatus, MathError> {
    if total_debt.is_zero() {
        return Ok(PositionStatus::NoDebt);
    }
    let health_factor = calculate_health_factor(total_debt, collateral_value, threshold)?;
    if health_factor.is_below(min_health_factor) {
        Ok(PositionStatus::Liquidatable { health_factor })
    } else {
        Ok(PositionStatus::Healthy { health_factor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn half() -> (U256, U256) {
        (U256::from(50), U256::from(100))
    }

    #[test]
    fn no_debt_is_infinite() {
        let hf = calculate_health_factor(Amount::ZERO, Amount::ZERO, half()).unwrap();
        assert!(hf.is_infinite());
        assert_eq!(hf.to_decimal(), None);
        assert_eq!(hf.to_string(), "inf");
    }

    #[test]
    fn exactly_two_x_backing_is_one() {
        let hf = calculate_health_factor(Amount::from_whole(10_000), Amount::from_whole(20_000), half()).unwrap();
        assert_eq!(hf.value(), Amount::from_whole(1));
        assert_eq!(hf.to_decimal(), Some(dec!(1)));
        assert!(!hf.is_below(Amount::from_whole(1)));
    }

    #[test]
    fn four_x_backing_is_two() {
        let hf = calculate_health_factor(Amount::from_whole(5000), Amount::from_whole(20_000), half()).unwrap();
        assert_eq!(hf.value(), Amount::from_whole(2));
    }

    #[test]
    fn crashed_collateral_is_below_one() {
        // 10 units at $18 against 5000 debt
        let hf = calculate_health_factor(Amount::from_whole(5000), Amount::from_whole(180), half()).unwrap();
        assert_eq!(hf.to_decimal(), Some(dec!(0.018)));
    }

    #[test]
    fn evaluate_position_statuses() {
        let min = Amount::from_whole(1);
        assert_eq!(
            evaluate_position(Amount::ZERO, Amount::from_whole(1), half(), min).unwrap(),
            PositionStatus::NoDebt
        );
        assert!(matches!(
            evaluate_position(Amount::from_whole(100), Amount::from_whole(1000), half(), min).unwrap(),
            PositionStatus::Healthy { .. }
        ));
        assert!(matches!(
            evaluate_position(Amount::from_whole(100), Amount::from_whole(180), half(), min).unwrap(),
            PositionStatus::Liquidatable { .. }
        ));
    }
}
