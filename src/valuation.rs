//! Collateral valuation.
//!
//! Converts between collateral units and the 18-decimal value unit. Both
//! directions multiply before dividing and fail on overflow rather than
//! truncate. Prices arrive already staleness-checked (see `oracle`).

use primitive_types::U256;

use crate::types::{Amount, MathError, Price, PRECISION};

/// `amount * price * scale_adjust / PRECISION`
pub fn usd_value(amount: Amount, price: Price) -> Result<Amount, MathError> {
    let price_wad = price.to_value_unit()?;
    amount.mul_div(price_wad.raw(), U256::from(PRECISION))
}

/// `usd * PRECISION / (price * scale_adjust)`, the inverse of [`usd_value`]
/// up to integer rounding (rounds down, in the protocol's favour).
pub fn token_amount_from_usd(usd: Amount, price: Price) -> Result<Amount, MathError> {
    let price_wad = price.to_value_unit()?;
    usd.mul_div(U256::from(PRECISION), price_wad.raw())
}

/// Share of `value` counted toward solvency: `value * threshold / precision`.
pub fn adjusted_collateral(value: Amount, (numerator, denominator): (U256, U256)) -> Result<Amount, MathError> {
    value.mul_div(numerator, denominator)
}

/// `tokens * bonus / precision`, the liquidator's extra seizure.
pub fn liquidation_bonus(tokens: Amount, (numerator, denominator): (U256, U256)) -> Result<Amount, MathError> {
    tokens.mul_div(numerator, denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eth_price(whole: i128) -> Price {
        Price::new(whole * 100_000_000, 8).unwrap()
    }

    #[test]
    fn usd_value_of_fifteen_eth() {
        let value = usd_value(Amount::from_whole(15), eth_price(2000)).unwrap();
        assert_eq!(value, Amount::from_whole(30_000));
    }

    #[test]
    fn token_amount_from_usd_inverse() {
        let tokens = token_amount_from_usd(Amount::from_whole(100), eth_price(2000)).unwrap();
        // 100 / 2000 = 0.05 ETH
        assert_eq!(tokens, Amount::from_units(50_000_000_000_000_000));
    }

    #[test]
    fn token_amount_rounds_down() {
        // 1000 / 18 = 55.555...
        let tokens = token_amount_from_usd(Amount::from_whole(1000), eth_price(18)).unwrap();
        assert_eq!(tokens, Amount::from_units(55_555_555_555_555_555_555));
    }

    #[test]
    fn zero_amount_has_zero_value() {
        assert_eq!(usd_value(Amount::ZERO, eth_price(2000)).unwrap(), Amount::ZERO);
    }

    #[test]
    fn six_decimal_feed_scales_up() {
        let price = Price::new(2_000_000_000, 6).unwrap(); // 2000.000000
        let value = usd_value(Amount::from_whole(1), price).unwrap();
        assert_eq!(value, Amount::from_whole(2000));
    }

    #[test]
    fn overflow_is_an_error() {
        let result = usd_value(Amount::MAX, eth_price(2000));
        assert_eq!(result, Err(MathError::Overflow));
    }

    #[test]
    fn threshold_and_bonus_percentages() {
        let half = (U256::from(50), U256::from(100));
        let tenth = (U256::from(10), U256::from(100));
        assert_eq!(adjusted_collateral(Amount::from_whole(20_000), half).unwrap(), Amount::from_whole(10_000));
        assert_eq!(liquidation_bonus(Amount::from_whole(5), tenth).unwrap(), Amount::from_units(500_000_000_000_000_000));
    }
}
