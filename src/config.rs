// 7.0 config.rs: protocol risk parameters in one place.
// defaults are the protocol constants; validate() rejects inconsistent overrides.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::types::{Amount, PRECISION};

/// Three hours. a feed older than this freezes every action that needs it.
pub const PRICE_TIMEOUT_SECS: u64 = 3 * 60 * 60;

/// Half of nominal collateral value counts toward solvency (200% backing).
pub const LIQUIDATION_THRESHOLD: u64 = 50;

/// Liquidators receive 10% extra collateral on top of the debt they cover.
pub const LIQUIDATION_BONUS: u64 = 10;

/// Denominator for threshold and bonus percentages.
pub const LIQUIDATION_PRECISION: u64 = 100;

// Complete risk configuration for the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParams {
    // Percentage of collateral value counted toward solvency
    pub liquidation_threshold: u64,
    // Bonus percentage paid to liquidators in collateral
    pub liquidation_bonus: u64,
    // Denominator for the two percentages above
    pub liquidation_precision: u64,
    // Health factor floor, 18 decimals (1e18 = 1.0)
    pub min_health_factor: Amount,
    // Maximum age of a price round in seconds
    pub price_timeout_secs: u64,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            liquidation_threshold: LIQUIDATION_THRESHOLD,
            liquidation_bonus: LIQUIDATION_BONUS,
            liquidation_precision: LIQUIDATION_PRECISION,
            min_health_factor: Amount::from_units(PRECISION as u128),
            price_timeout_secs: PRICE_TIMEOUT_SECS,
        }
    }
}

impl ProtocolParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.liquidation_precision == 0 {
            return Err(ConfigError::InvalidLiquidation {
                reason: "liquidation precision must be positive".to_string(),
            });
        }

        // a threshold above 100% would let debt exceed collateral value
        if self.liquidation_threshold == 0 || self.liquidation_threshold > self.liquidation_precision {
            return Err(ConfigError::InvalidLiquidation {
                reason: "threshold must be in (0, precision]".to_string(),
            });
        }

        if self.liquidation_bonus >= self.liquidation_precision {
            return Err(ConfigError::InvalidLiquidation {
                reason: "bonus must be below 100%".to_string(),
            });
        }

        if self.min_health_factor.is_zero() {
            return Err(ConfigError::InvalidHealthFactor {
                reason: "minimum health factor must be positive".to_string(),
            });
        }

        if self.price_timeout_secs == 0 {
            return Err(ConfigError::InvalidPriceFeed {
                reason: "price timeout must be positive".to_string(),
            });
        }

        Ok(())
    }

    pub fn threshold_ratio(&self) -> (U256, U256) {
        (U256::from(self.liquidation_threshold), U256::from(self.liquidation_precision))
    }

    pub fn bonus_ratio(&self) -> (U256, U256) {
        (U256::from(self.liquidation_bonus), U256::from(self.liquidation_precision))
    }
}

// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid liquidation parameters: {reason}")]
    InvalidLiquidation { reason: String },

    #[error("invalid health factor: {reason}")]
    InvalidHealthFactor { reason: String },

    #[error("invalid price feed settings: {reason}")]
    InvalidPriceFeed { reason: String },
}
