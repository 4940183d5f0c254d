// 8.0.2: result types and errors for engine operations.

use crate::config::ConfigError;
use crate::guard::ReentrancyError;
use crate::health::HealthFactor;
use crate::ledger::LedgerError;
use crate::oracle::OracleError;
use crate::types::{AccountId, Amount, AssetId, FeedId, MathError};
use serde::{Deserialize, Serialize};

/// Debt and collateral value of one account, both 18-decimal value units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInformation {
    pub total_dsc_minted: Amount,
    pub collateral_value_in_usd: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationResult {
    pub account_id: AccountId,
    pub liquidator: AccountId,
    pub asset: AssetId,
    pub debt_covered: Amount,
    pub collateral_seized: Amount, // bonus included
    pub bonus: Amount,
    pub health_factor_before: HealthFactor,
    pub health_factor_after: HealthFactor,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Amount must be more than zero")]
    NeedsMoreThanZero,

    #[error("Asset {0} is not allowed as collateral")]
    NotAllowedToken(AssetId),

    #[error("Collateral config mismatch: {tokens} tokens, {feeds} price feeds")]
    MismatchedCollateralConfig { tokens: usize, feeds: usize },

    #[error("Asset {0} registered twice")]
    DuplicateCollateral(AssetId),

    #[error("Feed {feed} reports {decimals} decimals, at most 18 supported")]
    UnsupportedFeedDecimals { feed: FeedId, decimals: u8 },

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Math error: {0}")]
    Math(#[from] MathError),

    #[error("Pulling {amount} of {asset} from {from} failed")]
    CollateralDepositFailed {
        asset: AssetId,
        from: AccountId,
        amount: Amount,
    },

    #[error("Sending {amount} of {asset} to {to} failed")]
    CollateralTransferFailed {
        asset: AssetId,
        to: AccountId,
        amount: Amount,
    },

    #[error("Currency transfer of {amount} with {account} failed")]
    CurrencyTransferFailed { account: AccountId, amount: Amount },

    #[error("Minting {amount} to {to} failed")]
    MintFailed { to: AccountId, amount: Amount },

    #[error("Burning {amount} failed")]
    BurnFailed { amount: Amount },

    #[error("Health factor of {account} broken: {health_factor}")]
    HealthFactorBroken {
        account: AccountId,
        health_factor: HealthFactor,
    },

    #[error("Health factor of {account} is ok: {health_factor}")]
    HealthFactorOk {
        account: AccountId,
        health_factor: HealthFactor,
    },

    #[error("Health factor of {account} not improved: {before} -> {after}")]
    HealthFactorNotImproved {
        account: AccountId,
        before: HealthFactor,
        after: HealthFactor,
    },

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Reentrant call rejected")]
    Reentrancy,
}

impl From<ReentrancyError> for EngineError {
    fn from(_: ReentrancyError) -> Self {
        EngineError::Reentrancy
    }
}

impl From<LedgerError> for EngineError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::UnknownAsset(asset) => EngineError::NotAllowedToken(asset),
            LedgerError::DuplicateCollateral(asset) => EngineError::DuplicateCollateral(asset),
            LedgerError::Math(math) => EngineError::Math(math),
        }
    }
}
