//! Read-only queries. none of these take the action lock; all prices pass
//! through the staleness guard.

use super::core::Engine;
use super::results::{AccountInformation, EngineError};
use crate::events::Event;
use crate::health::{self, HealthFactor, PositionStatus};
use crate::ledger::Position;
use crate::types::{AccountId, Amount, AssetId, FeedId, PRECISION, VALUE_DECIMALS};
use crate::valuation;
use primitive_types::U256;

impl Engine {
    /// Value of `amount` of `asset` in 18-decimal value units.
    pub fn get_usd_value(&self, asset: AssetId, amount: Amount) -> Result<Amount, EngineError> {
        let price = self.price_of(asset)?;
        Ok(valuation::usd_value(amount, price)?)
    }

    /// Units of `asset` worth `usd_amount`, rounded down.
    pub fn get_token_amount_from_usd(&self, asset: AssetId, usd_amount: Amount) -> Result<Amount, EngineError> {
        let price = self.price_of(asset)?;
        Ok(valuation::token_amount_from_usd(usd_amount, price)?)
    }

    /// Sum over every registered asset the account holds. assets with a zero
    /// balance are skipped without reading their feed.
    pub fn get_account_collateral_value(&self, account: AccountId) -> Result<Amount, EngineError> {
        let mut total = Amount::ZERO;
        for &asset in self.ledger.registry().assets() {
            let balance = self.ledger.collateral_balance(account, asset);
            if balance.is_zero() {
                continue;
            }
            total = total.checked_add(self.get_usd_value(asset, balance)?)?;
        }
        Ok(total)
    }

    pub fn get_account_information(&self, account: AccountId) -> Result<AccountInformation, EngineError> {
        Ok(AccountInformation {
            total_dsc_minted: self.ledger.debt(account),
            collateral_value_in_usd: self.get_account_collateral_value(account)?,
        })
    }

    /// Debt-free accounts are `HealthFactor::MAX` without touching any feed.
    pub fn get_health_factor(&self, account: AccountId) -> Result<HealthFactor, EngineError> {
        let debt = self.ledger.debt(account);
        if debt.is_zero() {
            return Ok(HealthFactor::MAX);
        }
        let value = self.get_account_collateral_value(account)?;
        self.calculate_health_factor(debt, value)
    }

    /// Health factor for hypothetical figures.
    pub fn calculate_health_factor(
        &self,
        total_dsc_minted: Amount,
        collateral_value_in_usd: Amount,
    ) -> Result<HealthFactor, EngineError> {
        Ok(health::calculate_health_factor(
            total_dsc_minted,
            collateral_value_in_usd,
            self.config.protocol.threshold_ratio(),
        )?)
    }

    /// Accounts below the minimum health factor, lowest first. accounts whose
    /// valuation fails (stale feed, overflow) are skipped.
    pub fn liquidatable_accounts(&self) -> Vec<(AccountId, HealthFactor)> {
        let protocol = &self.config.protocol;
        let mut found: Vec<(AccountId, HealthFactor)> = self
            .ledger
            .positions()
            .filter(|(_, position)| !position.debt().is_zero())
            .filter_map(|(&account, position)| {
                let status = self
                    .get_account_collateral_value(account)
                    .and_then(|value| {
                        Ok(health::evaluate_position(
                            position.debt(),
                            value,
                            protocol.threshold_ratio(),
                            protocol.min_health_factor,
                        )?)
                    });
                match status {
                    Ok(PositionStatus::Liquidatable { health_factor }) => Some((account, health_factor)),
                    Ok(_) => None,
                    Err(err) => {
                        tracing::debug!(account = %account, error = %err, "skipping account in scan");
                        None
                    }
                }
            })
            .collect();
        found.sort_by_key(|&(account, hf)| (hf, account));
        found
    }

    pub fn get_collateral_tokens(&self) -> &[AssetId] {
        self.ledger.registry().assets()
    }

    pub fn get_collateral_balance_of_user(&self, account: AccountId, asset: AssetId) -> Amount {
        self.ledger.collateral_balance(account, asset)
    }

    pub fn get_collateral_token_price_feed(&self, asset: AssetId) -> Option<FeedId> {
        self.ledger.registry().feed_of(asset)
    }

    pub fn get_debt_of_user(&self, account: AccountId) -> Amount {
        self.ledger.debt(account)
    }

    pub fn get_position(&self, account: AccountId) -> Option<&Position> {
        self.ledger.position(account)
    }

    /// Sum of all debt. matches the currency supply.
    pub fn total_debt(&self) -> Result<Amount, EngineError> {
        Ok(self.ledger.total_debt()?)
    }

    pub fn precision(&self) -> U256 {
        U256::from(PRECISION)
    }

    /// Scale from `asset`'s feed decimals up to 18 decimals.
    pub fn additional_feed_precision(&self, asset: AssetId) -> Result<U256, EngineError> {
        let feed = self
            .feeds
            .get(&asset)
            .ok_or(EngineError::NotAllowedToken(asset))?;
        Ok(U256::exp10(usize::from(VALUE_DECIMALS - feed.decimals())))
    }

    pub fn liquidation_threshold(&self) -> u64 {
        self.config.protocol.liquidation_threshold
    }

    pub fn liquidation_bonus(&self) -> u64 {
        self.config.protocol.liquidation_bonus
    }

    pub fn liquidation_precision(&self) -> u64 {
        self.config.protocol.liquidation_precision
    }

    pub fn min_health_factor(&self) -> Amount {
        self.config.protocol.min_health_factor
    }

    /// Maximum price age in seconds.
    pub fn price_timeout(&self) -> u64 {
        self.config.protocol.price_timeout_secs
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn recent_events(&self, count: usize) -> &[Event] {
        self.events.recent(count)
    }
}
