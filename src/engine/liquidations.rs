//! Liquidation of undercollateralized positions.
//!
//! A liquidator repays part of a target's debt with their own currency and
//! receives the equivalent collateral plus a bonus. The target must be below
//! the minimum health factor before, and strictly healthier after.

use super::core::{require_positive, Engine};
use super::results::{EngineError, LiquidationResult};
use crate::events::{EventPayload, LiquidationEvent};
use crate::types::{AccountId, Amount, AssetId};
use crate::valuation::liquidation_bonus;

impl Engine {
    /// Cover `debt_to_cover` of `target`'s debt, seizing `asset`.
    pub fn liquidate(
        &mut self,
        liquidator: AccountId,
        asset: AssetId,
        target: AccountId,
        debt_to_cover: Amount,
    ) -> Result<LiquidationResult, EngineError> {
        self.run_action("liquidate", |engine| {
            require_positive(debt_to_cover)?;
            engine.require_allowed(asset)?;

            let health_factor_before = engine.get_health_factor(target)?;
            if !engine.is_below_minimum(health_factor_before) {
                return Err(EngineError::HealthFactorOk {
                    account: target,
                    health_factor: health_factor_before,
                });
            }

            let token_amount = engine.get_token_amount_from_usd(asset, debt_to_cover)?;
            let bonus = liquidation_bonus(token_amount, engine.config.protocol.bonus_ratio())?;
            let collateral_seized = token_amount.checked_add(bonus)?;

            // collateral goes straight to the liquidator's wallet, never into
            // their position
            let payout = engine.stage_redeem(target, liquidator, asset, collateral_seized)?;
            let mut plan = engine.stage_burn(target, liquidator, debt_to_cover)?;
            plan.extend(payout);

            let health_factor_after = engine.get_health_factor(target)?;
            if health_factor_after <= health_factor_before {
                return Err(EngineError::HealthFactorNotImproved {
                    account: target,
                    before: health_factor_before,
                    after: health_factor_after,
                });
            }
            engine.assert_solvent(liquidator)?;

            engine.emit_event(EventPayload::Liquidation(LiquidationEvent {
                account_id: target,
                liquidator,
                asset,
                debt_covered: debt_to_cover,
                collateral_seized,
                bonus,
                health_factor_before,
                health_factor_after,
            }));
            tracing::info!(
                account = %target,
                liquidator = %liquidator,
                debt_covered = %debt_to_cover,
                collateral_seized = %collateral_seized,
                "position liquidated"
            );

            let result = LiquidationResult {
                account_id: target,
                liquidator,
                asset,
                debt_covered: debt_to_cover,
                collateral_seized,
                bonus,
                health_factor_before,
                health_factor_after,
            };
            Ok((result, plan))
        })
    }
}
