//! Collateral actions: deposit, redeem and their compositions with debt.

use super::core::{require_positive, Engine};
use super::results::EngineError;
use crate::events::{CollateralDepositedEvent, CollateralRedeemedEvent, EventPayload};
use crate::settlement::Interaction;
use crate::types::{AccountId, Amount, AssetId};

impl Engine {
    /// Lock `amount` of `asset` from `caller`'s wallet into their position.
    /// the caller must have approved the engine beforehand.
    pub fn deposit_collateral(&mut self, caller: AccountId, asset: AssetId, amount: Amount) -> Result<(), EngineError> {
        self.run_action("deposit_collateral", |engine| {
            let plan = engine.stage_deposit(caller, asset, amount)?;
            Ok(((), plan))
        })
    }

    /// Withdraw collateral. the position must stay solvent afterwards.
    pub fn redeem_collateral(&mut self, caller: AccountId, asset: AssetId, amount: Amount) -> Result<(), EngineError> {
        self.run_action("redeem_collateral", |engine| {
            let plan = engine.stage_redeem(caller, caller, asset, amount)?;
            engine.assert_solvent(caller)?;
            Ok(((), plan))
        })
    }

    /// Deposit and mint in one step.
    pub fn deposit_collateral_and_mint_dsc(
        &mut self,
        caller: AccountId,
        asset: AssetId,
        amount_collateral: Amount,
        amount_dsc: Amount,
    ) -> Result<(), EngineError> {
        self.run_action("deposit_collateral_and_mint_dsc", |engine| {
            let mut plan = engine.stage_deposit(caller, asset, amount_collateral)?;
            plan.extend(engine.stage_mint(caller, amount_dsc)?);
            Ok(((), plan))
        })
    }

    /// Burn `amount_dsc` of the caller's own debt, then withdraw collateral.
    /// solvency is checked once, against the final position.
    pub fn redeem_collateral_for_dsc(
        &mut self,
        caller: AccountId,
        asset: AssetId,
        amount_collateral: Amount,
        amount_dsc: Amount,
    ) -> Result<(), EngineError> {
        self.run_action("redeem_collateral_for_dsc", |engine| {
            let mut plan = engine.stage_burn(caller, caller, amount_dsc)?;
            plan.extend(engine.stage_redeem(caller, caller, asset, amount_collateral)?);
            engine.assert_solvent(caller)?;
            Ok(((), plan))
        })
    }

    pub(super) fn stage_deposit(
        &mut self,
        caller: AccountId,
        asset: AssetId,
        amount: Amount,
    ) -> Result<Vec<Interaction>, EngineError> {
        require_positive(amount)?;
        self.require_allowed(asset)?;

        self.ledger.credit_collateral(caller, asset, amount)?;
        self.emit_event(EventPayload::CollateralDeposited(CollateralDepositedEvent {
            account_id: caller,
            asset,
            amount,
        }));

        Ok(vec![Interaction::PullCollateral {
            asset,
            from: caller,
            amount,
        }])
    }

    /// Debit `from`'s position and plan the transfer to `to`'s wallet.
    /// no solvency check here, callers decide whose health matters.
    pub(super) fn stage_redeem(
        &mut self,
        from: AccountId,
        to: AccountId,
        asset: AssetId,
        amount: Amount,
    ) -> Result<Vec<Interaction>, EngineError> {
        require_positive(amount)?;
        self.require_allowed(asset)?;

        self.ledger.debit_collateral(from, asset, amount)?;
        self.emit_event(EventPayload::CollateralRedeemed(CollateralRedeemedEvent {
            from,
            to,
            asset,
            amount,
        }));

        Ok(vec![Interaction::PushCollateral { asset, to, amount }])
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::{Engine, EngineConfig, EngineError};
    use crate::oracle::MockPriceFeed;
    use crate::tokens::{MockCurrency, MockToken};
    use crate::types::{AccountId, Amount, AssetId, FeedId, MathError, Timestamp};

    const ENGINE: AccountId = AccountId(1000);
    const ALICE: AccountId = AccountId(1);
    const WETH: AssetId = AssetId(1);

    fn units(n: u64) -> Amount {
        Amount::from_whole(n)
    }

    fn setup() -> (Engine, MockToken) {
        let now = Timestamp::from_secs(1_700_000_000);
        let weth = MockToken::new(ENGINE);
        let feed = MockPriceFeed::new(FeedId(1), 8, 2000 * 100_000_000, now);
        let mut engine = Engine::new(
            EngineConfig::default(),
            ENGINE,
            vec![(WETH, Box::new(weth.clone()))],
            vec![Box::new(feed)],
            Box::new(MockCurrency::new(ENGINE)),
        )
        .unwrap();
        engine.set_time(now);

        weth.mint_to(ALICE, units(10));
        weth.approve(ALICE, units(10));
        (engine, weth)
    }

    #[test]
    fn test_deposit_moves_tokens_into_custody() {
        let (mut engine, weth) = setup();
        engine.deposit_collateral(ALICE, WETH, units(10)).unwrap();

        assert_eq!(engine.get_collateral_balance_of_user(ALICE, WETH), units(10));
        assert_eq!(weth.balance_of(ENGINE), units(10));
        assert_eq!(weth.balance_of(ALICE), Amount::ZERO);
        assert_eq!(engine.events().len(), 1);
    }

    #[test]
    fn test_deposit_rejects_zero_and_unknown_asset() {
        let (mut engine, _) = setup();
        assert_eq!(
            engine.deposit_collateral(ALICE, WETH, Amount::ZERO),
            Err(EngineError::NeedsMoreThanZero)
        );
        assert_eq!(
            engine.deposit_collateral(ALICE, AssetId(99), units(1)),
            Err(EngineError::NotAllowedToken(AssetId(99)))
        );
        assert!(engine.events().is_empty());
    }

    #[test]
    fn test_redeem_more_than_deposited_underflows() {
        let (mut engine, weth) = setup();
        engine.deposit_collateral(ALICE, WETH, units(5)).unwrap();

        let err = engine.redeem_collateral(ALICE, WETH, units(6)).unwrap_err();
        assert_eq!(err, EngineError::Math(MathError::Underflow));
        assert_eq!(engine.get_collateral_balance_of_user(ALICE, WETH), units(5));
        assert_eq!(weth.balance_of(ENGINE), units(5));
    }

    #[test]
    fn test_redeem_without_debt_returns_everything() {
        let (mut engine, weth) = setup();
        engine.deposit_collateral(ALICE, WETH, units(10)).unwrap();
        engine.redeem_collateral(ALICE, WETH, units(10)).unwrap();

        assert_eq!(weth.balance_of(ALICE), units(10));
        assert!(engine.ledger().position(ALICE).is_none());
    }
}
