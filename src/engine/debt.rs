//! Debt actions: minting and burning the synthetic currency.

use super::core::{require_positive, Engine};
use super::results::EngineError;
use crate::events::{DscBurnedEvent, DscMintedEvent, EventPayload};
use crate::settlement::Interaction;
use crate::types::{AccountId, Amount};

impl Engine {
    /// Mint `amount` to the caller against their collateral.
    pub fn mint_dsc(&mut self, caller: AccountId, amount: Amount) -> Result<(), EngineError> {
        self.run_action("mint_dsc", |engine| {
            let plan = engine.stage_mint(caller, amount)?;
            Ok(((), plan))
        })
    }

    /// Repay the caller's own debt with currency from their wallet.
    pub fn burn_dsc(&mut self, caller: AccountId, amount: Amount) -> Result<(), EngineError> {
        self.run_action("burn_dsc", |engine| {
            let plan = engine.stage_burn(caller, caller, amount)?;
            engine.assert_solvent(caller)?;
            Ok(((), plan))
        })
    }

    pub(super) fn stage_mint(&mut self, caller: AccountId, amount: Amount) -> Result<Vec<Interaction>, EngineError> {
        require_positive(amount)?;

        let new_debt = self.ledger.increase_debt(caller, amount)?;
        self.emit_event(EventPayload::DscMinted(DscMintedEvent {
            account_id: caller,
            amount,
            new_debt,
        }));
        self.assert_solvent(caller)?;

        Ok(vec![Interaction::MintCurrency { to: caller, amount }])
    }

    /// Reduce `on_behalf_of`'s debt, paid with currency pulled from `payer`.
    pub(super) fn stage_burn(
        &mut self,
        on_behalf_of: AccountId,
        payer: AccountId,
        amount: Amount,
    ) -> Result<Vec<Interaction>, EngineError> {
        require_positive(amount)?;

        let new_debt = self.ledger.decrease_debt(on_behalf_of, amount)?;
        self.emit_event(EventPayload::DscBurned(DscBurnedEvent {
            on_behalf_of,
            payer,
            amount,
            new_debt,
        }));

        Ok(vec![
            Interaction::PullCurrency { from: payer, amount },
            Interaction::BurnCurrency { amount },
        ])
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

    fn setup() -> (Engine, MockCurrency) {
        let now = Timestamp::from_secs(1_700_000_000);
        let weth = MockToken::new(ENGINE);
        let dsc = MockCurrency::new(ENGINE);
        let feed = MockPriceFeed::new(FeedId(1), 8, 2000 * 100_000_000, now);
        let mut engine = Engine::new(
            EngineConfig::default(),
            ENGINE,
            vec![(WETH, Box::new(weth.clone()))],
            vec![Box::new(feed)],
            Box::new(dsc.clone()),
        )
        .unwrap();
        engine.set_time(now);

        weth.mint_to(ALICE, units(10));
        weth.approve(ALICE, units(10));
        engine.deposit_collateral(ALICE, WETH, units(10)).unwrap();
        (engine, dsc)
    }

    #[test]
    fn test_mint_up_to_threshold() {
        let (mut engine, dsc) = setup();
        engine.mint_dsc(ALICE, units(10_000)).unwrap();

        assert_eq!(engine.get_debt_of_user(ALICE), units(10_000));
        assert_eq!(dsc.balance_of(ALICE), units(10_000));
        assert_eq!(dsc.total_supply(), units(10_000));
    }

    #[test]
    fn test_mint_past_threshold_is_rejected() {
        let (mut engine, dsc) = setup();
        let err = engine.mint_dsc(ALICE, units(10_001)).unwrap_err();

        assert!(matches!(err, EngineError::HealthFactorBroken { account, .. } if account == ALICE));
        assert_eq!(engine.get_debt_of_user(ALICE), Amount::ZERO);
        assert_eq!(dsc.total_supply(), Amount::ZERO);
    }

    #[test]
    fn test_burn_requires_allowance() {
        let (mut engine, dsc) = setup();
        engine.mint_dsc(ALICE, units(100)).unwrap();

        let err = engine.burn_dsc(ALICE, units(40)).unwrap_err();
        assert_eq!(
            err,
            EngineError::CurrencyTransferFailed {
                account: ALICE,
                amount: units(40)
            }
        );
        assert_eq!(engine.get_debt_of_user(ALICE), units(100));

        dsc.approve(ALICE, units(40));
        engine.burn_dsc(ALICE, units(40)).unwrap();
        assert_eq!(engine.get_debt_of_user(ALICE), units(60));
        assert_eq!(dsc.total_supply(), units(60));
    }

    #[test]
    fn test_burn_more_than_debt_underflows() {
        let (mut engine, dsc) = setup();
        engine.mint_dsc(ALICE, units(10)).unwrap();
        dsc.approve(ALICE, units(11));

        assert_eq!(
            engine.burn_dsc(ALICE, units(11)),
            Err(EngineError::Math(MathError::Underflow))
        );
    }
}
