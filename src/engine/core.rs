// 8.0 engine/core.rs: main engine. owns the ledger, the collaborator handles
// and the event log, and drives every action through one atomic scope.

use super::config::EngineConfig;
use super::results::EngineError;
use crate::events::{EventLog, EventPayload};
use crate::guard::ActionLock;
use crate::health::HealthFactor;
use crate::ledger::{CollateralRegistry, Ledger};
use crate::oracle::{fresh_price, PriceFeed};
use crate::settlement::{Interaction, InteractionLog};
use crate::tokens::{CollateralToken, SyntheticCurrency};
use crate::types::{AccountId, Amount, AssetId, Price, Timestamp, VALUE_DECIMALS};
use std::collections::HashMap;

/** 8.1: main engine struct. all state lives here */
#[derive(Debug)]
pub struct Engine {
    pub(super) config: EngineConfig,
    pub(super) engine_account: AccountId,
    pub(super) ledger: Ledger,
    pub(super) tokens: HashMap<AssetId, Box<dyn CollateralToken>>,
    pub(super) feeds: HashMap<AssetId, Box<dyn PriceFeed>>,
    pub(super) currency: Box<dyn SyntheticCurrency>,
    pub(super) lock: ActionLock,
    pub(super) events: EventLog,
    pub(super) current_time: Timestamp,
}

impl Engine {
    /// `collateral_tokens[i]` is priced by `price_feeds[i]`. the registry is
    /// fixed from here on.
    pub fn new(
        config: EngineConfig,
        engine_account: AccountId,
        collateral_tokens: Vec<(AssetId, Box<dyn CollateralToken>)>,
        price_feeds: Vec<Box<dyn PriceFeed>>,
        currency: Box<dyn SyntheticCurrency>,
    ) -> Result<Self, EngineError> {
        config.protocol.validate()?;

        if collateral_tokens.len() != price_feeds.len() {
            return Err(EngineError::MismatchedCollateralConfig {
                tokens: collateral_tokens.len(),
                feeds: price_feeds.len(),
            });
        }

        if let Some(feed) = price_feeds.iter().find(|f| f.decimals() > VALUE_DECIMALS) {
            return Err(EngineError::UnsupportedFeedDecimals {
                feed: feed.feed_id(),
                decimals: feed.decimals(),
            });
        }

        let registry = CollateralRegistry::new(
            collateral_tokens
                .iter()
                .zip(&price_feeds)
                .map(|((asset, _), feed)| (*asset, feed.feed_id())),
        )?;

        let assets: Vec<AssetId> = registry.assets().to_vec();
        let feeds = assets.iter().copied().zip(price_feeds).collect();
        let tokens = collateral_tokens.into_iter().collect();

        tracing::info!(
            engine = %engine_account,
            collateral = assets.len(),
            "engine initialized"
        );

        Ok(Self {
            events: EventLog::new(config.max_events),
            config,
            engine_account,
            ledger: Ledger::new(registry),
            tokens,
            feeds,
            currency,
            lock: ActionLock::new(),
            current_time: Timestamp::from_secs(0),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The account the engine holds custody and currency under.
    pub fn engine_account(&self) -> AccountId {
        self.engine_account
    }

    /// Handle to the system-wide action lock.
    pub fn lock_handle(&self) -> ActionLock {
        self.lock.clone()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    pub fn advance_time(&mut self, secs: u64) {
        self.current_time = self.current_time.plus_secs(secs);
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        self.events.emit(self.current_time, payload);
    }

    /// Runs one write action. `stage` applies ledger effects and checks and
    /// returns the external calls to make; those run only once it succeeds.
    /// Any failure rolls back the ledger, drops the action's events and hands
    /// back whatever external calls already completed.
    ///
    /// A compensation that itself fails is logged at `error` and skipped; the
    /// ledger still rolls back. Undoing a burn re-mints to the engine, so if
    /// that mint fails the currency supply ends below recorded debt until an
    /// operator reconciles it.
    pub(super) fn run_action<T>(
        &mut self,
        action: &'static str,
        stage: impl FnOnce(&mut Self) -> Result<(T, Vec<Interaction>), EngineError>,
    ) -> Result<T, EngineError> {
        let _guard = self.lock.acquire()?;
        let mark = self.events.mark();
        self.ledger.begin();

        let outcome = match stage(self) {
            Ok((value, plan)) => self.settle(plan).map(|()| value),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(value) => {
                self.ledger.commit();
                self.events.trim();
                tracing::info!(action, "action committed");
                Ok(value)
            }
            Err(err) => {
                self.ledger.rollback();
                self.events.rewind(mark);
                tracing::warn!(action, error = %err, "action rejected");
                Err(err)
            }
        }
    }

    fn settle(&mut self, plan: Vec<Interaction>) -> Result<(), EngineError> {
        let mut completed = InteractionLog::new();
        for step in plan {
            if let Err(err) = self.execute(step) {
                self.compensate(completed);
                return Err(err);
            }
            completed.record(step);
        }
        Ok(())
    }

    fn compensate(&mut self, completed: InteractionLog) {
        if completed.is_empty() {
            return;
        }
        tracing::debug!(steps = completed.len(), "compensating completed interactions");
        for step in completed.compensations(self.engine_account) {
            if let Err(err) = self.execute(step) {
                tracing::error!(?step, error = %err, "compensation failed");
            }
        }
    }

    fn execute(&mut self, step: Interaction) -> Result<(), EngineError> {
        let engine = self.engine_account;
        let ok = match step {
            Interaction::PullCollateral { asset, from, amount } => {
                self.token_mut(asset)?.transfer_from(from, engine, amount)
            }
            Interaction::PushCollateral { asset, to, amount } => self.token_mut(asset)?.transfer(to, amount),
            Interaction::PullCurrency { from, amount } => self.currency.transfer_from(from, engine, amount),
            Interaction::PushCurrency { to, amount } => self.currency.transfer(to, amount),
            Interaction::BurnCurrency { amount } => self.currency.burn(amount),
            Interaction::MintCurrency { to, amount } => self.currency.mint(to, amount),
        };
        if ok {
            tracing::debug!(?step, "interaction completed");
            return Ok(());
        }

        Err(match step {
            Interaction::PullCollateral { asset, from, amount } => {
                EngineError::CollateralDepositFailed { asset, from, amount }
            }
            Interaction::PushCollateral { asset, to, amount } => {
                EngineError::CollateralTransferFailed { asset, to, amount }
            }
            Interaction::PullCurrency { from: account, amount }
            | Interaction::PushCurrency { to: account, amount } => {
                EngineError::CurrencyTransferFailed { account, amount }
            }
            Interaction::BurnCurrency { amount } => EngineError::BurnFailed { amount },
            Interaction::MintCurrency { to, amount } => EngineError::MintFailed { to, amount },
        })
    }

    fn token_mut(&mut self, asset: AssetId) -> Result<&mut Box<dyn CollateralToken>, EngineError> {
        self.tokens
            .get_mut(&asset)
            .ok_or(EngineError::NotAllowedToken(asset))
    }

    /// Staleness-checked price of `asset`.
    pub(super) fn price_of(&self, asset: AssetId) -> Result<Price, EngineError> {
        let feed = self
            .feeds
            .get(&asset)
            .ok_or(EngineError::NotAllowedToken(asset))?;
        Ok(fresh_price(
            feed.as_ref(),
            self.current_time,
            self.config.protocol.price_timeout_secs,
        )?)
    }

    pub(super) fn require_allowed(&self, asset: AssetId) -> Result<(), EngineError> {
        if self.ledger.registry().is_allowed(asset) {
            Ok(())
        } else {
            Err(EngineError::NotAllowedToken(asset))
        }
    }

    pub(super) fn assert_solvent(&self, account: AccountId) -> Result<(), EngineError> {
        let health_factor = self.get_health_factor(account)?;
        if self.is_below_minimum(health_factor) {
            return Err(EngineError::HealthFactorBroken {
                account,
                health_factor,
            });
        }
        Ok(())
    }

    pub(super) fn is_below_minimum(&self, health_factor: HealthFactor) -> bool {
        health_factor.is_below(self.config.protocol.min_health_factor)
    }
}

pub(super) fn require_positive(amount: Amount) -> Result<(), EngineError> {
    if amount.is_zero() {
        return Err(EngineError::NeedsMoreThanZero);
    }
    Ok(())
}
