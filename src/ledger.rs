//! Collateral ledger.
//!
//! Per-account collateral balances per asset, per-account debt, and the
//! registry of accepted collateral. Positions are created implicitly on first
//! credit and dropped once they hold nothing, so an emptied account looks
//! exactly like one that was never used.
//!
//! While an action is in flight every mutation is journaled; `rollback`
//! replays the journal backwards so a failed action leaves no trace.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::{AccountId, Amount, AssetId, FeedId, MathError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("{0} is not an accepted collateral asset")]
    UnknownAsset(AssetId),

    #[error("{0} registered twice")]
    DuplicateCollateral(AssetId),

    #[error(transparent)]
    Math(#[from] MathError),
}

/// Accepted collateral and its feed binding. insertion-ordered, append-only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollateralRegistry {
    assets: Vec<AssetId>,
    feeds: HashMap<AssetId, FeedId>,
}

impl CollateralRegistry {
    pub fn new(bindings: impl IntoIterator<Item = (AssetId, FeedId)>) -> Result<Self, LedgerError> {
        let mut registry = Self::default();
        for (asset, feed) in bindings {
            if registry.feeds.insert(asset, feed).is_some() {
                return Err(LedgerError::DuplicateCollateral(asset));
            }
            registry.assets.push(asset);
        }
        Ok(registry)
    }

    pub fn is_allowed(&self, asset: AssetId) -> bool {
        self.feeds.contains_key(&asset)
    }

    pub fn feed_of(&self, asset: AssetId) -> Option<FeedId> {
        self.feeds.get(&asset).copied()
    }

    pub fn assets(&self) -> &[AssetId] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// One account's collateral and minted debt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    collateral: HashMap<AssetId, Amount>,
    debt: Amount,
}

impl Position {
    pub fn collateral_of(&self, asset: AssetId) -> Amount {
        self.collateral.get(&asset).copied().unwrap_or_default()
    }

    pub fn debt(&self) -> Amount {
        self.debt
    }

    pub fn is_empty(&self) -> bool {
        self.collateral.is_empty() && self.debt.is_zero()
    }

    fn set_collateral(&mut self, asset: AssetId, amount: Amount) {
        if amount.is_zero() {
            self.collateral.remove(&asset);
        } else {
            self.collateral.insert(asset, amount);
        }
    }
}

#[derive(Debug, Clone)]
enum UndoEntry {
    Collateral {
        account: AccountId,
        asset: AssetId,
        previous: Amount,
    },
    Debt {
        account: AccountId,
        previous: Amount,
    },
}

#[derive(Debug, Clone)]
pub struct Ledger {
    registry: CollateralRegistry,
    positions: HashMap<AccountId, Position>,
    journal: Option<Vec<UndoEntry>>,
}

impl Ledger {
    pub fn new(registry: CollateralRegistry) -> Self {
        Self {
            registry,
            positions: HashMap::new(),
            journal: None,
        }
    }

    pub fn registry(&self) -> &CollateralRegistry {
        &self.registry
    }

    pub fn position(&self, account: AccountId) -> Option<&Position> {
        self.positions.get(&account)
    }

    pub fn positions(&self) -> impl Iterator<Item = (&AccountId, &Position)> {
        self.positions.iter()
    }

    pub fn collateral_balance(&self, account: AccountId, asset: AssetId) -> Amount {
        self.positions
            .get(&account)
            .map(|p| p.collateral_of(asset))
            .unwrap_or_default()
    }

    pub fn debt(&self, account: AccountId) -> Amount {
        self.positions.get(&account).map(|p| p.debt).unwrap_or_default()
    }

    /// Sum of every account's debt. equals the currency's supply when all
    /// minting and burning goes through the engine.
    pub fn total_debt(&self) -> Result<Amount, MathError> {
        self.positions
            .values()
            .try_fold(Amount::ZERO, |acc, p| acc.checked_add(p.debt))
    }

    /// Sum of one asset's balances across all accounts.
    pub fn total_collateral(&self, asset: AssetId) -> Result<Amount, MathError> {
        self.positions
            .values()
            .try_fold(Amount::ZERO, |acc, p| acc.checked_add(p.collateral_of(asset)))
    }

    pub fn credit_collateral(&mut self, account: AccountId, asset: AssetId, amount: Amount) -> Result<Amount, LedgerError> {
        self.require_allowed(asset)?;
        let previous = self.collateral_balance(account, asset);
        let updated = previous.checked_add(amount)?;
        self.write_collateral(account, asset, previous, updated);
        Ok(updated)
    }

    /// Underflow (insufficient balance) is an arithmetic fault.
    pub fn debit_collateral(&mut self, account: AccountId, asset: AssetId, amount: Amount) -> Result<Amount, LedgerError> {
        self.require_allowed(asset)?;
        let previous = self.collateral_balance(account, asset);
        let updated = previous.checked_sub(amount)?;
        self.write_collateral(account, asset, previous, updated);
        Ok(updated)
    }

    pub fn increase_debt(&mut self, account: AccountId, amount: Amount) -> Result<Amount, LedgerError> {
        let previous = self.debt(account);
        let updated = previous.checked_add(amount)?;
        self.write_debt(account, previous, updated);
        Ok(updated)
    }

    pub fn decrease_debt(&mut self, account: AccountId, amount: Amount) -> Result<Amount, LedgerError> {
        let previous = self.debt(account);
        let updated = previous.checked_sub(amount)?;
        self.write_debt(account, previous, updated);
        Ok(updated)
    }

    /// Start journaling. one action at a time.
    pub fn begin(&mut self) {
        debug_assert!(self.journal.is_none(), "ledger action already open");
        self.journal = Some(Vec::new());
    }

    pub fn commit(&mut self) {
        self.journal = None;
    }

    /// Undo everything since `begin`, newest first.
    pub fn rollback(&mut self) {
        let Some(journal) = self.journal.take() else {
            return;
        };
        for entry in journal.into_iter().rev() {
            match entry {
                UndoEntry::Collateral { account, asset, previous } => {
                    self.positions.entry(account).or_default().set_collateral(asset, previous);
                    self.prune(account);
                }
                UndoEntry::Debt { account, previous } => {
                    self.positions.entry(account).or_default().debt = previous;
                    self.prune(account);
                }
            }
        }
    }

    fn require_allowed(&self, asset: AssetId) -> Result<(), LedgerError> {
        if self.registry.is_allowed(asset) {
            Ok(())
        } else {
            Err(LedgerError::UnknownAsset(asset))
        }
    }

    fn write_collateral(&mut self, account: AccountId, asset: AssetId, previous: Amount, updated: Amount) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(UndoEntry::Collateral { account, asset, previous });
        }
        self.positions.entry(account).or_default().set_collateral(asset, updated);
        self.prune(account);
    }

    fn write_debt(&mut self, account: AccountId, previous: Amount, updated: Amount) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(UndoEntry::Debt { account, previous });
        }
        self.positions.entry(account).or_default().debt = updated;
        self.prune(account);
    }

    fn prune(&mut self, account: AccountId) {
        if self.positions.get(&account).is_some_and(Position::is_empty) {
            self.positions.remove(&account);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ETH: AssetId = AssetId(1);
    const BTC: AssetId = AssetId(2);
    const ALICE: AccountId = AccountId(1);

    fn ledger() -> Ledger {
        let registry = CollateralRegistry::new([(ETH, FeedId(10)), (BTC, FeedId(20))]).unwrap();
        Ledger::new(registry)
    }

    #[test]
    fn registry_keeps_insertion_order() {
        let registry = CollateralRegistry::new([(BTC, FeedId(20)), (ETH, FeedId(10))]).unwrap();
        assert_eq!(registry.assets(), &[BTC, ETH]);
        assert_eq!(registry.feed_of(ETH), Some(FeedId(10)));
        assert_eq!(registry.feed_of(AssetId(9)), None);
    }

    #[test]
    fn registry_rejects_duplicates() {
        let result = CollateralRegistry::new([(ETH, FeedId(10)), (ETH, FeedId(11))]);
        assert_eq!(result.unwrap_err(), LedgerError::DuplicateCollateral(ETH));
    }

    #[test]
    fn credit_and_debit_collateral() {
        let mut ledger = ledger();
        ledger.credit_collateral(ALICE, ETH, Amount::from_whole(10)).unwrap();
        let left = ledger.debit_collateral(ALICE, ETH, Amount::from_whole(4)).unwrap();

        assert_eq!(left, Amount::from_whole(6));
        assert_eq!(ledger.collateral_balance(ALICE, ETH), Amount::from_whole(6));
        assert_eq!(ledger.collateral_balance(ALICE, BTC), Amount::ZERO);
    }

    #[test]
    fn unregistered_asset_never_accepts_deposits() {
        let mut ledger = ledger();
        let result = ledger.credit_collateral(ALICE, AssetId(99), Amount::from_whole(1));
        assert_eq!(result, Err(LedgerError::UnknownAsset(AssetId(99))));
        assert!(ledger.position(ALICE).is_none());
    }

    #[test]
    fn overdraw_is_arithmetic_fault() {
        let mut ledger = ledger();
        ledger.credit_collateral(ALICE, ETH, Amount::from_whole(1)).unwrap();
        let result = ledger.debit_collateral(ALICE, ETH, Amount::from_whole(2));
        assert_eq!(result, Err(LedgerError::Math(MathError::Underflow)));

        let result = ledger.decrease_debt(ALICE, Amount::from_units(1));
        assert_eq!(result, Err(LedgerError::Math(MathError::Underflow)));
    }

    #[test]
    fn emptied_position_disappears() {
        let mut ledger = ledger();
        ledger.credit_collateral(ALICE, ETH, Amount::from_whole(1)).unwrap();
        ledger.increase_debt(ALICE, Amount::from_whole(1)).unwrap();
        ledger.decrease_debt(ALICE, Amount::from_whole(1)).unwrap();
        ledger.debit_collateral(ALICE, ETH, Amount::from_whole(1)).unwrap();

        assert!(ledger.position(ALICE).is_none());
        assert_eq!(ledger.positions().count(), 0);
    }

    #[test]
    fn rollback_restores_previous_state() {
        let mut ledger = ledger();
        ledger.credit_collateral(ALICE, ETH, Amount::from_whole(5)).unwrap();

        ledger.begin();
        ledger.credit_collateral(ALICE, ETH, Amount::from_whole(3)).unwrap();
        ledger.increase_debt(ALICE, Amount::from_whole(100)).unwrap();
        ledger.credit_collateral(AccountId(2), BTC, Amount::from_whole(1)).unwrap();
        ledger.rollback();

        assert_eq!(ledger.collateral_balance(ALICE, ETH), Amount::from_whole(5));
        assert_eq!(ledger.debt(ALICE), Amount::ZERO);
        assert!(ledger.position(AccountId(2)).is_none());

        // journal closed: later writes survive another rollback
        ledger.increase_debt(ALICE, Amount::from_whole(7)).unwrap();
        ledger.rollback();
        assert_eq!(ledger.debt(ALICE), Amount::from_whole(7));
    }

    #[test]
    fn commit_keeps_changes() {
        let mut ledger = ledger();
        ledger.begin();
        ledger.increase_debt(ALICE, Amount::from_whole(7)).unwrap();
        ledger.commit();
        ledger.rollback();

        assert_eq!(ledger.debt(ALICE), Amount::from_whole(7));
    }

    #[test]
    fn totals_across_accounts() {
        let mut ledger = ledger();
        ledger.increase_debt(ALICE, Amount::from_whole(7)).unwrap();
        ledger.increase_debt(AccountId(2), Amount::from_whole(3)).unwrap();
        ledger.credit_collateral(ALICE, ETH, Amount::from_whole(2)).unwrap();
        ledger.credit_collateral(AccountId(2), ETH, Amount::from_whole(1)).unwrap();

        assert_eq!(ledger.total_debt().unwrap(), Amount::from_whole(10));
        assert_eq!(ledger.total_collateral(ETH).unwrap(), Amount::from_whole(3));
    }
}
