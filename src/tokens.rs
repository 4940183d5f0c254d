// 9.2 tokens.rs: external token interfaces the engine drives, plus in-memory mocks.
// every call reports success as a bool, the way fungible-token contracts do.
// the engine turns each `false` into its own named error.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::guard::ActionLock;
use crate::types::{AccountId, Amount};

/// An approved collateral asset. `transfer` always sends from the engine's own
/// custody; `transfer_from` pulls funds the owner approved to the engine.
pub trait CollateralToken: fmt::Debug {
    fn transfer_from(&mut self, from: AccountId, to: AccountId, amount: Amount) -> bool;

    fn transfer(&mut self, to: AccountId, amount: Amount) -> bool;

    fn balance_of(&self, account: AccountId) -> Amount;
}

/// The synthetic currency. the engine is its only minter and burner.
pub trait SyntheticCurrency: fmt::Debug {
    fn mint(&mut self, to: AccountId, amount: Amount) -> bool;

    /// Burns from the engine's own balance.
    fn burn(&mut self, amount: Amount) -> bool;

    fn transfer_from(&mut self, from: AccountId, to: AccountId, amount: Amount) -> bool;

    /// Sends from the engine's own balance.
    fn transfer(&mut self, to: AccountId, amount: Amount) -> bool;

    fn balance_of(&self, account: AccountId) -> Amount;

    fn total_supply(&self) -> Amount;
}

// shared book behind both mocks: balances, allowances toward the operator,
// failure switches and an optional re-entry attempt.
#[derive(Debug, Default)]
struct Book {
    balances: HashMap<AccountId, Amount>,
    allowances: HashMap<AccountId, Amount>,
    total_supply: Amount,
    fail_transfers: bool,
    fail_mint: bool,
    fail_burn: bool,
    reentry_lock: Option<ActionLock>,
    reentry_blocked: Vec<bool>,
}

impl Book {
    fn balance(&self, account: AccountId) -> Amount {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    fn credit(&mut self, account: AccountId, amount: Amount) -> bool {
        match self.balance(account).checked_add(amount) {
            Ok(updated) => {
                self.balances.insert(account, updated);
                true
            }
            Err(_) => false,
        }
    }

    fn move_funds(&mut self, from: AccountId, to: AccountId, amount: Amount) -> bool {
        let Ok(remaining) = self.balance(from).checked_sub(amount) else {
            return false;
        };
        if from == to {
            return true;
        }
        if self.balance(to).checked_add(amount).is_err() {
            return false;
        }
        self.balances.insert(from, remaining);
        self.credit(to, amount)
    }

    fn pull(&mut self, from: AccountId, to: AccountId, amount: Amount) -> bool {
        self.attempt_reentry();
        if self.fail_transfers {
            return false;
        }
        let allowance = self.allowances.get(&from).copied().unwrap_or_default();
        let Ok(left) = allowance.checked_sub(amount) else {
            return false;
        };
        if !self.move_funds(from, to, amount) {
            return false;
        }
        self.allowances.insert(from, left);
        true
    }

    // a nested engine action attempted from inside a token callback
    fn attempt_reentry(&mut self) {
        if let Some(lock) = &self.reentry_lock {
            let blocked = lock.acquire().is_err();
            self.reentry_blocked.push(blocked);
        }
    }
}

#[derive(Debug, Clone)]
struct SharedBook(Arc<Mutex<Book>>);

impl SharedBook {
    fn new() -> Self {
        Self(Arc::new(Mutex::new(Book::default())))
    }

    fn lock(&self) -> MutexGuard<'_, Book> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-memory collateral token. clones share balances.
#[derive(Debug, Clone)]
pub struct MockToken {
    operator: AccountId,
    book: SharedBook,
}

impl MockToken {
    /// `operator` is the account the engine acts as.
    pub fn new(operator: AccountId) -> Self {
        Self {
            operator,
            book: SharedBook::new(),
        }
    }

    /// Faucet: create tokens out of thin air for `account`.
    pub fn mint_to(&self, account: AccountId, amount: Amount) {
        let mut book = self.book.lock();
        if book.credit(account, amount) {
            book.total_supply = book.total_supply.checked_add(amount).unwrap_or(Amount::MAX);
        }
    }

    /// `owner` lets the operator pull up to `amount`.
    pub fn approve(&self, owner: AccountId, amount: Amount) {
        self.book.lock().allowances.insert(owner, amount);
    }

    pub fn allowance(&self, owner: AccountId) -> Amount {
        self.book.lock().allowances.get(&owner).copied().unwrap_or_default()
    }

    pub fn balance_of(&self, account: AccountId) -> Amount {
        self.book.lock().balance(account)
    }

    pub fn total_supply(&self) -> Amount {
        self.book.lock().total_supply
    }

    pub fn set_fail_transfers(&self, fail: bool) {
        self.book.lock().fail_transfers = fail;
    }

    /// Every later transfer attempts to take `lock`, as a malicious callback would.
    pub fn reenter_on_calls(&self, lock: ActionLock) {
        self.book.lock().reentry_lock = Some(lock);
    }

    /// One entry per call made since `reenter_on_calls`: `true` when the nested attempt was blocked.
    pub fn reentry_attempts(&self) -> Vec<bool> {
        self.book.lock().reentry_blocked.clone()
    }
}

impl CollateralToken for MockToken {
    fn transfer_from(&mut self, from: AccountId, to: AccountId, amount: Amount) -> bool {
        self.book.lock().pull(from, to, amount)
    }

    fn transfer(&mut self, to: AccountId, amount: Amount) -> bool {
        let mut book = self.book.lock();
        book.attempt_reentry();
        if book.fail_transfers {
            return false;
        }
        book.move_funds(self.operator, to, amount)
    }

    fn balance_of(&self, account: AccountId) -> Amount {
        MockToken::balance_of(self, account)
    }
}

/// In-memory synthetic currency with the engine as minter. clones share state.
#[derive(Debug, Clone)]
pub struct MockCurrency {
    minter: AccountId,
    book: SharedBook,
}

impl MockCurrency {
    pub fn new(minter: AccountId) -> Self {
        Self {
            minter,
            book: SharedBook::new(),
        }
    }

    pub fn approve(&self, owner: AccountId, amount: Amount) {
        self.book.lock().allowances.insert(owner, amount);
    }

    /// Holder-to-holder transfer, e.g. a liquidator buying currency on the market.
    pub fn send(&self, from: AccountId, to: AccountId, amount: Amount) -> bool {
        self.book.lock().move_funds(from, to, amount)
    }

    pub fn balance_of(&self, account: AccountId) -> Amount {
        self.book.lock().balance(account)
    }

    pub fn total_supply(&self) -> Amount {
        self.book.lock().total_supply
    }

    pub fn set_fail_mint(&self, fail: bool) {
        self.book.lock().fail_mint = fail;
    }

    pub fn set_fail_burn(&self, fail: bool) {
        self.book.lock().fail_burn = fail;
    }

    pub fn set_fail_transfers(&self, fail: bool) {
        self.book.lock().fail_transfers = fail;
    }

    /// Mint, burn and transfers attempt to take `lock` before doing anything.
    pub fn reenter_on_calls(&self, lock: ActionLock) {
        self.book.lock().reentry_lock = Some(lock);
    }

    pub fn reentry_attempts(&self) -> Vec<bool> {
        self.book.lock().reentry_blocked.clone()
    }
}

impl SyntheticCurrency for MockCurrency {
    fn mint(&mut self, to: AccountId, amount: Amount) -> bool {
        let mut book = self.book.lock();
        book.attempt_reentry();
        if book.fail_mint || amount.is_zero() {
            return false;
        }
        let Ok(supply) = book.total_supply.checked_add(amount) else {
            return false;
        };
        if !book.credit(to, amount) {
            return false;
        }
        book.total_supply = supply;
        true
    }

    fn burn(&mut self, amount: Amount) -> bool {
        let mut book = self.book.lock();
        book.attempt_reentry();
        if book.fail_burn || amount.is_zero() {
            return false;
        }
        let Ok(remaining) = book.balance(self.minter).checked_sub(amount) else {
            return false;
        };
        let Ok(supply) = book.total_supply.checked_sub(amount) else {
            return false;
        };
        book.balances.insert(self.minter, remaining);
        book.total_supply = supply;
        true
    }

    fn transfer_from(&mut self, from: AccountId, to: AccountId, amount: Amount) -> bool {
        self.book.lock().pull(from, to, amount)
    }

    fn transfer(&mut self, to: AccountId, amount: Amount) -> bool {
        let mut book = self.book.lock();
        book.attempt_reentry();
        if book.fail_transfers {
            return false;
        }
        book.move_funds(self.minter, to, amount)
    }

    fn balance_of(&self, account: AccountId) -> Amount {
        MockCurrency::balance_of(self, account)
    }

    fn total_supply(&self) -> Amount {
        MockCurrency::total_supply(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENGINE: AccountId = AccountId(1000);
    const ALICE: AccountId = AccountId(1);
    const BOB: AccountId = AccountId(2);

    fn units(n: u64) -> Amount {
        Amount::from_whole(n)
    }

    #[test]
    fn test_pull_requires_allowance() {
        let mut token = MockToken::new(ENGINE);
        token.mint_to(ALICE, units(10));

        assert!(!CollateralToken::transfer_from(&mut token, ALICE, ENGINE, units(5)));

        token.approve(ALICE, units(5));
        assert!(CollateralToken::transfer_from(&mut token, ALICE, ENGINE, units(5)));
        assert_eq!(token.balance_of(ENGINE), units(5));
        assert_eq!(token.allowance(ALICE), Amount::ZERO);
    }

    #[test]
    fn test_pull_fails_on_insufficient_balance_without_side_effects() {
        let mut token = MockToken::new(ENGINE);
        token.mint_to(ALICE, units(1));
        token.approve(ALICE, units(5));

        assert!(!CollateralToken::transfer_from(&mut token, ALICE, ENGINE, units(5)));
        assert_eq!(token.allowance(ALICE), units(5));
        assert_eq!(token.balance_of(ALICE), units(1));
    }

    #[test]
    fn test_push_from_operator() {
        let mut token = MockToken::new(ENGINE);
        token.mint_to(ENGINE, units(3));

        assert!(token.transfer(BOB, units(2)));
        assert!(!token.transfer(BOB, units(2)));
        assert_eq!(token.balance_of(BOB), units(2));
    }

    #[test]
    fn test_failure_switch() {
        let mut token = MockToken::new(ENGINE);
        token.mint_to(ENGINE, units(3));
        token.set_fail_transfers(true);
        assert!(!token.transfer(BOB, units(1)));
        assert_eq!(token.balance_of(ENGINE), units(3));
    }

    #[test]
    fn test_reentry_attempts_are_recorded() {
        let lock = ActionLock::new();
        let mut token = MockToken::new(ENGINE);
        token.mint_to(ENGINE, units(3));
        token.reenter_on_calls(lock.clone());

        {
            let _guard = lock.acquire().unwrap();
            assert!(token.transfer(BOB, units(1)));
        }
        assert!(token.transfer(BOB, units(1)));

        assert_eq!(token.reentry_attempts(), vec![true, false]);
    }

    #[test]
    fn test_currency_mint_and_burn_track_supply() {
        let mut dsc = MockCurrency::new(ENGINE);
        assert!(dsc.mint(ALICE, units(100)));
        assert_eq!(dsc.total_supply(), units(100));

        dsc.approve(ALICE, units(40));
        assert!(SyntheticCurrency::transfer_from(&mut dsc, ALICE, ENGINE, units(40)));
        assert!(dsc.burn(units(40)));

        assert_eq!(dsc.total_supply(), units(60));
        assert_eq!(dsc.balance_of(ALICE), units(60));
        assert_eq!(dsc.balance_of(ENGINE), Amount::ZERO);
    }

    #[test]
    fn test_currency_burn_needs_engine_balance() {
        let mut dsc = MockCurrency::new(ENGINE);
        assert!(dsc.mint(ALICE, units(1)));
        assert!(!dsc.burn(units(1)));
        assert_eq!(dsc.total_supply(), units(1));
    }

    #[test]
    fn test_currency_calls_attempt_reentry() {
        let lock = ActionLock::new();
        let mut dsc = MockCurrency::new(ENGINE);
        dsc.reenter_on_calls(lock.clone());

        let _guard = lock.acquire().unwrap();
        assert!(dsc.mint(ENGINE, units(2)));
        assert!(dsc.transfer(ALICE, units(1)));
        assert!(dsc.burn(units(1)));

        assert_eq!(dsc.reentry_attempts(), vec![true, true, true]);
    }

    #[test]
    fn test_currency_failure_switches() {
        let mut dsc = MockCurrency::new(ENGINE);
        dsc.set_fail_mint(true);
        assert!(!dsc.mint(ALICE, units(1)));
        assert_eq!(dsc.total_supply(), Amount::ZERO);
    }
}
