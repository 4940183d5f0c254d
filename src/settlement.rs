// 9.1 settlement.rs: external interactions of one action, run after the ledger
// is updated and every check has passed. completed steps are journaled so a
// later failure can hand back what was already moved, newest first.

use serde::{Deserialize, Serialize};

use crate::types::{AccountId, Amount, AssetId};

/// One call into an external token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Interaction {
    // collateral owner -> engine custody
    PullCollateral {
        asset: AssetId,
        from: AccountId,
        amount: Amount,
    },

    // engine custody -> recipient
    PushCollateral {
        asset: AssetId,
        to: AccountId,
        amount: Amount,
    },

    // currency holder -> engine
    PullCurrency { from: AccountId, amount: Amount },

    // engine -> currency holder
    PushCurrency { to: AccountId, amount: Amount },

    // destroy currency held by the engine
    BurnCurrency { amount: Amount },

    // create currency for a borrower
    MintCurrency { to: AccountId, amount: Amount },
}

impl Interaction {
    /// The call that undoes this one. minting is only ever the final step of
    /// an action, so it never needs undoing.
    pub fn inverse(&self, engine: AccountId) -> Option<Interaction> {
        match *self {
            Interaction::PullCollateral { asset, from, amount } => Some(Interaction::PushCollateral {
                asset,
                to: from,
                amount,
            }),
            Interaction::PushCollateral { asset, to, amount } => Some(Interaction::PullCollateral {
                asset,
                from: to,
                amount,
            }),
            Interaction::PullCurrency { from, amount } => Some(Interaction::PushCurrency { to: from, amount }),
            Interaction::PushCurrency { to, amount } => Some(Interaction::PullCurrency { from: to, amount }),
            Interaction::BurnCurrency { amount } => Some(Interaction::MintCurrency { to: engine, amount }),
            Interaction::MintCurrency { .. } => None,
        }
    }
}

/// Steps of the current action that already went through.
#[derive(Debug, Clone, Default)]
pub struct InteractionLog {
    completed: Vec<Interaction>,
}

impl InteractionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, step: Interaction) {
        self.completed.push(step);
    }

    pub fn len(&self) -> usize {
        self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }

    /// Inverse calls in the order they must run.
    pub fn compensations(self, engine: AccountId) -> Vec<Interaction> {
        self.completed
            .into_iter()
            .rev()
            .filter_map(|step| step.inverse(engine))
            .collect()
    }
}
