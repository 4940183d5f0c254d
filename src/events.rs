// 11.0: every committed state change produces an event. used for audit trails and
// notifying external systems, never for control flow. events of a failed action
// are discarded together with its ledger changes.

use crate::health::HealthFactor;
use crate::types::{AccountId, Amount, AssetId, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPayload {
    // Collateral events
    CollateralDeposited(CollateralDepositedEvent),
    CollateralRedeemed(CollateralRedeemedEvent),

    // Debt events
    DscMinted(DscMintedEvent),
    DscBurned(DscBurnedEvent),

    // Risk events
    Liquidation(LiquidationEvent),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralDepositedEvent {
    pub account_id: AccountId,
    pub asset: AssetId,
    pub amount: Amount,
}

/// `from` is the position debited, `to` the wallet receiving the collateral.
/// they differ only for liquidations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralRedeemedEvent {
    pub from: AccountId,
    pub to: AccountId,
    pub asset: AssetId,
    pub amount: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DscMintedEvent {
    pub account_id: AccountId,
    pub amount: Amount,
    pub new_debt: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DscBurnedEvent {
    pub on_behalf_of: AccountId,
    pub payer: AccountId,
    pub amount: Amount,
    pub new_debt: Amount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationEvent {
    pub account_id: AccountId,
    pub liquidator: AccountId,
    pub asset: AssetId,
    pub debt_covered: Amount,
    pub collateral_seized: Amount,
    pub bonus: Amount,
    pub health_factor_before: HealthFactor,
    pub health_factor_after: HealthFactor,
}

/// Position in the log to rewind to when an action fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMark {
    len: usize,
    next_id: u64,
}

/// Append-only log with bounded retention. trimming only happens on commit,
/// so a mark taken at the start of an action stays valid until it ends.
#[derive(Debug)]
pub struct EventLog {
    events: Vec<Event>,
    next_id: u64,
    max_events: usize,
}

impl EventLog {
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            next_id: 1,
            max_events,
        }
    }

    pub fn emit(&mut self, timestamp: Timestamp, payload: EventPayload) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;
        tracing::debug!(event_id = id.0, ?payload, "event emitted");
        self.events.push(Event::new(id, timestamp, payload));
        id
    }

    pub fn mark(&self) -> EventMark {
        EventMark {
            len: self.events.len(),
            next_id: self.next_id,
        }
    }

    /// Drop everything emitted since `mark`, ids included.
    pub fn rewind(&mut self, mark: EventMark) {
        self.events.truncate(mark.len);
        self.next_id = mark.next_id;
    }

    /// Enforce the retention cap, oldest first.
    pub fn trim(&mut self) {
        if self.events.len() > self.max_events {
            let drain_count = self.events.len() - self.max_events;
            self.events.drain(0..drain_count);
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn recent(&self, count: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(count);
        &self.events[start..]
    }
}
