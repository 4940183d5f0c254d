// synth-core: collateral-backed synthetic currency engine.
// risk-first architecture: every write is gated by the health factor.
// all computation is deterministic; collaborators sit behind traits.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: AccountId, AssetId, Amount (U256), Price, Timestamp
//   2.x  oracle.rs: price feed trait, staleness guard, mock feed
//   3.x  valuation.rs: collateral <-> value unit conversion
//   4.x  health.rs: health factor math
//   5.x  ledger.rs: collateral registry, positions, rollback journal
//   6.x  guard.rs: system-wide non-reentrant action lock
//   7.x  config.rs: protocol risk parameters
//   8.x  engine/: orchestrator: collateral, debt, liquidations, queries
//   9.1  settlement.rs: external interactions + compensation
//   9.2  tokens.rs: collateral/currency traits and mocks
//   11.x events.rs: state transition events for audit

// core modules
pub mod engine;
pub mod events;
pub mod health;
pub mod ledger;
pub mod types;
pub mod valuation;

// risk and safety modules
pub mod guard;
pub mod oracle;

// integration modules
pub mod config;
pub mod settlement;
pub mod tokens;

// re exports for convenience
pub use engine::*;
pub use events::*;
pub use health::*;
pub use ledger::{CollateralRegistry, Ledger, LedgerError, Position};
pub use types::*;
pub use config::{ConfigError, ProtocolParams};
pub use guard::{ActionGuard, ActionLock, ReentrancyError};
pub use oracle::{fresh_price, stale_checked_round, FeedError, MockPriceFeed, OracleError, PriceFeed, RoundData};
pub use settlement::{Interaction, InteractionLog};
pub use tokens::{CollateralToken, MockCurrency, MockToken, SyntheticCurrency};
