// 8.0: operation orchestrator. every write runs under the action lock inside
// one atomic scope: ledger effects, solvency checks, then external calls.
// read-only queries take no lock.

mod collateral;
mod config;
mod core;
mod debt;
mod liquidations;
mod queries;
mod results;

pub use config::EngineConfig;
pub use core::Engine;
pub use results::{AccountInformation, EngineError, LiquidationResult};
