//! Engine configuration options.

use serde::{Deserialize, Serialize};

use crate::config::ProtocolParams;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Risk parameters fixed for the engine's lifetime.
    pub protocol: ProtocolParams,
    /// Maximum number of events to retain in memory.
    pub max_events: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            protocol: ProtocolParams::default(),
            max_events: 100_000,
        }
    }
}
