// Price feed integration and the staleness guard.
//
// The engine never reads a feed directly: every price passes through
// `fresh_price`, which rejects rounds older than the protocol timeout. There is
// no retry and no fallback source. A stale feed freezes every action that
// needs it instead of letting the engine act on suspect data.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::types::{FeedId, Price, Timestamp};

/// One round as reported by a feed. consumed transiently, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundData {
    pub round_id: u128,
    /// Signed, as feeds report it. non-positive answers are rejected downstream.
    pub answer: i128,
    pub started_at: Timestamp,
    pub updated_at: Timestamp,
    pub answered_in_round: u128,
}

/// Errors raised by a feed adapter itself (transport, decoding, ...).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeedError {
    #[error("feed unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Errors from guarded price reads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("stale price on {feed}: updated {elapsed_secs}s ago, timeout {timeout_secs}s")]
    StalePrice {
        feed: FeedId,
        updated_at: Timestamp,
        elapsed_secs: u64,
        timeout_secs: u64,
    },

    #[error("round on {feed} updated at {updated_at:?}, after current time {now:?}")]
    InvalidRound {
        feed: FeedId,
        updated_at: Timestamp,
        now: Timestamp,
    },

    #[error("non-positive price {answer} on {feed}")]
    InvalidPrice { feed: FeedId, answer: i128 },

    #[error("{feed} read failed: {source}")]
    Feed {
        feed: FeedId,
        #[source]
        source: FeedError,
    },
}

/// Anything that can answer "latest round" for one asset.
pub trait PriceFeed: fmt::Debug {
    fn feed_id(&self) -> FeedId;

    /// Native decimals of `RoundData::answer` (8 for USD pairs).
    fn decimals(&self) -> u8;

    fn latest_round_data(&self) -> Result<RoundData, FeedError>;
}

/// Latest round of `feed`, rejected if older than `timeout_secs` at `now`.
pub fn stale_checked_round(
    feed: &dyn PriceFeed,
    now: Timestamp,
    timeout_secs: u64,
) -> Result<RoundData, OracleError> {
    let feed_id = feed.feed_id();
    let round = feed
        .latest_round_data()
        .map_err(|source| OracleError::Feed { feed: feed_id, source })?;

    let elapsed_secs = now
        .secs_since(round.updated_at)
        .ok_or(OracleError::InvalidRound {
            feed: feed_id,
            updated_at: round.updated_at,
            now,
        })?;

    if elapsed_secs > timeout_secs {
        return Err(OracleError::StalePrice {
            feed: feed_id,
            updated_at: round.updated_at,
            elapsed_secs,
            timeout_secs,
        });
    }

    Ok(round)
}

/// Fresh, positive price of `feed` with its native decimals attached.
pub fn fresh_price(
    feed: &dyn PriceFeed,
    now: Timestamp,
    timeout_secs: u64,
) -> Result<Price, OracleError> {
    let round = stale_checked_round(feed, now, timeout_secs)?;
    Price::new(round.answer, feed.decimals()).ok_or(OracleError::InvalidPrice {
        feed: feed.feed_id(),
        answer: round.answer,
    })
}

#[derive(Debug)]
struct MockFeedState {
    round: RoundData,
    unavailable: bool,
}

/// In-memory feed for tests and simulations. clones share state, so a test
/// keeps one handle and moves price while the engine holds the other.
#[derive(Debug, Clone)]
pub struct MockPriceFeed {
    feed_id: FeedId,
    decimals: u8,
    state: Arc<Mutex<MockFeedState>>,
}

impl MockPriceFeed {
    pub fn new(feed_id: FeedId, decimals: u8, answer: i128, updated_at: Timestamp) -> Self {
        let round = RoundData {
            round_id: 1,
            answer,
            started_at: updated_at,
            updated_at,
            answered_in_round: 1,
        };
        Self {
            feed_id,
            decimals,
            state: Arc::new(Mutex::new(MockFeedState {
                round,
                unavailable: false,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockFeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publish a new round.
    pub fn update(&self, answer: i128, at: Timestamp) {
        let mut state = self.state();
        let next_round = state.round.round_id + 1;
        state.round = RoundData {
            round_id: next_round,
            answer,
            started_at: at,
            updated_at: at,
            answered_in_round: next_round,
        };
    }

    /// Change the answer without touching timestamps.
    pub fn set_answer(&self, answer: i128) {
        self.state().round.answer = answer;
    }

    pub fn set_updated_at(&self, at: Timestamp) {
        let mut state = self.state();
        state.round.started_at = at;
        state.round.updated_at = at;
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    pub fn round(&self) -> RoundData {
        self.state().round
    }
}

impl PriceFeed for MockPriceFeed {
    fn feed_id(&self) -> FeedId {
        self.feed_id
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn latest_round_data(&self) -> Result<RoundData, FeedError> {
        let state = self.state();
        if state.unavailable {
            return Err(FeedError::Unavailable {
                reason: "mock feed switched off".to_string(),
            });
        }
        Ok(state.round)
    }
}
