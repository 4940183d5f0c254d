// System-wide non-reentrant lock for the write surface.
// one flag for the whole engine, not per account. released on drop so every
// exit path, early `?` returns included, frees it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("re-entrant call: another action is in progress")]
pub struct ReentrancyError;

/// Shared handle to the lock. clones observe and contend for the same flag.
#[derive(Debug, Clone, Default)]
pub struct ActionLock {
    held: Arc<AtomicBool>,
}

impl ActionLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self) -> Result<ActionGuard, ReentrancyError> {
        self.held
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| ReentrancyError)?;
        Ok(ActionGuard {
            held: Arc::clone(&self.held),
        })
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// Proof the lock is held. dropping it releases the lock.
#[derive(Debug)]
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct ActionGuard {
    held: Arc<AtomicBool>,
}

impl Drop for ActionGuard {
    fn drop(&mut self) {
        self.held.store(false, Ordering::Release);
    }
}
