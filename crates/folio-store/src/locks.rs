use std::collections::HashSet;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use folio_types::DocumentIdentity;
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Advisory locks keyed by document identity.
///
/// A lock is either free or held by exactly one holder; waiters block on a
/// condition variable until it is released or their timeout expires. The
/// table does not track who holds a lock, so callers must release exactly
/// the locks they acquired.
#[derive(Debug, Default)]
pub struct AdvisoryLocks {
    held: Mutex<HashSet<DocumentIdentity>>,
    released: Condvar,
}

impl AdvisoryLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the lock for `identity` is free, then take it.
    pub fn acquire(&self, identity: DocumentIdentity, timeout: Duration) -> StoreResult<()> {
        let deadline = Instant::now() + timeout;
        let mut held = self
            .held
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;

        while held.contains(&identity) {
            let now = Instant::now();
            if now >= deadline {
                return Err(StoreError::LockTimeout(identity));
            }
            let (guard, _) = self
                .released
                .wait_timeout(held, deadline - now)
                .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
            held = guard;
        }

        held.insert(identity);
        debug!(identity = %identity, "advisory lock acquired");
        Ok(())
    }

    /// Take the lock only if it is free right now.
    pub fn try_acquire(&self, identity: DocumentIdentity) -> StoreResult<bool> {
        let mut held = self
            .held
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(held.insert(identity))
    }

    /// Release the lock for `identity` and wake any waiters.
    pub fn release(&self, identity: &DocumentIdentity) {
        // Runs from Drop; tolerate poisoning.
        let mut held = match self.held.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if held.remove(identity) {
            debug!(identity = %identity, "advisory lock released");
        }
        drop(held);
        self.released.notify_all();
    }

    pub fn is_held(&self, identity: &DocumentIdentity) -> bool {
        match self.held.lock() {
            Ok(held) => held.contains(identity),
            Err(poisoned) => poisoned.into_inner().contains(identity),
        }
    }
}
