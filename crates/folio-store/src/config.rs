use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for an archive backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// How long a transaction waits for an advisory lock before giving up.
    pub lock_timeout_ms: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 5_000,
        }
    }
}

impl ArchiveConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}
