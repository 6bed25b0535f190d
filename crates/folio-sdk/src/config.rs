use folio_gate::ShimConfig;
use folio_store::ArchiveConfig;
use serde::{Deserialize, Serialize};

use crate::error::SdkResult;

/// Configuration for a [`crate::Publisher`].
///
/// ```toml
/// max_conflict_retries = 5
/// cascade_enabled = true
///
/// [shims]
/// directory = false
///
/// [archive]
/// lock_timeout_ms = 2000
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// How many times a publication that lost a race is retried from
    /// scratch before the conflict is reported.
    pub max_conflict_retries: u32,
    /// Run the republish cascade after leaf-document publications.
    pub cascade_enabled: bool,
    pub shims: ShimConfig,
    pub archive: ArchiveConfig,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: 3,
            cascade_enabled: true,
            shims: ShimConfig::default(),
            archive: ArchiveConfig::default(),
        }
    }
}

impl PublisherConfig {
    pub fn from_toml_str(s: &str) -> SdkResult<Self> {
        Ok(toml::from_str(s)?)
    }
}
