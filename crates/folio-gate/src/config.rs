use serde::{Deserialize, Serialize};

/// Which optional shim stages run.
///
/// Identity, legacy-id and version defaulting always run: without them the
/// event cannot become a version row. Directory and ACL upserts can be
/// switched off for archives that manage users elsewhere.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShimConfig {
    /// Upsert user directory entries for every referenced username.
    pub directory: bool,
    /// Grant publish rights to authors and maintainers.
    pub acl: bool,
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            directory: true,
            acl: true,
        }
    }
}

impl ShimConfig {
    /// Only the stages needed to produce a canonical event.
    pub fn minimal() -> Self {
        Self {
            directory: false,
            acl: false,
        }
    }
}
