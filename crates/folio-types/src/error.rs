use thiserror::Error;

/// Errors produced by type parsing and validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("invalid legacy id: {0}")]
    InvalidLegacyId(String),

    #[error("invalid version string: {0}")]
    InvalidVersion(String),

    #[error("unknown portal type: {0}")]
    UnknownPortalType(String),
}
