use folio_ledger::LedgerError;
use folio_store::StoreError;

/// Errors raised while canonicalizing a publication event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShimError {
    /// The event contradicts itself or the archive, e.g. a legacy id of the
    /// wrong portal type or a major version that disagrees with the legacy
    /// version string.
    #[error("invalid publication event: {0}")]
    InvalidEvent(String),

    /// A stage ran before the field it depends on was filled in.
    #[error("stage '{stage}' requires {field}")]
    MissingField {
        stage: &'static str,
        field: &'static str,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ShimError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Ledger(e) if e.is_retryable())
    }
}

impl From<StoreError> for ShimError {
    fn from(e: StoreError) -> Self {
        Self::Ledger(e.into())
    }
}

pub type ShimResult<T> = Result<T, ShimError>;
