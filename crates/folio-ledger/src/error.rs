use folio_store::StoreError;

/// Errors produced by allocation and document access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// A lookup the caller requires to succeed found nothing.
    #[error("not found: {0}")]
    NotFound(String),

    /// A structural rule would be broken (duplicate version, id collision).
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// Another publication raced this one; the whole transaction may be retried.
    #[error("concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    #[error("invalid version: {0}")]
    InvalidVersion(String),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl LedgerError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrencyConflict(_))
    }
}

impl From<StoreError> for LedgerError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation { .. } | StoreError::DanglingReference { .. } => {
                Self::InvariantViolation(e.to_string())
            }
            StoreError::SerializationConflict(_) | StoreError::LockTimeout(_) => {
                Self::ConcurrencyConflict(e.to_string())
            }
            StoreError::LockPoisoned(_) => Self::Store(e),
        }
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
