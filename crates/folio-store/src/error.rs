use folio_types::DocumentIdentity;

/// Errors from storage operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("duplicate {table} row: {detail}")]
    UniqueViolation { table: &'static str, detail: String },

    /// A foreign-key style reference points at a row that does not exist.
    #[error("{table} row references missing {target}")]
    DanglingReference { table: &'static str, target: String },

    /// A concurrent commit invalidated this transaction's writes.
    #[error("serialization conflict: {0}")]
    SerializationConflict(String),

    /// Another transaction held the advisory lock for too long.
    #[error("timed out waiting for advisory lock on {0}")]
    LockTimeout(DocumentIdentity),

    /// An internal lock was poisoned by a panicking thread.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

impl StoreError {
    /// Whether re-running the whole transaction may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SerializationConflict(_) | Self::LockTimeout(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
