use folio_ledger::LedgerError;
use folio_store::StoreError;
use folio_tree::TreeError;

/// Errors raised while cascading a republication. Any error aborts the
/// whole batch; the caller rolls the transaction back.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepublishError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl RepublishError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Tree(e) => e.is_retryable(),
            Self::Ledger(e) => e.is_retryable(),
        }
    }

    /// A row the cascade needed was missing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Tree(TreeError::NotFound(_))
                | Self::Tree(TreeError::Ledger(LedgerError::NotFound(_)))
                | Self::Ledger(LedgerError::NotFound(_))
        )
    }
}

impl From<StoreError> for RepublishError {
    fn from(e: StoreError) -> Self {
        Self::Ledger(e.into())
    }
}

pub type RepublishResult<T> = Result<T, RepublishError>;
