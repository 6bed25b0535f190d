use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("configuration error: {0}")]
    Config(String),

    /// The shim pipeline finished without filling in a required field.
    #[error("publication event is missing {0} after shims ran")]
    IncompleteEvent(&'static str),

    #[error("store error: {0}")]
    Store(#[from] folio_store::StoreError),

    #[error("ledger error: {0}")]
    Ledger(#[from] folio_ledger::LedgerError),

    #[error("tree error: {0}")]
    Tree(#[from] folio_tree::TreeError),

    #[error("shim error: {0}")]
    Shim(#[from] folio_gate::ShimError),

    #[error("republish error: {0}")]
    Republish(#[from] folio_republish::RepublishError),
}

impl SdkError {
    /// Whether the whole publication may succeed if tried again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_retryable(),
            Self::Ledger(e) => e.is_retryable(),
            Self::Tree(e) => e.is_retryable(),
            Self::Shim(e) => e.is_retryable(),
            Self::Republish(e) => e.is_retryable(),
            Self::Config(_) | Self::IncompleteEvent(_) => false,
        }
    }
}

impl From<toml::de::Error> for SdkError {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
