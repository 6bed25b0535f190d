//! Error types for tree operations.

use folio_ledger::LedgerError;
use folio_store::StoreError;
use folio_types::{ModuleIdent, NodeId};

/// Errors that can occur while loading, inserting, or cloning trees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The collection has no tree, or a referenced row is missing.
    #[error("not found: {0}")]
    NotFound(String),

    /// A node repeats on a root-to-node path.
    #[error("cycle detected at {0}")]
    CycleDetected(NodeId),

    /// A tree was inserted for a collection version that already has one.
    #[error("collection {key} has {count} root nodes")]
    MultipleRoots { key: ModuleIdent, count: usize },

    /// A parent link points at a node that does not exist.
    #[error("dangling parent reference: {node} references missing parent {parent}")]
    DanglingParent { node: NodeId, parent: NodeId },

    /// Allocation or storage failure, already classified.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl TreeError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Ledger(e) if e.is_retryable())
    }

    /// Whether this breaks a structural invariant (as opposed to a missing
    /// row or a retryable race).
    pub fn is_invariant_violation(&self) -> bool {
        match self {
            Self::CycleDetected(_) | Self::MultipleRoots { .. } | Self::DanglingParent { .. } => {
                true
            }
            Self::Ledger(LedgerError::InvariantViolation(_)) => true,
            _ => false,
        }
    }
}

impl From<StoreError> for TreeError {
    fn from(e: StoreError) -> Self {
        Self::Ledger(e.into())
    }
}

/// Convenience alias for tree results.
pub type TreeResult<T> = Result<T, TreeError>;
