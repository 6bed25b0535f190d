//! Atomic, non-transactional counters.
//!
//! Every value a [`Sequence`] hands out is handed out exactly once, even
//! across concurrent transactions and rollbacks. This replaces the
//! read-max-then-insert pattern, which lets two writers compute the same
//! "next" value.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use folio_types::PortalType;

/// The counters an archive maintains.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SequenceName {
    /// Surrogate keys of document version rows.
    ModuleIdent,
    /// Tree node ids.
    TreeNode,
    /// Numbers behind legacy `mNNNN` ids.
    LegacyModuleId,
    /// Numbers behind legacy `colNNNN` ids.
    LegacyCollectionId,
}

impl SequenceName {
    /// The legacy id counter for a portal type.
    pub fn legacy_for(portal_type: PortalType) -> Self {
        match portal_type {
            PortalType::Module => Self::LegacyModuleId,
            PortalType::Collection => Self::LegacyCollectionId,
        }
    }
}

impl fmt::Display for SequenceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ModuleIdent => "module_ident",
            Self::TreeNode => "tree_node",
            Self::LegacyModuleId => "legacy_module_id",
            Self::LegacyCollectionId => "legacy_collection_id",
        };
        f.write_str(name)
    }
}

/// A monotonically increasing counter with an atomic fetch-and-increment
/// contract.
pub trait Sequence: Send + Sync {
    /// Hand out the next value.
    fn next_value(&self) -> u64;

    /// The value the next call to [`Sequence::next_value`] would return.
    fn peek(&self) -> u64;

    /// Ensure every future value is at least `value`. Never moves the
    /// counter backwards. Returns the resulting [`Sequence::peek`].
    fn bump_to_at_least(&self, value: u64) -> u64;
}

/// In-process [`Sequence`] backed by an `AtomicU64`. Starts at 1.
#[derive(Debug)]
pub struct AtomicSequence {
    next: AtomicU64,
}

impl AtomicSequence {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for AtomicSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl Sequence for AtomicSequence {
    fn next_value(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    fn peek(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }

    fn bump_to_at_least(&self, value: u64) -> u64 {
        let previous = self.next.fetch_max(value, Ordering::SeqCst);
        previous.max(value)
    }
}
