//! The [`ArchiveTx`] trait defining the transactional storage interface.
//!
//! Any backend (in-memory, relational) implements these traits. Engine
//! components take `&mut dyn ArchiveTx` so they can run inside whatever
//! transaction their caller opened.

use folio_types::{
    AclEntry, Association, DirectoryEntry, DocumentIdentity, DocumentVersion, IdentityRecord,
    LegacyId, LegacyProfile, ModuleIdent, NodeId, TreeNode,
};

use crate::error::StoreResult;
use crate::sequence::SequenceName;

/// Reads and writes available inside one open transaction.
///
/// Lookups return `Ok(None)` or an empty `Vec` when nothing matches; `Err`
/// is reserved for constraint violations, conflicts, and backend failures.
/// Insert methods for set-like tables (`insert_association`,
/// `insert_acl_entry`, `insert_directory_entry`) are idempotent and return
/// `true` only when a new row was written.
pub trait ArchiveTx {
    // ---- Sequences ----

    /// Hand out the next value of a sequence.
    fn next_value(&mut self, sequence: SequenceName) -> StoreResult<u64>;

    /// The value the next call to [`ArchiveTx::next_value`] would return.
    fn peek_value(&self, sequence: SequenceName) -> StoreResult<u64>;

    /// Ensure every future value of `sequence` is at least `value`.
    fn bump_to_at_least(&mut self, sequence: SequenceName, value: u64) -> StoreResult<u64>;

    // ---- Locking ----

    /// Acquire the advisory lock for `identity`, held until this transaction
    /// commits or rolls back. Re-acquiring a lock already held is a no-op.
    ///
    /// Once the lock is granted, reads see everything committed before it,
    /// including rows written by the previous holder.
    fn lock_identity(&mut self, identity: DocumentIdentity) -> StoreResult<()>;

    // ---- Identities ----

    fn identity(&self, identity: &DocumentIdentity) -> StoreResult<Option<IdentityRecord>>;

    fn insert_identity(&mut self, record: IdentityRecord) -> StoreResult<()>;

    // ---- Document versions ----

    fn document(&self, key: ModuleIdent) -> StoreResult<Option<DocumentVersion>>;

    /// All versions of a work, in key order.
    fn documents_by_identity(&self, identity: &DocumentIdentity)
        -> StoreResult<Vec<DocumentVersion>>;

    /// All versions published under a legacy id, in key order.
    fn documents_by_legacy_id(&self, legacy_id: &LegacyId) -> StoreResult<Vec<DocumentVersion>>;

    /// Insert a version row. Fails on a duplicate key or a duplicate
    /// `(identity, version)` pair.
    fn insert_document(&mut self, row: DocumentVersion) -> StoreResult<()>;

    fn associations(&self, key: ModuleIdent) -> StoreResult<Vec<Association>>;

    fn insert_association(&mut self, key: ModuleIdent, association: Association)
        -> StoreResult<bool>;

    // ---- Trees ----

    fn tree_node(&self, id: NodeId) -> StoreResult<Option<TreeNode>>;

    /// Root nodes (no parent) whose document is `key`.
    fn tree_roots(&self, key: ModuleIdent) -> StoreResult<Vec<TreeNode>>;

    /// Every node, at any depth of any tree, whose document is `key`.
    fn tree_nodes_referencing(&self, key: ModuleIdent) -> StoreResult<Vec<TreeNode>>;

    /// Direct children of a node, ordered by `child_order` then node id.
    fn tree_children(&self, parent: NodeId) -> StoreResult<Vec<TreeNode>>;

    /// The node and all of its descendants, loaded in one pass. Order is
    /// unspecified.
    fn tree_subtree(&self, root: NodeId) -> StoreResult<Vec<TreeNode>>;

    /// Insert a node. Its parent and document, when set, must exist.
    fn insert_tree_node(&mut self, node: TreeNode) -> StoreResult<()>;

    // ---- Access control and user directory ----

    fn acl_entries(&self, identity: &DocumentIdentity) -> StoreResult<Vec<AclEntry>>;

    fn insert_acl_entry(&mut self, entry: AclEntry) -> StoreResult<bool>;

    fn directory_entry(&self, username: &str) -> StoreResult<Option<DirectoryEntry>>;

    fn insert_directory_entry(&mut self, entry: DirectoryEntry) -> StoreResult<bool>;

    /// Profile from the legacy person table, the source of directory entries.
    fn legacy_profile(&self, username: &str) -> StoreResult<Option<LegacyProfile>>;
}

/// An open transaction that can be finished explicitly.
///
/// Dropping a transaction without calling [`Transaction::commit`] rolls it
/// back.
pub trait Transaction: ArchiveTx {
    fn commit(self) -> StoreResult<()>;

    fn rollback(self) -> StoreResult<()>;
}

/// A store that hands out transactions.
pub trait Archive: Send + Sync {
    type Tx<'a>: Transaction
    where
        Self: 'a;

    fn begin(&self) -> StoreResult<Self::Tx<'_>>;
}

impl<T: Archive> Archive for std::sync::Arc<T> {
    type Tx<'a>
        = T::Tx<'a>
    where
        Self: 'a;

    fn begin(&self) -> StoreResult<Self::Tx<'_>> {
        (**self).begin()
    }
}
