//! In-memory archive for tests, demos, and embedding.
//!
//! [`InMemoryArchive`] keeps all committed tables behind a `RwLock`. Each
//! [`MemoryTransaction`] works on a private copy of the tables taken at
//! `begin` (snapshot isolation) and records a write log. On commit:
//!
//! - if nothing else committed in the meantime, the private copy replaces
//!   the committed tables;
//! - otherwise the write log is replayed onto the current tables, and any
//!   uniqueness failure during replay becomes a retryable
//!   [`StoreError::SerializationConflict`].
//!
//! Taking an advisory lock for the first time rebases the transaction onto
//! the latest committed tables the same way, so whatever the previous lock
//! holder committed is visible once the lock is granted.
//!
//! Copying the tables at `begin` is linear in archive size, which is fine
//! for the data volumes this backend is meant for.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::RwLock;

use folio_types::{
    AclEntry, Association, DirectoryEntry, DocumentIdentity, DocumentVersion, IdentityRecord,
    LegacyId, LegacyProfile, ModuleIdent, NodeId, TreeNode, Version,
};
use tracing::{debug, warn};

use crate::config::ArchiveConfig;
use crate::error::{StoreError, StoreResult};
use crate::locks::AdvisoryLocks;
use crate::sequence::{AtomicSequence, Sequence, SequenceName};
use crate::traits::{Archive, ArchiveTx, Transaction};

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default)]
struct Tables {
    identities: HashMap<DocumentIdentity, IdentityRecord>,
    documents: BTreeMap<ModuleIdent, DocumentVersion>,
    /// Unique index on `(identity, version)`.
    versions: HashMap<(DocumentIdentity, Version), ModuleIdent>,
    associations: BTreeMap<ModuleIdent, BTreeSet<Association>>,
    nodes: BTreeMap<NodeId, TreeNode>,
    /// Parent -> children index.
    children: HashMap<NodeId, Vec<NodeId>>,
    acl: BTreeSet<AclEntry>,
    directory: BTreeMap<String, DirectoryEntry>,
    profiles: BTreeMap<String, LegacyProfile>,
}

/// One logged write, replayable onto a newer snapshot.
#[derive(Clone, Debug)]
enum Write {
    Identity(IdentityRecord),
    Document(DocumentVersion),
    Association(ModuleIdent, Association),
    TreeNode(TreeNode),
    Acl(AclEntry),
    Directory(DirectoryEntry),
}

impl Tables {
    /// Apply a write, enforcing constraints. Returns whether a row was added.
    fn apply(&mut self, write: Write) -> StoreResult<bool> {
        match write {
            Write::Identity(record) => {
                if self.identities.contains_key(&record.identity) {
                    return Err(StoreError::UniqueViolation {
                        table: "identities",
                        detail: record.identity.to_string(),
                    });
                }
                self.identities.insert(record.identity, record);
                Ok(true)
            }
            Write::Document(row) => {
                if self.documents.contains_key(&row.key) {
                    return Err(StoreError::UniqueViolation {
                        table: "documents",
                        detail: format!("key {}", row.key),
                    });
                }
                let version_key = (row.identity, row.version);
                if let Some(existing) = self.versions.get(&version_key) {
                    return Err(StoreError::UniqueViolation {
                        table: "documents",
                        detail: format!(
                            "{} version {} already published as key {existing}",
                            row.identity, row.version
                        ),
                    });
                }
                self.versions.insert(version_key, row.key);
                self.documents.insert(row.key, row);
                Ok(true)
            }
            Write::Association(key, association) => {
                if !self.documents.contains_key(&key) {
                    return Err(StoreError::DanglingReference {
                        table: "associations",
                        target: format!("document {key}"),
                    });
                }
                Ok(self.associations.entry(key).or_default().insert(association))
            }
            Write::TreeNode(node) => {
                if self.nodes.contains_key(&node.node_id) {
                    return Err(StoreError::UniqueViolation {
                        table: "trees",
                        detail: node.node_id.to_string(),
                    });
                }
                if let Some(parent) = node.parent_id {
                    if !self.nodes.contains_key(&parent) {
                        return Err(StoreError::DanglingReference {
                            table: "trees",
                            target: format!("parent {parent}"),
                        });
                    }
                }
                if let Some(key) = node.document {
                    if !self.documents.contains_key(&key) {
                        return Err(StoreError::DanglingReference {
                            table: "trees",
                            target: format!("document {key}"),
                        });
                    }
                }
                if let Some(parent) = node.parent_id {
                    self.children.entry(parent).or_default().push(node.node_id);
                }
                self.nodes.insert(node.node_id, node);
                Ok(true)
            }
            Write::Acl(entry) => Ok(self.acl.insert(entry)),
            Write::Directory(entry) => {
                if self.directory.contains_key(&entry.username) {
                    return Ok(false);
                }
                self.directory.insert(entry.username.clone(), entry);
                Ok(true)
            }
        }
    }

    fn sorted_children(&self, parent: NodeId) -> Vec<TreeNode> {
        let mut children: Vec<TreeNode> = self
            .children
            .get(&parent)
            .into_iter()
            .flatten()
            .filter_map(|id| self.nodes.get(id).cloned())
            .collect();
        children.sort_by_key(|n| (n.child_order, n.node_id));
        children
    }
}

// ---------------------------------------------------------------------------
// InMemoryArchive
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Committed {
    tables: Tables,
    generation: u64,
}

/// Snapshot-isolated, in-memory implementation of [`Archive`].
pub struct InMemoryArchive {
    committed: RwLock<Committed>,
    sequences: HashMap<SequenceName, AtomicSequence>,
    locks: AdvisoryLocks,
    config: ArchiveConfig,
}

impl InMemoryArchive {
    /// Create an empty archive with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ArchiveConfig::default())
    }

    pub fn with_config(config: ArchiveConfig) -> Self {
        let sequences = [
            SequenceName::ModuleIdent,
            SequenceName::TreeNode,
            SequenceName::LegacyModuleId,
            SequenceName::LegacyCollectionId,
        ]
        .into_iter()
        .map(|name| (name, AtomicSequence::new()))
        .collect();

        Self {
            committed: RwLock::new(Committed::default()),
            sequences,
            locks: AdvisoryLocks::new(),
            config,
        }
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Load a row into the legacy person table. Outside any transaction;
    /// the table is owned by the legacy system.
    pub fn seed_profile(&self, profile: LegacyProfile) -> StoreResult<()> {
        let mut committed = self.write_committed()?;
        committed
            .tables
            .profiles
            .insert(profile.username.clone(), profile);
        committed.generation += 1;
        Ok(())
    }

    /// Number of committed document version rows.
    pub fn document_count(&self) -> StoreResult<usize> {
        Ok(self.read_committed()?.tables.documents.len())
    }

    /// Number of committed tree nodes.
    pub fn tree_node_count(&self) -> StoreResult<usize> {
        Ok(self.read_committed()?.tables.nodes.len())
    }

    /// Number of committed commits since creation.
    pub fn generation(&self) -> StoreResult<u64> {
        Ok(self.read_committed()?.generation)
    }

    fn sequence(&self, name: SequenceName) -> &AtomicSequence {
        // Every SequenceName variant is registered in `with_config`.
        &self.sequences[&name]
    }

    fn read_committed(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, Committed>> {
        self.committed
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }

    fn write_committed(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, Committed>> {
        self.committed
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl Default for InMemoryArchive {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (documents, nodes) = match self.committed.read() {
            Ok(c) => (c.tables.documents.len(), c.tables.nodes.len()),
            Err(_) => (0, 0),
        };
        f.debug_struct("InMemoryArchive")
            .field("document_count", &documents)
            .field("tree_node_count", &nodes)
            .finish()
    }
}

impl Archive for InMemoryArchive {
    type Tx<'a> = MemoryTransaction<'a>;

    fn begin(&self) -> StoreResult<MemoryTransaction<'_>> {
        let committed = self.read_committed()?;
        Ok(MemoryTransaction {
            archive: self,
            working: committed.tables.clone(),
            writes: Vec::new(),
            base_generation: committed.generation,
            held_locks: Vec::new(),
            finished: false,
        })
    }
}

// ---------------------------------------------------------------------------
// MemoryTransaction
// ---------------------------------------------------------------------------

/// An open transaction on an [`InMemoryArchive`].
pub struct MemoryTransaction<'a> {
    archive: &'a InMemoryArchive,
    working: Tables,
    writes: Vec<Write>,
    base_generation: u64,
    held_locks: Vec<DocumentIdentity>,
    finished: bool,
}

impl MemoryTransaction<'_> {
    fn write(&mut self, write: Write) -> StoreResult<bool> {
        let added = self.working.apply(write.clone())?;
        if added {
            self.writes.push(write);
        }
        Ok(added)
    }

    /// Move the snapshot up to the latest committed tables and replay this
    /// transaction's writes on top.
    fn rebase(&mut self) -> StoreResult<()> {
        let archive = self.archive;
        let committed = archive.read_committed()?;
        if committed.generation == self.base_generation {
            return Ok(());
        }
        let mut working = committed.tables.clone();
        for write in &self.writes {
            working.apply(write.clone()).map_err(replay_conflict)?;
        }
        debug!(
            from = self.base_generation,
            to = committed.generation,
            writes = self.writes.len(),
            "snapshot rebased"
        );
        self.working = working;
        self.base_generation = committed.generation;
        Ok(())
    }

    fn release_locks(&mut self) {
        for identity in self.held_locks.drain(..) {
            self.archive.locks.release(&identity);
        }
    }
}

impl ArchiveTx for MemoryTransaction<'_> {
    fn next_value(&mut self, sequence: SequenceName) -> StoreResult<u64> {
        Ok(self.archive.sequence(sequence).next_value())
    }

    fn peek_value(&self, sequence: SequenceName) -> StoreResult<u64> {
        Ok(self.archive.sequence(sequence).peek())
    }

    fn bump_to_at_least(&mut self, sequence: SequenceName, value: u64) -> StoreResult<u64> {
        Ok(self.archive.sequence(sequence).bump_to_at_least(value))
    }

    fn lock_identity(&mut self, identity: DocumentIdentity) -> StoreResult<()> {
        if self.held_locks.contains(&identity) {
            return Ok(());
        }
        self.archive
            .locks
            .acquire(identity, self.archive.config.lock_timeout())?;
        self.held_locks.push(identity);
        self.rebase()
    }

    fn identity(&self, identity: &DocumentIdentity) -> StoreResult<Option<IdentityRecord>> {
        Ok(self.working.identities.get(identity).cloned())
    }

    fn insert_identity(&mut self, record: IdentityRecord) -> StoreResult<()> {
        self.write(Write::Identity(record)).map(|_| ())
    }

    fn document(&self, key: ModuleIdent) -> StoreResult<Option<DocumentVersion>> {
        Ok(self.working.documents.get(&key).cloned())
    }

    fn documents_by_identity(
        &self,
        identity: &DocumentIdentity,
    ) -> StoreResult<Vec<DocumentVersion>> {
        Ok(self
            .working
            .documents
            .values()
            .filter(|row| &row.identity == identity)
            .cloned()
            .collect())
    }

    fn documents_by_legacy_id(&self, legacy_id: &LegacyId) -> StoreResult<Vec<DocumentVersion>> {
        Ok(self
            .working
            .documents
            .values()
            .filter(|row| &row.legacy_id == legacy_id)
            .cloned()
            .collect())
    }

    fn insert_document(&mut self, row: DocumentVersion) -> StoreResult<()> {
        self.write(Write::Document(row)).map(|_| ())
    }

    fn associations(&self, key: ModuleIdent) -> StoreResult<Vec<Association>> {
        Ok(self
            .working
            .associations
            .get(&key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn insert_association(
        &mut self,
        key: ModuleIdent,
        association: Association,
    ) -> StoreResult<bool> {
        self.write(Write::Association(key, association))
    }

    fn tree_node(&self, id: NodeId) -> StoreResult<Option<TreeNode>> {
        Ok(self.working.nodes.get(&id).cloned())
    }

    fn tree_roots(&self, key: ModuleIdent) -> StoreResult<Vec<TreeNode>> {
        Ok(self
            .working
            .nodes
            .values()
            .filter(|n| n.is_root() && n.document == Some(key))
            .cloned()
            .collect())
    }

    fn tree_nodes_referencing(&self, key: ModuleIdent) -> StoreResult<Vec<TreeNode>> {
        Ok(self
            .working
            .nodes
            .values()
            .filter(|n| n.document == Some(key))
            .cloned()
            .collect())
    }

    fn tree_children(&self, parent: NodeId) -> StoreResult<Vec<TreeNode>> {
        Ok(self.working.sorted_children(parent))
    }

    fn tree_subtree(&self, root: NodeId) -> StoreResult<Vec<TreeNode>> {
        let mut result = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            if let Some(node) = self.working.nodes.get(&id) {
                result.push(node.clone());
                if let Some(children) = self.working.children.get(&id) {
                    queue.extend(children.iter().copied());
                }
            }
        }
        Ok(result)
    }

    fn insert_tree_node(&mut self, node: TreeNode) -> StoreResult<()> {
        self.write(Write::TreeNode(node)).map(|_| ())
    }

    fn acl_entries(&self, identity: &DocumentIdentity) -> StoreResult<Vec<AclEntry>> {
        Ok(self
            .working
            .acl
            .iter()
            .filter(|e| &e.identity == identity)
            .cloned()
            .collect())
    }

    fn insert_acl_entry(&mut self, entry: AclEntry) -> StoreResult<bool> {
        self.write(Write::Acl(entry))
    }

    fn directory_entry(&self, username: &str) -> StoreResult<Option<DirectoryEntry>> {
        Ok(self.working.directory.get(username).cloned())
    }

    fn insert_directory_entry(&mut self, entry: DirectoryEntry) -> StoreResult<bool> {
        self.write(Write::Directory(entry))
    }

    fn legacy_profile(&self, username: &str) -> StoreResult<Option<LegacyProfile>> {
        Ok(self.working.profiles.get(username).cloned())
    }
}

impl Transaction for MemoryTransaction<'_> {
    fn commit(mut self) -> StoreResult<()> {
        let result = {
            let mut committed = self.archive.write_committed()?;
            if committed.generation == self.base_generation {
                committed.tables = std::mem::take(&mut self.working);
                committed.generation += 1;
                Ok(())
            } else {
                let mut merged = committed.tables.clone();
                let replayed = self
                    .writes
                    .drain(..)
                    .try_for_each(|w| merged.apply(w).map(|_| ()).map_err(replay_conflict));
                match replayed {
                    Ok(()) => {
                        committed.tables = merged;
                        committed.generation += 1;
                        Ok(())
                    }
                    Err(e) => Err(e),
                }
            }
        };

        self.finished = true;
        match &result {
            Ok(()) => debug!(base = self.base_generation, "transaction committed"),
            Err(e) => warn!(error = %e, "transaction commit failed"),
        }
        result
    }

    fn rollback(mut self) -> StoreResult<()> {
        self.finished = true;
        debug!(writes = self.writes.len(), "transaction rolled back");
        Ok(())
    }
}

/// A uniqueness failure while replaying onto newer tables means another
/// transaction got there first.
fn replay_conflict(error: StoreError) -> StoreError {
    match error {
        StoreError::UniqueViolation { table, detail } => {
            StoreError::SerializationConflict(format!("concurrent commit wrote {table} row: {detail}"))
        }
        other => other,
    }
}

impl Drop for MemoryTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            debug!(writes = self.writes.len(), "uncommitted transaction dropped");
        }
        self.release_locks();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use folio_types::{Permission, PortalType};
    use std::time::Duration;

    fn module_row(key: i64, identity: DocumentIdentity, major: u32) -> DocumentVersion {
        DocumentVersion {
            key: ModuleIdent(key),
            identity,
            version: Version::module(major),
            portal_type: PortalType::Module,
            legacy_id: LegacyId::new(PortalType::Module, 1),
            legacy_version: format!("1.{major}"),
            title: "Page".into(),
            authors: vec!["alice".into()],
            maintainers: vec![],
            licensors: vec![],
            abstract_id: None,
            license_url: None,
            revised: Utc::now(),
        }
    }

    fn node(id: i64, parent: Option<i64>, document: Option<i64>, order: u32) -> TreeNode {
        TreeNode {
            node_id: NodeId(id),
            parent_id: parent.map(NodeId),
            document: document.map(ModuleIdent),
            title: None,
            child_order: order,
            track_latest: false,
        }
    }

    // -----------------------------------------------------------------------
    // Commit / rollback
    // -----------------------------------------------------------------------

    #[test]
    fn committed_rows_are_visible_to_later_transactions() {
        let archive = InMemoryArchive::new();
        let id = DocumentIdentity::new();
        let mut tx = archive.begin().unwrap();
        tx.insert_document(module_row(1, id, 1)).unwrap();
        tx.commit().unwrap();

        let tx = archive.begin().unwrap();
        assert!(tx.document(ModuleIdent(1)).unwrap().is_some());
        assert_eq!(archive.document_count().unwrap(), 1);
    }

    #[test]
    fn dropped_transaction_rolls_back() {
        let archive = InMemoryArchive::new();
        {
            let mut tx = archive.begin().unwrap();
            tx.insert_document(module_row(1, DocumentIdentity::new(), 1))
                .unwrap();
        }
        assert_eq!(archive.document_count().unwrap(), 0);
    }

    #[test]
    fn explicit_rollback_discards_writes() {
        let archive = InMemoryArchive::new();
        let mut tx = archive.begin().unwrap();
        tx.insert_document(module_row(1, DocumentIdentity::new(), 1))
            .unwrap();
        tx.rollback().unwrap();
        assert_eq!(archive.document_count().unwrap(), 0);
        assert_eq!(archive.generation().unwrap(), 0);
    }

    #[test]
    fn uncommitted_writes_are_invisible_to_other_transactions() {
        let archive = InMemoryArchive::new();
        let mut writer = archive.begin().unwrap();
        writer
            .insert_document(module_row(1, DocumentIdentity::new(), 1))
            .unwrap();

        let reader = archive.begin().unwrap();
        assert!(reader.document(ModuleIdent(1)).unwrap().is_none());
    }

    // -----------------------------------------------------------------------
    // Constraints
    // -----------------------------------------------------------------------

    #[test]
    fn duplicate_version_is_rejected() {
        let archive = InMemoryArchive::new();
        let id = DocumentIdentity::new();
        let mut tx = archive.begin().unwrap();
        tx.insert_document(module_row(1, id, 1)).unwrap();
        let err = tx.insert_document(module_row(2, id, 1)).unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { table: "documents", .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn duplicate_key_is_rejected() {
        let archive = InMemoryArchive::new();
        let mut tx = archive.begin().unwrap();
        tx.insert_document(module_row(1, DocumentIdentity::new(), 1))
            .unwrap();
        assert!(tx
            .insert_document(module_row(1, DocumentIdentity::new(), 1))
            .is_err());
    }

    #[test]
    fn tree_node_requires_existing_parent_and_document() {
        let archive = InMemoryArchive::new();
        let mut tx = archive.begin().unwrap();
        let err = tx.insert_tree_node(node(1, Some(99), None, 0)).unwrap_err();
        assert!(matches!(err, StoreError::DanglingReference { .. }));
        let err = tx.insert_tree_node(node(1, None, Some(5), 0)).unwrap_err();
        assert!(matches!(err, StoreError::DanglingReference { .. }));
    }

    #[test]
    fn set_tables_are_idempotent() {
        let archive = InMemoryArchive::new();
        let id = DocumentIdentity::new();
        let mut tx = archive.begin().unwrap();
        let entry = AclEntry {
            identity: id,
            user_id: "alice".into(),
            permission: Permission::Publish,
        };
        assert!(tx.insert_acl_entry(entry.clone()).unwrap());
        assert!(!tx.insert_acl_entry(entry).unwrap());
        assert!(tx.insert_directory_entry(DirectoryEntry::bare("alice")).unwrap());
        assert!(!tx.insert_directory_entry(DirectoryEntry::bare("alice")).unwrap());
        assert_eq!(tx.acl_entries(&id).unwrap().len(), 1);
    }

    // -----------------------------------------------------------------------
    // Trees
    // -----------------------------------------------------------------------

    #[test]
    fn children_are_ordered_and_subtree_is_complete() {
        let archive = InMemoryArchive::new();
        let mut tx = archive.begin().unwrap();
        tx.insert_document(module_row(1, DocumentIdentity::new(), 1))
            .unwrap();
        tx.insert_tree_node(node(10, None, Some(1), 0)).unwrap();
        tx.insert_tree_node(node(12, Some(10), None, 1)).unwrap();
        tx.insert_tree_node(node(11, Some(10), None, 0)).unwrap();
        tx.insert_tree_node(node(13, Some(12), Some(1), 0)).unwrap();

        let order: Vec<_> = tx
            .tree_children(NodeId(10))
            .unwrap()
            .into_iter()
            .map(|n| n.node_id)
            .collect();
        assert_eq!(order, vec![NodeId(11), NodeId(12)]);
        assert_eq!(tx.tree_subtree(NodeId(10)).unwrap().len(), 4);
        assert_eq!(tx.tree_subtree(NodeId(12)).unwrap().len(), 2);
        assert_eq!(tx.tree_roots(ModuleIdent(1)).unwrap().len(), 1);
        assert_eq!(tx.tree_nodes_referencing(ModuleIdent(1)).unwrap().len(), 2);
    }

    // -----------------------------------------------------------------------
    // Concurrency
    // -----------------------------------------------------------------------

    #[test]
    fn disjoint_concurrent_commits_both_apply() {
        let archive = InMemoryArchive::new();
        let mut a = archive.begin().unwrap();
        let mut b = archive.begin().unwrap();
        a.insert_document(module_row(1, DocumentIdentity::new(), 1))
            .unwrap();
        b.insert_document(module_row(2, DocumentIdentity::new(), 1))
            .unwrap();
        a.commit().unwrap();
        b.commit().unwrap();
        assert_eq!(archive.document_count().unwrap(), 2);
    }

    #[test]
    fn racing_version_insert_is_a_serialization_conflict() {
        let archive = InMemoryArchive::new();
        let id = DocumentIdentity::new();
        let mut a = archive.begin().unwrap();
        let mut b = archive.begin().unwrap();
        a.insert_document(module_row(1, id, 2)).unwrap();
        b.insert_document(module_row(2, id, 2)).unwrap();
        a.commit().unwrap();

        let err = b.commit().unwrap_err();
        assert!(matches!(err, StoreError::SerializationConflict(_)));
        assert!(err.is_retryable());
        assert_eq!(archive.document_count().unwrap(), 1);
    }

    #[test]
    fn advisory_lock_released_when_transaction_ends() {
        let archive = InMemoryArchive::with_config(ArchiveConfig { lock_timeout_ms: 10 });
        let id = DocumentIdentity::new();

        let mut a = archive.begin().unwrap();
        a.lock_identity(id).unwrap();
        a.lock_identity(id).unwrap(); // re-entrant

        let mut b = archive.begin().unwrap();
        assert_eq!(b.lock_identity(id).unwrap_err(), StoreError::LockTimeout(id));

        a.commit().unwrap();
        b.lock_identity(id).unwrap();
    }

    #[test]
    fn lock_waiter_sees_what_the_holder_committed() {
        let archive = InMemoryArchive::new();
        let id = DocumentIdentity::new();
        let mut a = archive.begin().unwrap();
        let mut b = archive.begin().unwrap();
        a.lock_identity(id).unwrap();
        a.insert_document(module_row(1, id, 1)).unwrap();

        std::thread::scope(|s| {
            let waiter = s.spawn(move || {
                b.lock_identity(id).unwrap();
                let seen = b.documents_by_identity(&id).unwrap();
                let major = seen.iter().map(|r| r.version.major).max().unwrap_or(0) + 1;
                b.insert_document(module_row(2, id, major)).unwrap();
                b.commit().map(|()| seen.len())
            });
            std::thread::sleep(Duration::from_millis(50));
            a.commit().unwrap();
            assert_eq!(waiter.join().unwrap().unwrap(), 1);
        });

        let tx = archive.begin().unwrap();
        let mut majors: Vec<_> = tx
            .documents_by_identity(&id)
            .unwrap()
            .iter()
            .map(|r| r.version.major)
            .collect();
        majors.sort_unstable();
        assert_eq!(majors, vec![1, 2]);
    }

    #[test]
    fn lock_after_conflicting_write_is_a_serialization_conflict() {
        let archive = InMemoryArchive::new();
        let id = DocumentIdentity::new();
        let mut a = archive.begin().unwrap();
        let mut b = archive.begin().unwrap();
        a.insert_document(module_row(1, id, 1)).unwrap();
        b.insert_document(module_row(2, id, 1)).unwrap();
        a.commit().unwrap();

        let err = b.lock_identity(id).unwrap_err();
        assert!(matches!(err, StoreError::SerializationConflict(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn sequences_survive_rollback() {
        let archive = InMemoryArchive::new();
        let first = {
            let mut tx = archive.begin().unwrap();
            tx.next_value(SequenceName::ModuleIdent).unwrap()
        };
        let mut tx = archive.begin().unwrap();
        assert_eq!(tx.next_value(SequenceName::ModuleIdent).unwrap(), first + 1);
    }

    #[test]
    fn lock_timeout_is_configurable() {
        let archive = InMemoryArchive::with_config(ArchiveConfig { lock_timeout_ms: 1 });
        assert_eq!(archive.config().lock_timeout(), Duration::from_millis(1));
    }

    #[test]
    fn profiles_are_readable_in_transactions() {
        let archive = InMemoryArchive::new();
        archive
            .seed_profile(LegacyProfile {
                username: "alice".into(),
                first_name: Some("Alice".into()),
                last_name: None,
                full_name: None,
                email: None,
            })
            .unwrap();
        let tx = archive.begin().unwrap();
        assert!(tx.legacy_profile("alice").unwrap().is_some());
        assert!(tx.legacy_profile("bob").unwrap().is_none());
    }
}
