//! Row fixtures shared by this crate's tests.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Utc;
use folio_ledger::{allocate_key, allocate_legacy_id, documents, legacy_version_string};
use folio_store::{ArchiveTx, SequenceName, StoreResult};
use folio_types::{
    AclEntry, Association, DirectoryEntry, DocumentIdentity, DocumentVersion, IdentityRecord,
    LegacyId, LegacyProfile, ModuleIdent, NodeId, PortalType, TreeNode, Version,
};

fn row(
    tx: &mut dyn ArchiveTx,
    portal_type: PortalType,
    identity: DocumentIdentity,
    version: Version,
    title: &str,
) -> DocumentVersion {
    let row = DocumentVersion {
        key: allocate_key(tx).unwrap(),
        identity,
        version,
        portal_type,
        legacy_id: allocate_legacy_id(tx, portal_type).unwrap(),
        legacy_version: legacy_version_string(version.major),
        title: title.into(),
        authors: vec!["alice".into()],
        maintainers: vec![],
        licensors: vec![],
        abstract_id: None,
        license_url: None,
        revised: Utc::now(),
    };
    documents::insert(tx, row.clone()).unwrap();
    row
}

/// Insert a fresh module at version 1.
pub(crate) fn module(tx: &mut dyn ArchiveTx, title: &str) -> DocumentVersion {
    row(tx, PortalType::Module, DocumentIdentity::new(), Version::module(1), title)
}

/// Insert the next major version of an existing module.
pub(crate) fn next_module_version(tx: &mut dyn ArchiveTx, prev: &DocumentVersion) -> DocumentVersion {
    let mut next = prev.clone();
    next.key = allocate_key(tx).unwrap();
    next.version = Version::module(prev.version.major + 1);
    next.legacy_version = legacy_version_string(next.version.major);
    documents::insert(tx, next.clone()).unwrap();
    next
}

/// Insert a fresh collection at version 1.1.
pub(crate) fn collection(tx: &mut dyn ArchiveTx, title: &str) -> DocumentVersion {
    row(
        tx,
        PortalType::Collection,
        DocumentIdentity::new(),
        Version::collection(1, 1),
        title,
    )
}

/// Insert another version of an existing collection.
pub(crate) fn collection_version(
    tx: &mut dyn ArchiveTx,
    prev: &DocumentVersion,
    version: Version,
) -> DocumentVersion {
    let mut next = prev.clone();
    next.key = allocate_key(tx).unwrap();
    next.version = version;
    documents::insert(tx, next.clone()).unwrap();
    next
}

/// Read-only node set with hand-written parent and child links, for shapes
/// the archive's own constraints refuse to store.
#[derive(Default)]
pub(crate) struct FixedNodes {
    nodes: BTreeMap<NodeId, TreeNode>,
    children: HashMap<NodeId, Vec<NodeId>>,
}

impl FixedNodes {
    pub(crate) fn node(mut self, id: i64, parent: Option<i64>, document: Option<i64>) -> Self {
        let node = TreeNode {
            node_id: NodeId(id),
            parent_id: parent.map(NodeId),
            document: document.map(ModuleIdent),
            title: None,
            child_order: 0,
            track_latest: false,
        };
        self.nodes.insert(node.node_id, node);
        self
    }

    /// List `child` under `parent` regardless of the child's own parent link.
    pub(crate) fn edge(mut self, parent: i64, child: i64) -> Self {
        self.children.entry(NodeId(parent)).or_default().push(NodeId(child));
        self
    }
}

impl ArchiveTx for FixedNodes {
    fn next_value(&mut self, _: SequenceName) -> StoreResult<u64> {
        unreachable!("read-only fixture")
    }

    fn peek_value(&self, _: SequenceName) -> StoreResult<u64> {
        Ok(1)
    }

    fn bump_to_at_least(&mut self, _: SequenceName, _: u64) -> StoreResult<u64> {
        unreachable!("read-only fixture")
    }

    fn lock_identity(&mut self, _: DocumentIdentity) -> StoreResult<()> {
        Ok(())
    }

    fn identity(&self, _: &DocumentIdentity) -> StoreResult<Option<IdentityRecord>> {
        Ok(None)
    }

    fn insert_identity(&mut self, _: IdentityRecord) -> StoreResult<()> {
        unreachable!("read-only fixture")
    }

    fn document(&self, _: ModuleIdent) -> StoreResult<Option<DocumentVersion>> {
        Ok(None)
    }

    fn documents_by_identity(&self, _: &DocumentIdentity) -> StoreResult<Vec<DocumentVersion>> {
        Ok(vec![])
    }

    fn documents_by_legacy_id(&self, _: &LegacyId) -> StoreResult<Vec<DocumentVersion>> {
        Ok(vec![])
    }

    fn insert_document(&mut self, _: DocumentVersion) -> StoreResult<()> {
        unreachable!("read-only fixture")
    }

    fn associations(&self, _: ModuleIdent) -> StoreResult<Vec<Association>> {
        Ok(vec![])
    }

    fn insert_association(&mut self, _: ModuleIdent, _: Association) -> StoreResult<bool> {
        unreachable!("read-only fixture")
    }

    fn tree_node(&self, id: NodeId) -> StoreResult<Option<TreeNode>> {
        Ok(self.nodes.get(&id).cloned())
    }

    fn tree_roots(&self, key: ModuleIdent) -> StoreResult<Vec<TreeNode>> {
        Ok(self
            .nodes
            .values()
            .filter(|n| n.is_root() && n.document == Some(key))
            .cloned()
            .collect())
    }

    fn tree_nodes_referencing(&self, key: ModuleIdent) -> StoreResult<Vec<TreeNode>> {
        Ok(self
            .nodes
            .values()
            .filter(|n| n.document == Some(key))
            .cloned()
            .collect())
    }

    fn tree_children(&self, parent: NodeId) -> StoreResult<Vec<TreeNode>> {
        Ok(self
            .children
            .get(&parent)
            .into_iter()
            .flatten()
            .filter_map(|id| self.nodes.get(id).cloned())
            .collect())
    }

    fn tree_subtree(&self, root: NodeId) -> StoreResult<Vec<TreeNode>> {
        let mut seen = HashSet::new();
        let mut stack = vec![root];
        let mut result = Vec::new();
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(node) = self.nodes.get(&id) {
                result.push(node.clone());
            }
            stack.extend(self.children.get(&id).into_iter().flatten().copied());
        }
        Ok(result)
    }

    fn insert_tree_node(&mut self, _: TreeNode) -> StoreResult<()> {
        unreachable!("read-only fixture")
    }

    fn acl_entries(&self, _: &DocumentIdentity) -> StoreResult<Vec<AclEntry>> {
        Ok(vec![])
    }

    fn insert_acl_entry(&mut self, _: AclEntry) -> StoreResult<bool> {
        unreachable!("read-only fixture")
    }

    fn directory_entry(&self, _: &str) -> StoreResult<Option<DirectoryEntry>> {
        Ok(None)
    }

    fn insert_directory_entry(&mut self, _: DirectoryEntry) -> StoreResult<bool> {
        unreachable!("read-only fixture")
    }

    fn legacy_profile(&self, _: &str) -> StoreResult<Option<LegacyProfile>> {
        Ok(None)
    }
}
