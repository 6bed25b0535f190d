//! Loading and querying collection trees.

use std::collections::{BTreeMap, HashSet};

use folio_ledger::documents;
use folio_store::{ArchiveTx, SequenceName};
use folio_types::{
    DocumentIdentity, DocumentVersion, ModuleIdent, NodeId, PortalType, TreeDraft, TreeNode,
    Version,
};
use tracing::{debug, warn};

use crate::error::{TreeError, TreeResult};
use crate::tree::{Tree, TreeItem};

/// Fresh tree node id.
pub(crate) fn next_node_id(tx: &mut dyn ArchiveTx) -> TreeResult<NodeId> {
    let value = tx.next_value(SequenceName::TreeNode)?;
    let id = i64::try_from(value).map_err(|_| {
        folio_ledger::LedgerError::InvariantViolation(format!(
            "tree node sequence overflowed at {value}"
        ))
    })?;
    Ok(NodeId(id))
}

/// The root node of a collection version's tree, if it has one.
///
/// Cloning without remapping the collection key leaves a second root for
/// the same key. Node ids only grow, so the lowest one is the tree that was
/// inserted with the collection.
pub(crate) fn root_of(tx: &dyn ArchiveTx, key: ModuleIdent) -> TreeResult<Option<TreeNode>> {
    let roots = tx.tree_roots(key)?;
    if roots.len() > 1 {
        debug!(collection = %key, roots = roots.len(), "using the earliest root");
    }
    Ok(roots.into_iter().min_by_key(|root| root.node_id))
}

/// Full tree of a collection at a version (latest when `version` is `None`).
///
/// Returns `Ok(None)` when the collection, the version, or its tree does
/// not exist.
pub fn get_tree(
    tx: &dyn ArchiveTx,
    identity: &DocumentIdentity,
    version: Option<Version>,
) -> TreeResult<Option<Tree>> {
    match documents::resolve(tx, identity, version)? {
        Some(key) => load_tree(tx, key),
        None => Ok(None),
    }
}

/// Full tree of the collection version with surrogate key `key`.
pub fn load_tree(tx: &dyn ArchiveTx, key: ModuleIdent) -> TreeResult<Option<Tree>> {
    let Some(root) = root_of(tx, key)? else {
        return Ok(None);
    };
    let mut path = HashSet::new();
    let root = descend(tx, root, &mut path)?;
    debug!(collection = %key, "loaded tree");
    Ok(Some(Tree { root }))
}

/// The tree hanging below an arbitrary node, e.g. a freshly cloned root.
pub fn load_subtree(tx: &dyn ArchiveTx, root: NodeId) -> TreeResult<Tree> {
    let node = tx
        .tree_node(root)?
        .ok_or_else(|| TreeError::NotFound(format!("tree {root}")))?;
    let mut path = HashSet::new();
    Ok(Tree {
        root: descend(tx, node, &mut path)?,
    })
}

/// Recursive descent. A child already on the current root-to-node path is
/// skipped rather than descended into; the stored data is left as it is.
fn descend(
    tx: &dyn ArchiveTx,
    node: TreeNode,
    path: &mut HashSet<NodeId>,
) -> TreeResult<TreeItem> {
    path.insert(node.node_id);
    let mut children = Vec::new();
    for child in tx.tree_children(node.node_id)? {
        if path.contains(&child.node_id) {
            warn!(node = %child.node_id, parent = %node.node_id, "node repeats on its own path; skipping");
            continue;
        }
        children.push(descend(tx, child, path)?);
    }
    path.remove(&node.node_id);
    Ok(TreeItem { node, children })
}

/// Follow parent links from `node` to the root of its tree.
fn ascend_to_root(tx: &dyn ArchiveTx, node: TreeNode) -> TreeResult<TreeNode> {
    let mut visited = HashSet::new();
    let mut current = node;
    while let Some(parent) = current.parent_id {
        if !visited.insert(current.node_id) {
            return Err(TreeError::CycleDetected(current.node_id));
        }
        current = tx.tree_node(parent)?.ok_or(TreeError::DanglingParent {
            node: current.node_id,
            parent,
        })?;
    }
    Ok(current)
}

/// Latest collection versions whose tree contains `document_key` at any
/// depth.
///
/// Every node referencing the key is followed up to its root; each root's
/// collection version is kept only if it is still the latest version of its
/// work. Older collection versions that happen to contain the document are
/// not returned. Results are deduplicated and ordered by key.
pub fn get_containing_collections(
    tx: &dyn ArchiveTx,
    document_key: ModuleIdent,
) -> TreeResult<Vec<DocumentVersion>> {
    let mut found: BTreeMap<ModuleIdent, DocumentVersion> = BTreeMap::new();

    for occurrence in tx.tree_nodes_referencing(document_key)? {
        let root = ascend_to_root(tx, occurrence)?;
        let Some(collection_key) = root.document else {
            warn!(root = %root.node_id, "tree root without a collection reference");
            continue;
        };
        if collection_key == document_key || found.contains_key(&collection_key) {
            continue;
        }
        let collection = documents::get(tx, collection_key)?.ok_or_else(|| {
            TreeError::NotFound(format!("collection {collection_key} owning {}", root.node_id))
        })?;
        if collection.portal_type != PortalType::Collection {
            continue;
        }
        if documents::is_latest(tx, &collection)? {
            found.insert(collection_key, collection);
        }
    }

    debug!(document = %document_key, collections = found.len(), "found containing collections");
    Ok(found.into_values().collect())
}

/// Insert the tree for a newly published collection version and return
/// its root. The root references `collection_key`; `contents` become its
/// children in order.
pub fn insert_tree(
    tx: &mut dyn ArchiveTx,
    collection_key: ModuleIdent,
    contents: &[TreeDraft],
) -> TreeResult<NodeId> {
    if root_of(tx, collection_key)?.is_some() {
        return Err(TreeError::MultipleRoots {
            key: collection_key,
            count: 2,
        });
    }

    let root = TreeNode {
        node_id: next_node_id(tx)?,
        parent_id: None,
        document: Some(collection_key),
        title: None,
        child_order: 0,
        track_latest: false,
    };
    let root_id = root.node_id;
    tx.insert_tree_node(root)?;

    let mut inserted = 1;
    for (order, draft) in contents.iter().enumerate() {
        inserted += insert_draft(tx, root_id, order, draft)?;
    }
    debug!(collection = %collection_key, root = %root_id, nodes = inserted, "inserted tree");
    Ok(root_id)
}

fn insert_draft(
    tx: &mut dyn ArchiveTx,
    parent: NodeId,
    order: usize,
    draft: &TreeDraft,
) -> TreeResult<usize> {
    let child_order = u32::try_from(order).map_err(|_| {
        folio_ledger::LedgerError::InvariantViolation(format!("too many children under {parent}"))
    })?;
    let node = TreeNode {
        node_id: next_node_id(tx)?,
        parent_id: Some(parent),
        document: draft.document,
        title: draft.title.clone(),
        child_order,
        track_latest: draft.track_latest,
    };
    let id = node.node_id;
    tx.insert_tree_node(node)?;

    let mut inserted = 1;
    for (order, child) in draft.children.iter().enumerate() {
        inserted += insert_draft(tx, id, order, child)?;
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        collection, collection_version, module, next_module_version, FixedNodes,
    };
    use folio_store::{Archive, InMemoryArchive};

    #[test]
    fn get_tree_returns_ordered_contents() {
        let archive = InMemoryArchive::new();
        let mut tx = archive.begin().unwrap();
        let m1 = module(&mut tx, "Intro");
        let m2 = module(&mut tx, "Motion");
        let book = collection(&mut tx, "Physics");
        insert_tree(
            &mut tx,
            book.key,
            &[
                TreeDraft::document(m1.key),
                TreeDraft::grouping("Unit 1", vec![TreeDraft::document(m2.key)]),
            ],
        )
        .unwrap();

        let tree = get_tree(&tx, &book.identity, None).unwrap().unwrap();
        assert_eq!(tree.collection(), Some(book.key));
        assert_eq!(tree.node_count(), 4);
        assert_eq!(tree.documents(), vec![m1.key, m2.key]);
        assert_eq!(tree.root.children[1].node.title.as_deref(), Some("Unit 1"));
        assert!(tree.root.children[1].node.is_grouping());
    }

    #[test]
    fn get_tree_of_unknown_collection_is_none() {
        let archive = InMemoryArchive::new();
        let tx = archive.begin().unwrap();
        assert!(get_tree(&tx, &DocumentIdentity::new(), None).unwrap().is_none());
    }

    #[test]
    fn get_tree_at_exact_version() {
        let archive = InMemoryArchive::new();
        let mut tx = archive.begin().unwrap();
        let m1 = module(&mut tx, "Intro");
        let v1 = collection(&mut tx, "Physics");
        insert_tree(&mut tx, v1.key, &[TreeDraft::document(m1.key)]).unwrap();
        let v2 = collection_version(&mut tx, &v1, Version::collection(1, 2));
        insert_tree(&mut tx, v2.key, &[]).unwrap();

        let old = get_tree(&tx, &v1.identity, Some(v1.version)).unwrap().unwrap();
        let new = get_tree(&tx, &v1.identity, None).unwrap().unwrap();
        assert_eq!(old.documents(), vec![m1.key]);
        assert!(new.documents().is_empty());
    }

    #[test]
    fn second_tree_for_same_version_is_rejected() {
        let archive = InMemoryArchive::new();
        let mut tx = archive.begin().unwrap();
        let book = collection(&mut tx, "Physics");
        insert_tree(&mut tx, book.key, &[]).unwrap();
        let err = insert_tree(&mut tx, book.key, &[]).unwrap_err();
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn containing_collections_finds_nested_occurrences() {
        let archive = InMemoryArchive::new();
        let mut tx = archive.begin().unwrap();
        let page = module(&mut tx, "Vectors");
        let other = module(&mut tx, "Other");
        let physics = collection(&mut tx, "Physics");
        let maths = collection(&mut tx, "Maths");
        let unrelated = collection(&mut tx, "History");
        insert_tree(
            &mut tx,
            physics.key,
            &[TreeDraft::grouping(
                "Unit",
                vec![TreeDraft::grouping("Chapter", vec![TreeDraft::document(page.key)])],
            )],
        )
        .unwrap();
        insert_tree(
            &mut tx,
            maths.key,
            &[TreeDraft::document(page.key), TreeDraft::document(page.key)],
        )
        .unwrap();
        insert_tree(&mut tx, unrelated.key, &[TreeDraft::document(other.key)]).unwrap();

        let keys: Vec<_> = get_containing_collections(&tx, page.key)
            .unwrap()
            .into_iter()
            .map(|c| c.key)
            .collect();
        assert_eq!(keys, vec![physics.key, maths.key]);
    }

    #[test]
    fn containing_collections_ignores_superseded_versions() {
        let archive = InMemoryArchive::new();
        let mut tx = archive.begin().unwrap();
        let page = module(&mut tx, "Vectors");
        let v1 = collection(&mut tx, "Physics");
        insert_tree(&mut tx, v1.key, &[TreeDraft::document(page.key)]).unwrap();
        let v2 = collection_version(&mut tx, &v1, Version::collection(1, 2));
        insert_tree(&mut tx, v2.key, &[]).unwrap();

        assert!(get_containing_collections(&tx, page.key).unwrap().is_empty());
    }

    #[test]
    fn containing_collections_matches_exact_document_key() {
        let archive = InMemoryArchive::new();
        let mut tx = archive.begin().unwrap();
        let page_v1 = module(&mut tx, "Vectors");
        let page_v2 = next_module_version(&mut tx, &page_v1);
        let book = collection(&mut tx, "Physics");
        insert_tree(&mut tx, book.key, &[TreeDraft::document(page_v1.key)]).unwrap();

        assert_eq!(get_containing_collections(&tx, page_v1.key).unwrap().len(), 1);
        assert!(get_containing_collections(&tx, page_v2.key).unwrap().is_empty());
    }

    #[test]
    fn collection_does_not_contain_itself() {
        let archive = InMemoryArchive::new();
        let mut tx = archive.begin().unwrap();
        let book = collection(&mut tx, "Physics");
        insert_tree(&mut tx, book.key, &[]).unwrap();
        assert!(get_containing_collections(&tx, book.key).unwrap().is_empty());
    }

    #[test]
    fn node_listed_below_its_own_descendant_is_skipped() {
        let nodes = FixedNodes::default()
            .node(1, None, Some(5))
            .node(2, Some(1), Some(6))
            .node(3, Some(2), Some(7))
            .edge(1, 2)
            .edge(2, 3)
            .edge(3, 1)
            .edge(3, 2);

        let tree = load_subtree(&nodes, NodeId(1)).unwrap();
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.documents(), vec![ModuleIdent(6), ModuleIdent(7)]);
    }

    #[test]
    fn parent_cycle_is_reported_on_ascent() {
        let nodes = FixedNodes::default()
            .node(2, Some(3), Some(9))
            .node(3, Some(2), None);

        let err = get_containing_collections(&nodes, ModuleIdent(9)).unwrap_err();
        assert!(matches!(err, TreeError::CycleDetected(NodeId(2))));
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn parent_link_to_missing_node_is_dangling() {
        let nodes = FixedNodes::default().node(2, Some(40), Some(9));
        let err = get_containing_collections(&nodes, ModuleIdent(9)).unwrap_err();
        assert!(matches!(
            err,
            TreeError::DanglingParent {
                node: NodeId(2),
                parent: NodeId(40)
            }
        ));
    }

    #[test]
    fn load_subtree_of_missing_node_is_not_found() {
        let archive = InMemoryArchive::new();
        let tx = archive.begin().unwrap();
        assert!(matches!(
            load_subtree(&tx, NodeId(404)).unwrap_err(),
            TreeError::NotFound(_)
        ));
    }
}
