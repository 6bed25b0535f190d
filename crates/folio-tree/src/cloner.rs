//! Copy-on-write tree cloning.
//!
//! A republished collection version gets a brand-new node set shaped exactly
//! like its predecessor's tree. The old tree is only read; nothing in it is
//! updated or deleted.

use std::collections::{HashMap, HashSet};

use folio_store::ArchiveTx;
use folio_types::{ModuleIdent, NodeId, TreeNode};
use tracing::{debug, info};

use crate::error::{TreeError, TreeResult};
use crate::store::{next_node_id, root_of};

/// Document references to rewrite while cloning. Keys not present map to
/// themselves.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Substitution {
    map: HashMap<ModuleIdent, ModuleIdent>,
}

impl Substitution {
    /// An empty substitution; every key maps to itself.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Substitution::insert`].
    pub fn with(mut self, from: ModuleIdent, to: ModuleIdent) -> Self {
        self.insert(from, to);
        self
    }

    /// Rewrite `from` to `to`, replacing any earlier mapping for `from`.
    pub fn insert(&mut self, from: ModuleIdent, to: ModuleIdent) {
        self.map.insert(from, to);
    }

    /// The key `key` is rewritten to.
    pub fn apply(&self, key: ModuleIdent) -> ModuleIdent {
        self.map.get(&key).copied().unwrap_or(key)
    }

    /// Whether `key` has an explicit mapping.
    pub fn contains(&self, key: ModuleIdent) -> bool {
        self.map.contains_key(&key)
    }

    /// Number of explicit mappings.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether there are no explicit mappings.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl FromIterator<(ModuleIdent, ModuleIdent)> for Substitution {
    fn from_iter<I: IntoIterator<Item = (ModuleIdent, ModuleIdent)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

impl<const N: usize> From<[(ModuleIdent, ModuleIdent); N]> for Substitution {
    fn from(pairs: [(ModuleIdent, ModuleIdent); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Clone the tree of collection version `source`, rewriting document
/// references through `substitution`, and return the new root.
///
/// The source node set is loaded in one pass and walked depth-first in
/// pre-order; every clone is inserted after its parent's clone, so parent
/// links always point at existing rows. Titles, sibling order and the
/// track-latest flag are copied unchanged.
///
/// The root references the collection itself, so a republish must map the
/// old collection key to the new one as well as the changed document.
pub fn clone_tree(
    tx: &mut dyn ArchiveTx,
    source: ModuleIdent,
    substitution: &Substitution,
) -> TreeResult<NodeId> {
    let root = root_of(tx, source)?
        .ok_or_else(|| TreeError::NotFound(format!("tree of collection {source}")))?;
    let root_id = root.node_id;

    // Parent -> children index over the whole source tree.
    let mut children: HashMap<NodeId, Vec<TreeNode>> = HashMap::new();
    for node in tx.tree_subtree(root_id)? {
        if let Some(parent) = node.parent_id {
            children.entry(parent).or_default().push(node);
        }
    }
    for siblings in children.values_mut() {
        siblings.sort_by_key(|n| (n.child_order, n.node_id));
    }

    // (source node, parent of its clone). Children are pushed in reverse so
    // they pop in sibling order.
    let mut stack: Vec<(TreeNode, Option<NodeId>)> = vec![(root, None)];
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut new_root = None;
    let mut cloned = 0usize;

    while let Some((node, new_parent)) = stack.pop() {
        if !visited.insert(node.node_id) {
            return Err(TreeError::CycleDetected(node.node_id));
        }

        let copy = TreeNode {
            node_id: next_node_id(tx)?,
            parent_id: new_parent,
            document: node.document.map(|key| substitution.apply(key)),
            title: node.title.clone(),
            child_order: node.child_order,
            track_latest: node.track_latest,
        };
        let copy_id = copy.node_id;
        debug!(source = %node.node_id, clone = %copy_id, document = ?copy.document, "cloning node");
        tx.insert_tree_node(copy)?;
        cloned += 1;
        new_root.get_or_insert(copy_id);

        if let Some(kids) = children.remove(&node.node_id) {
            stack.extend(kids.into_iter().rev().map(|kid| (kid, Some(copy_id))));
        }
    }

    let new_root =
        new_root.ok_or_else(|| TreeError::NotFound(format!("tree of collection {source}")))?;
    info!(
        source = %source,
        source_root = %root_id,
        new_root = %new_root,
        nodes = cloned,
        substitutions = substitution.len(),
        "cloned tree"
    );
    Ok(new_root)
}
