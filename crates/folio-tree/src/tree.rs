use serde::{Deserialize, Serialize};

use folio_types::{ModuleIdent, TreeNode};

/// One loaded node and its ordered children.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeItem {
    pub node: TreeNode,
    pub children: Vec<TreeItem>,
}

impl TreeItem {
    /// Depth-first, pre-order iterator over this item and its descendants.
    pub fn walk(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![self] }
    }

    /// Height of the subtree rooted here (a leaf has depth 1).
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(TreeItem::depth).max().unwrap_or(0)
    }
}

/// Pre-order traversal over a [`TreeItem`].
pub struct PreOrder<'a> {
    stack: Vec<&'a TreeItem>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a TreeItem;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.stack.pop()?;
        self.stack.extend(item.children.iter().rev());
        Some(item)
    }
}

/// A fully loaded collection tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    pub root: TreeItem,
}

/// Node content with ids stripped: what two isomorphic trees share.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShapeEntry {
    pub depth: usize,
    pub document: Option<ModuleIdent>,
    pub title: Option<String>,
    pub child_order: u32,
    pub track_latest: bool,
}

impl Tree {
    /// Key of the collection version this tree belongs to.
    pub fn collection(&self) -> Option<ModuleIdent> {
        self.root.node.document
    }

    pub fn node_count(&self) -> usize {
        self.root.walk().count()
    }

    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    /// Nodes in depth-first pre-order.
    pub fn nodes(&self) -> impl Iterator<Item = &TreeNode> {
        self.root.walk().map(|item| &item.node)
    }

    /// Document references below the root, in pre-order. Groupings are
    /// skipped.
    pub fn documents(&self) -> Vec<ModuleIdent> {
        self.root
            .children
            .iter()
            .flat_map(TreeItem::walk)
            .filter_map(|item| item.node.document)
            .collect()
    }

    /// Whether any node below the root references `key`.
    pub fn contains(&self, key: ModuleIdent) -> bool {
        self.documents().contains(&key)
    }

    /// Pre-order shape of the tree, independent of node ids.
    pub fn shape(&self) -> Vec<ShapeEntry> {
        fn visit(item: &TreeItem, depth: usize, out: &mut Vec<ShapeEntry>) {
            out.push(ShapeEntry {
                depth,
                document: item.node.document,
                title: item.node.title.clone(),
                child_order: item.node.child_order,
                track_latest: item.node.track_latest,
            });
            for child in &item.children {
                visit(child, depth + 1, out);
            }
        }
        let mut out = Vec::new();
        visit(&self.root, 0, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_types::NodeId;

    fn item(id: i64, document: Option<i64>, children: Vec<TreeItem>) -> TreeItem {
        TreeItem {
            node: TreeNode {
                node_id: NodeId(id),
                parent_id: None,
                document: document.map(ModuleIdent),
                title: None,
                child_order: 0,
                track_latest: false,
            },
            children,
        }
    }

    fn sample() -> Tree {
        Tree {
            root: item(
                1,
                Some(20),
                vec![
                    item(2, None, vec![item(3, Some(10), vec![]), item(4, Some(11), vec![])]),
                    item(5, Some(12), vec![]),
                ],
            ),
        }
    }

    #[test]
    fn walk_is_pre_order() {
        let ids: Vec<_> = sample().nodes().map(|n| n.node_id.0).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn documents_skip_root_and_groupings() {
        let tree = sample();
        assert_eq!(tree.collection(), Some(ModuleIdent(20)));
        assert_eq!(
            tree.documents(),
            vec![ModuleIdent(10), ModuleIdent(11), ModuleIdent(12)]
        );
        assert!(tree.contains(ModuleIdent(11)));
        assert!(!tree.contains(ModuleIdent(20)));
    }

    #[test]
    fn counts_and_depth() {
        let tree = sample();
        assert_eq!(tree.node_count(), 5);
        assert_eq!(tree.depth(), 3);
    }

    #[test]
    fn shape_ignores_node_ids() {
        let a = sample();
        let mut b = sample();
        b.root.node.node_id = NodeId(100);
        b.root.children[0].node.node_id = NodeId(200);
        assert_eq!(a.shape(), b.shape());
        assert_eq!(a.shape()[2].depth, 2);
    }
}
