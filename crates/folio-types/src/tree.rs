use serde::{Deserialize, Serialize};

use crate::identity::{ModuleIdent, NodeId};

/// One node of a collection-version tree.
///
/// A node without a document reference is a labelled grouping (a chapter or
/// unit heading) with no content of its own. The root node of every tree
/// references the collection's own key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub node_id: NodeId,
    /// `None` for the root.
    pub parent_id: Option<NodeId>,
    pub document: Option<ModuleIdent>,
    /// Overrides the referenced document's title when displayed in this tree.
    pub title: Option<String>,
    /// Position among siblings.
    pub child_order: u32,
    /// Readers should follow the latest version of the referenced document.
    pub track_latest: bool,
}

impl TreeNode {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_grouping(&self) -> bool {
        self.document.is_none()
    }
}

/// One entry of a tree to be inserted alongside a new collection version.
///
/// Drafts describe the nodes beneath a collection's root; the root itself is
/// implicit and always references the collection being published.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeDraft {
    pub title: Option<String>,
    pub document: Option<ModuleIdent>,
    #[serde(default)]
    pub track_latest: bool,
    #[serde(default)]
    pub children: Vec<TreeDraft>,
}

impl TreeDraft {
    /// A leaf entry referencing a document.
    pub fn document(key: ModuleIdent) -> Self {
        Self {
            document: Some(key),
            ..Self::default()
        }
    }

    /// A labelled grouping with the given children.
    pub fn grouping(title: impl Into<String>, children: Vec<TreeDraft>) -> Self {
        Self {
            title: Some(title.into()),
            children,
            ..Self::default()
        }
    }

    /// Number of nodes this entry expands to, including itself.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TreeDraft::node_count).sum::<usize>()
    }
}
