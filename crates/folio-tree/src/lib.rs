//! Collection trees for Folio.
//!
//! A collection version owns an ordered tree of [`folio_types::TreeNode`]s.
//! The root references the collection itself; every other node either
//! references a document version or is a labelled grouping. Trees are
//! written once per collection version and never patched: a change produces
//! a whole new tree via [`clone_tree`].
//!
//! - [`store`] -- load trees, insert drafted trees, find containing collections
//! - [`cloner`] -- copy-on-write duplication with document substitution
//! - [`tree`] -- the loaded, in-memory [`Tree`] shape
//!
//! # Invariants
//!
//! - Exactly one root per collection version.
//! - No node repeats on any root-to-node path.
//! - Siblings are totally ordered by `(child_order, node_id)`.

pub mod cloner;
pub mod error;
pub mod store;
pub mod tree;

#[cfg(test)]
mod testing;

pub use cloner::{clone_tree, Substitution};
pub use error::{TreeError, TreeResult};
pub use store::{get_containing_collections, get_tree, insert_tree, load_subtree, load_tree};
pub use tree::{PreOrder, ShapeEntry, Tree, TreeItem};
