//! The republish cascade.
//!
//! When a new version of a leaf document is published on the legacy path,
//! every collection whose latest version contains the previous version gets
//! a new minor version. The new collection version is a copy of the old row
//! with `minor + 1`, a fresh key and a fresh revision time; its tree is a
//! copy-on-write clone of the old tree in which the collection's own key and
//! the changed document's key are substituted.

use chrono::Utc;
use folio_ledger::{allocate_key, documents, next_minor};
use folio_store::ArchiveTx;
use folio_tree::{clone_tree, get_containing_collections, Substitution};
use folio_types::{DocumentVersion, ModuleIdent, NodeId, Version};
use tracing::{debug, info};

use crate::error::RepublishResult;
use crate::hook::Publication;

/// Which branch the cascade took.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RepublishOutcome {
    /// Cascading is switched off.
    Disabled,
    /// The publication did not come down the legacy path.
    NotLegacy,
    /// First version of a new work; nothing can contain it yet.
    NewIdentity,
    /// Collection-level changes do not cascade further.
    NotLeaf,
    /// One entry per collection that got a new version. Empty when no
    /// latest collection version contains the document.
    Cascaded(Vec<CascadedCollection>),
}

impl RepublishOutcome {
    /// New collection rows written by the cascade.
    pub fn new_rows(&self) -> Vec<&DocumentVersion> {
        match self {
            Self::Cascaded(collections) => collections.iter().map(|c| &c.row).collect(),
            _ => Vec::new(),
        }
    }
}

/// One collection carried forward by a cascade.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CascadedCollection {
    /// Key of the collection version that was superseded.
    pub previous: ModuleIdent,
    /// The new collection version row.
    pub row: DocumentVersion,
    /// Root of the cloned tree.
    pub root: NodeId,
    /// Associations copied onto the new row.
    pub associations: usize,
}

/// Run the cascade for a freshly inserted version row.
pub fn republish(
    tx: &mut dyn ArchiveTx,
    publication: &Publication,
) -> RepublishResult<RepublishOutcome> {
    let row = &publication.row;
    if !publication.legacy {
        debug!(key = %row.key, "not a legacy publication; no cascade");
        return Ok(RepublishOutcome::NotLegacy);
    }
    let Some(previous) = &publication.previous else {
        debug!(key = %row.key, identity = %row.identity, "new identity; no cascade");
        return Ok(RepublishOutcome::NewIdentity);
    };
    if !row.portal_type.is_leaf() {
        debug!(key = %row.key, "collection publication; no cascade");
        return Ok(RepublishOutcome::NotLeaf);
    }

    let containing = get_containing_collections(tx, previous.key)?;
    let mut cascaded = Vec::with_capacity(containing.len());
    for collection in containing {
        cascaded.push(cascade_into(tx, &collection, previous.key, row.key)?);
    }

    info!(
        document = %row.key,
        previous = %previous.key,
        collections = cascaded.len(),
        "republished containing collections"
    );
    Ok(RepublishOutcome::Cascaded(cascaded))
}

/// Give `collection` a new minor version whose tree references `new_document`
/// wherever the old tree referenced `old_document`.
pub fn cascade_into(
    tx: &mut dyn ArchiveTx,
    collection: &DocumentVersion,
    old_document: ModuleIdent,
    new_document: ModuleIdent,
) -> RepublishResult<CascadedCollection> {
    // Held until the transaction ends. Once granted, reads include whatever
    // the previous holder committed, so a version published meanwhile is
    // the one carried forward.
    tx.lock_identity(collection.identity)?;
    let collection = match documents::latest(tx, &collection.identity)? {
        Some(latest) if latest.key != collection.key => {
            debug!(
                collection = %collection.identity,
                stale = %collection.key,
                latest = %latest.key,
                "collection moved on while waiting for its lock"
            );
            latest
        }
        _ => collection.clone(),
    };

    let minor = next_minor(tx, collection.key)?;
    let key = allocate_key(tx)?;
    let row = DocumentVersion {
        key,
        version: Version::collection(collection.version.major, minor),
        revised: Utc::now(),
        ..collection.clone()
    };
    documents::insert(tx, row.clone())?;

    let mut associations = 0;
    for association in tx.associations(collection.key)? {
        if tx.insert_association(key, association)? {
            associations += 1;
        }
    }

    let substitution = Substitution::new()
        .with(collection.key, key)
        .with(old_document, new_document);
    let root = clone_tree(tx, collection.key, &substitution)?;

    info!(
        collection = %collection.identity,
        previous = %collection.key,
        key = %key,
        version = %row.version,
        "cascaded new collection version"
    );
    Ok(CascadedCollection {
        previous: collection.key,
        row,
        root,
        associations,
    })
}
