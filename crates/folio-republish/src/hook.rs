use folio_store::ArchiveTx;
use folio_types::DocumentVersion;

use crate::coordinator::{republish, RepublishOutcome};
use crate::error::RepublishResult;

/// A version row that was just inserted, as seen by post-insert hooks.
#[derive(Clone, Debug)]
pub struct Publication {
    /// The row as written.
    pub row: DocumentVersion,
    /// The version of the same work that was current before the insert:
    /// the current row for the legacy id, else the work's latest version.
    /// `None` for the first version of a new work.
    pub previous: Option<DocumentVersion>,
    /// Whether the publication arrived on the legacy path.
    pub legacy: bool,
}

/// Work run after a version row is inserted, inside the same transaction.
///
/// A hook error aborts the publication.
pub trait PublishHook: Send + Sync {
    fn name(&self) -> &str;

    fn after_insert(
        &self,
        tx: &mut dyn ArchiveTx,
        publication: &Publication,
    ) -> RepublishResult<RepublishOutcome>;
}

/// Cascades leaf-document changes into every containing collection.
pub struct RepublishHook;

impl PublishHook for RepublishHook {
    fn name(&self) -> &str {
        "republish"
    }

    fn after_insert(
        &self,
        tx: &mut dyn ArchiveTx,
        publication: &Publication,
    ) -> RepublishResult<RepublishOutcome> {
        republish(tx, publication)
    }
}

/// Does nothing. Used when cascading is switched off.
pub struct NoOpHook;

impl PublishHook for NoOpHook {
    fn name(&self) -> &str {
        "noop"
    }

    fn after_insert(
        &self,
        _tx: &mut dyn ArchiveTx,
        _publication: &Publication,
    ) -> RepublishResult<RepublishOutcome> {
        Ok(RepublishOutcome::Disabled)
    }
}
