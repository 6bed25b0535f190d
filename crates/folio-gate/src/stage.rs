use std::time::Duration;

use folio_store::ArchiveTx;
use folio_types::PublicationEvent;

use crate::error::ShimResult;

// ---------------------------------------------------------------------------
// ShimMarker
// ---------------------------------------------------------------------------

/// What a stage did. Informational only; neither value is a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShimMarker {
    /// The precondition already held; nothing changed.
    Ok,
    /// The stage filled in a field or wrote rows.
    Modify,
}

impl ShimMarker {
    pub fn is_modify(self) -> bool {
        matches!(self, Self::Modify)
    }

    /// `Modify` when `changed`, else `Ok`.
    pub fn from_changed(changed: bool) -> Self {
        if changed {
            Self::Modify
        } else {
            Self::Ok
        }
    }
}

impl std::fmt::Display for ShimMarker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Ok => "OK",
            Self::Modify => "MODIFY",
        })
    }
}

// ---------------------------------------------------------------------------
// ShimReport
// ---------------------------------------------------------------------------

/// Recorded result from one stage.
#[derive(Clone, Debug)]
pub struct ShimReport {
    pub stage_name: String,
    pub marker: ShimMarker,
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// ShimContext
// ---------------------------------------------------------------------------

/// The event being canonicalized, shared by every stage in a run.
pub struct ShimContext<'e> {
    pub event: &'e mut PublicationEvent,
    /// Whether the event arrived with its own legacy version string.
    /// Captured before any stage runs, since the version stage fills the
    /// string in for every event.
    pub legacy: bool,
    /// Reports of the stages that already ran.
    pub previous_stages: Vec<ShimReport>,
}

impl<'e> ShimContext<'e> {
    pub fn new(event: &'e mut PublicationEvent) -> Self {
        let legacy = folio_ledger::is_legacy_publication(event);
        Self {
            event,
            legacy,
            previous_stages: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// ShimStage trait
// ---------------------------------------------------------------------------

/// One idempotent canonicalization step.
///
/// A stage reads the archive through the caller's transaction, fills in
/// missing event fields or writes rows, and reports whether it changed
/// anything. Running a stage again on its own output must report
/// [`ShimMarker::Ok`] and write nothing.
pub trait ShimStage: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(&self, tx: &mut dyn ArchiveTx, context: &mut ShimContext<'_>)
        -> ShimResult<ShimMarker>;
}
