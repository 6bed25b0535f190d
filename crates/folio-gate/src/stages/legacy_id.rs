use folio_ledger::{allocate_legacy_id, claim_legacy_id, documents};
use folio_store::{ArchiveTx, SequenceName};
use tracing::debug;

use crate::error::{ShimError, ShimResult};
use crate::stage::{ShimContext, ShimMarker, ShimStage};

/// Fill in or validate the legacy id and keep its counter ahead of it.
///
/// - A declared id must match the event's portal type; the counter is
///   advanced past it so it is never handed out again.
/// - An existing work without a declared id keeps the id of its latest
///   version.
/// - Anything else gets the next id from the counter.
pub struct LegacyIdShim;

impl ShimStage for LegacyIdShim {
    fn name(&self) -> &'static str {
        "legacy_id"
    }

    fn apply(
        &self,
        tx: &mut dyn ArchiveTx,
        context: &mut ShimContext<'_>,
    ) -> ShimResult<ShimMarker> {
        let event = &mut *context.event;

        if let Some(declared) = &event.legacy_id {
            if declared.portal_type != event.portal_type {
                return Err(ShimError::InvalidEvent(format!(
                    "legacy id {declared} cannot name a {}",
                    event.portal_type
                )));
            }
            let sequence = SequenceName::legacy_for(declared.portal_type);
            if tx.peek_value(sequence)? > declared.number {
                return Ok(ShimMarker::Ok);
            }
            let next = claim_legacy_id(tx, declared)?;
            debug!(%declared, next, "advanced legacy id counter");
            return Ok(ShimMarker::Modify);
        }

        let inherited = match &event.identity {
            Some(identity) => documents::latest(tx, identity)?.map(|row| row.legacy_id),
            None => None,
        };
        let legacy_id = match inherited {
            Some(legacy_id) => legacy_id,
            None => allocate_legacy_id(tx, event.portal_type)?,
        };
        debug!(%legacy_id, "defaulted legacy id");
        event.legacy_id = Some(legacy_id);
        Ok(ShimMarker::Modify)
    }
}
