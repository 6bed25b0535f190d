use folio_ledger::{allocate_identity, documents};
use folio_store::ArchiveTx;
use tracing::debug;

use crate::error::{ShimError, ShimResult};
use crate::stage::{ShimContext, ShimMarker, ShimStage};

/// Fill in the document identity.
///
/// A caller-supplied identity is kept. Otherwise the identity of the work
/// already published under the event's legacy id is reused, or a fresh one
/// is minted.
pub struct IdentityShim;

impl ShimStage for IdentityShim {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn apply(
        &self,
        tx: &mut dyn ArchiveTx,
        context: &mut ShimContext<'_>,
    ) -> ShimResult<ShimMarker> {
        let event = &mut *context.event;

        if let Some(identity) = event.identity {
            if let Some(legacy_id) = &event.legacy_id {
                if let Some(current) = documents::get_current(tx, legacy_id)? {
                    if current.identity != identity {
                        return Err(ShimError::InvalidEvent(format!(
                            "legacy id {legacy_id} belongs to {}, not {identity}",
                            current.identity
                        )));
                    }
                }
            }
            return Ok(ShimMarker::Ok);
        }

        let identity = allocate_identity(tx, event.legacy_id.as_ref())?;
        debug!(%identity, legacy_id = ?event.legacy_id, "defaulted identity");
        event.identity = Some(identity);
        Ok(ShimMarker::Modify)
    }
}
