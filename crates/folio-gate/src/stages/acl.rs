use folio_store::ArchiveTx;
use folio_types::{AclEntry, Permission};
use tracing::debug;

use crate::error::{ShimError, ShimResult};
use crate::stage::{ShimContext, ShimMarker, ShimStage};

/// Grant publish rights on the work to every author and maintainer.
///
/// Additive only: entries are inserted when missing and never revoked.
pub struct AclShim;

impl ShimStage for AclShim {
    fn name(&self) -> &'static str {
        "acl"
    }

    fn apply(
        &self,
        tx: &mut dyn ArchiveTx,
        context: &mut ShimContext<'_>,
    ) -> ShimResult<ShimMarker> {
        let identity = context.event.identity.ok_or(ShimError::MissingField {
            stage: "acl",
            field: "identity",
        })?;

        let mut granted = 0usize;
        for user in context.event.acl_users() {
            let entry = AclEntry {
                identity,
                user_id: user.to_string(),
                permission: Permission::Publish,
            };
            if tx.insert_acl_entry(entry)? {
                debug!(%identity, user, "granted publish");
                granted += 1;
            }
        }
        Ok(ShimMarker::from_changed(granted > 0))
    }
}
