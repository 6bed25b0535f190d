use folio_store::ArchiveTx;
use folio_types::DirectoryEntry;
use tracing::debug;

use crate::error::ShimResult;
use crate::stage::{ShimContext, ShimMarker, ShimStage};

/// Add a user directory entry for every referenced username that lacks one.
///
/// Entries are copied from the legacy profile table. A username with no
/// profile still gets an entry carrying only the username. Existing entries
/// are never changed.
pub struct DirectoryShim;

impl ShimStage for DirectoryShim {
    fn name(&self) -> &'static str {
        "directory"
    }

    fn apply(
        &self,
        tx: &mut dyn ArchiveTx,
        context: &mut ShimContext<'_>,
    ) -> ShimResult<ShimMarker> {
        let mut added = 0usize;
        for username in context.event.people() {
            if tx.directory_entry(username)?.is_some() {
                continue;
            }
            let entry = match tx.legacy_profile(username)? {
                Some(profile) => DirectoryEntry::from(profile),
                None => DirectoryEntry::bare(username),
            };
            if tx.insert_directory_entry(entry)? {
                debug!(username, "added directory entry");
                added += 1;
            }
        }
        Ok(ShimMarker::from_changed(added > 0))
    }
}
