use chrono::Utc;
use folio_gate::{ShimOutcome, ShimPipeline};
use folio_ledger::{allocate_key, documents};
use folio_republish::{NoOpHook, Publication, PublishHook, RepublishHook, RepublishOutcome};
use folio_store::{Archive, ArchiveTx, InMemoryArchive, Transaction};
use folio_tree::{get_containing_collections, insert_tree, Tree};
use folio_types::{
    DocumentIdentity, DocumentVersion, IdentityRecord, ModuleIdent, NodeId, PortalType,
    PublicationEvent, Version,
};
use tracing::{debug, info, warn};

use crate::config::PublisherConfig;
use crate::error::{SdkError, SdkResult};

/// What a successful publication wrote.
#[derive(Clone, Debug)]
pub struct PublishReceipt {
    /// The new version row.
    pub row: DocumentVersion,
    /// Root of the tree inserted with a collection version.
    pub tree_root: Option<NodeId>,
    /// What the shim pipeline did to the event.
    pub shims: ShimOutcome,
    /// What the post-insert hook did.
    pub cascade: RepublishOutcome,
    /// Attempts used, counting the successful one.
    pub attempts: u32,
}

/// The single publication entry point.
///
/// Each call to [`Publisher::publish`] runs in one transaction: shims,
/// identity record, version row, associations, tree, post-insert hook,
/// commit. A publication that loses a race at commit time is retried from
/// scratch; any other error is returned and nothing is written.
pub struct Publisher<A: Archive> {
    archive: A,
    shims: ShimPipeline,
    hook: Box<dyn PublishHook>,
    config: PublisherConfig,
}

impl Publisher<InMemoryArchive> {
    /// A publisher over a fresh in-memory archive.
    pub fn in_memory(config: PublisherConfig) -> Self {
        let archive = InMemoryArchive::with_config(config.archive.clone());
        Self::new(archive, config)
    }
}

impl<A: Archive> Publisher<A> {
    pub fn new(archive: A, config: PublisherConfig) -> Self {
        let hook: Box<dyn PublishHook> = if config.cascade_enabled {
            Box::new(RepublishHook)
        } else {
            Box::new(NoOpHook)
        };
        Self {
            archive,
            shims: ShimPipeline::with_default_stages(config.shims.clone()),
            hook,
            config,
        }
    }

    /// Replace the post-insert hook.
    pub fn with_hook(mut self, hook: Box<dyn PublishHook>) -> Self {
        self.hook = hook;
        self
    }

    pub fn archive(&self) -> &A {
        &self.archive
    }

    pub fn config(&self) -> &PublisherConfig {
        &self.config
    }

    /// Publish a document or collection version.
    pub fn publish(&self, event: &PublicationEvent) -> SdkResult<PublishReceipt> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.publish_once(event) {
                Ok(mut receipt) => {
                    receipt.attempts = attempts;
                    return Ok(receipt);
                }
                Err(e) if e.is_retryable() && attempts <= self.config.max_conflict_retries => {
                    warn!(attempt = attempts, error = %e, title = %event.title, "publication conflicted; retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn publish_once(&self, event: &PublicationEvent) -> SdkResult<PublishReceipt> {
        let mut tx = self.archive.begin()?;
        let mut event = event.clone();
        let shims = self.shims.run(&mut tx, &mut event)?;

        let identity = event.identity.ok_or(SdkError::IncompleteEvent("identity"))?;
        let legacy_id = event
            .legacy_id
            .clone()
            .ok_or(SdkError::IncompleteEvent("legacy id"))?;
        // An existing work may arrive under a legacy id it has not used yet.
        let previous = match documents::get_current(&tx, &legacy_id)? {
            Some(current) => Some(current),
            None => documents::latest(&tx, &identity)?,
        };

        if tx.identity(&identity)?.is_none() {
            tx.insert_identity(IdentityRecord {
                identity,
                license_url: event.license_url.clone(),
            })?;
        }

        let key = allocate_key(&mut tx)?;
        let row = canonical_row(&event, key)?;
        documents::insert(&mut tx, row.clone())?;

        for association in &event.associations {
            tx.insert_association(key, association.clone())?;
        }

        let tree_root = match row.portal_type {
            PortalType::Collection => Some(insert_tree(&mut tx, key, &event.contents)?),
            PortalType::Module => None,
        };

        let publication = Publication {
            row: row.clone(),
            previous,
            legacy: shims.legacy,
        };
        let cascade = self.hook.after_insert(&mut tx, &publication)?;
        debug!(hook = self.hook.name(), ?cascade, "post-insert hook finished");

        tx.commit()?;
        info!(
            key = %row.key,
            identity = %row.identity,
            version = %row.version,
            portal_type = %row.portal_type,
            cascaded = cascade.new_rows().len(),
            "published"
        );
        Ok(PublishReceipt {
            row,
            tree_root,
            shims,
            cascade,
            attempts: 1,
        })
    }

    // ---- Readers ----

    /// Surrogate key of a work at a version, or of its latest version.
    pub fn resolve(
        &self,
        identity: &DocumentIdentity,
        version: Option<Version>,
    ) -> SdkResult<Option<ModuleIdent>> {
        self.read(|tx| Ok(documents::resolve(tx, identity, version)?))
    }

    pub fn document(&self, key: ModuleIdent) -> SdkResult<Option<DocumentVersion>> {
        self.read(|tx| Ok(documents::get(tx, key)?))
    }

    /// Every version of a work, lowest version first.
    pub fn history(&self, identity: &DocumentIdentity) -> SdkResult<Vec<DocumentVersion>> {
        self.read(|tx| Ok(documents::history(tx, identity)?))
    }

    /// Tree of a collection at a version, or of its latest version.
    pub fn get_tree(
        &self,
        identity: &DocumentIdentity,
        version: Option<Version>,
    ) -> SdkResult<Option<Tree>> {
        self.read(|tx| Ok(folio_tree::get_tree(tx, identity, version)?))
    }

    /// Latest collection versions containing a document version.
    pub fn containing_collections(&self, key: ModuleIdent) -> SdkResult<Vec<DocumentVersion>> {
        self.read(|tx| Ok(get_containing_collections(tx, key)?))
    }

    fn read<T>(&self, f: impl FnOnce(&dyn ArchiveTx) -> SdkResult<T>) -> SdkResult<T> {
        let tx = self.archive.begin()?;
        let value = f(&tx)?;
        tx.rollback()?;
        Ok(value)
    }
}

/// Build the version row for a canonicalized event.
fn canonical_row(event: &PublicationEvent, key: ModuleIdent) -> SdkResult<DocumentVersion> {
    let major = event.major.ok_or(SdkError::IncompleteEvent("major version"))?;
    if event.portal_type == PortalType::Collection && event.minor.is_none() {
        return Err(SdkError::IncompleteEvent("minor version"));
    }
    Ok(DocumentVersion {
        key,
        identity: event.identity.ok_or(SdkError::IncompleteEvent("identity"))?,
        version: Version {
            major,
            minor: event.minor,
        },
        portal_type: event.portal_type,
        legacy_id: event
            .legacy_id
            .clone()
            .ok_or(SdkError::IncompleteEvent("legacy id"))?,
        legacy_version: event
            .legacy_version
            .clone()
            .ok_or(SdkError::IncompleteEvent("legacy version"))?,
        title: event.title.clone(),
        authors: event.authors.clone(),
        maintainers: event.maintainers.clone(),
        licensors: event.licensors.clone(),
        abstract_id: event.abstract_id,
        license_url: event.license_url.clone(),
        revised: Utc::now(),
    })
}
