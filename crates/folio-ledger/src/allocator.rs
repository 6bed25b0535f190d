//! Identity and version allocation.
//!
//! Two publication paths feed the archive. The legacy path supplies a
//! version string (`"1.7"`) and usually a legacy id; the newer path supplies
//! only an identity. The functions here fill in whatever is missing so both
//! converge on the same row shape. Every allocation failure is an error;
//! nothing is silently skipped.
//!
//! Counters are [`folio_store::Sequence`]s reached through the transaction,
//! so "next value" is an atomic fetch-and-increment and "advance past a
//! declared value" is `bump_to_at_least(declared + 1)`.

use folio_store::{ArchiveTx, SequenceName};
use folio_types::{
    DocumentIdentity, LegacyId, ModuleIdent, PortalType, PublicationEvent, Version,
};
use tracing::debug;

use crate::documents;
use crate::error::{LedgerError, LedgerResult};

/// Identity for a new version.
///
/// When `legacy_id` already maps to a published version, that version's
/// identity is returned so every version of a work shares one identity.
/// Otherwise a fresh identity is minted.
pub fn allocate_identity(
    tx: &dyn ArchiveTx,
    legacy_id: Option<&LegacyId>,
) -> LedgerResult<DocumentIdentity> {
    if let Some(legacy_id) = legacy_id {
        if let Some(current) = documents::get_current(tx, legacy_id)? {
            debug!(%legacy_id, identity = %current.identity, "reusing identity");
            return Ok(current.identity);
        }
    }
    let identity = DocumentIdentity::new();
    debug!(identity = %identity, "minted identity");
    Ok(identity)
}

/// Next unused legacy id for a portal type (`mN` or `colN`).
pub fn allocate_legacy_id(
    tx: &mut dyn ArchiveTx,
    portal_type: PortalType,
) -> LedgerResult<LegacyId> {
    let number = tx.next_value(SequenceName::legacy_for(portal_type))?;
    let legacy_id = LegacyId::new(portal_type, number);
    debug!(%legacy_id, "allocated legacy id");
    Ok(legacy_id)
}

/// Record an explicitly declared legacy id so later allocations never reuse
/// it. Returns the next number the counter will hand out.
pub fn claim_legacy_id(tx: &mut dyn ArchiveTx, declared: &LegacyId) -> LedgerResult<u64> {
    let floor = declared.number.checked_add(1).ok_or_else(|| {
        LedgerError::InvariantViolation(format!("legacy id {declared} exhausts its sequence"))
    })?;
    let next = tx.bump_to_at_least(SequenceName::legacy_for(declared.portal_type), floor)?;
    debug!(%declared, next, "claimed legacy id");
    Ok(next)
}

/// Fresh surrogate key for a version row.
pub fn allocate_key(tx: &mut dyn ArchiveTx) -> LedgerResult<ModuleIdent> {
    let value = tx.next_value(SequenceName::ModuleIdent)?;
    let key = i64::try_from(value).map_err(|_| {
        LedgerError::InvariantViolation(format!("module_ident sequence overflowed at {value}"))
    })?;
    Ok(ModuleIdent(key))
}

/// Map a legacy version string onto `(major, minor)`.
///
/// Legacy strings have the form `L.M`. The major version is
/// `M + L - 1`: the common `1.N` maps to `N`, and the old modules packaged
/// as `2.x` with 0-based minors map to `x + 1`.
///
/// Modules carry only a major version, so `minor` must be `None`.
/// Collections need both, so `minor` must be present.
pub fn derive_version(
    portal_type: PortalType,
    legacy_version: &str,
    minor: Option<u32>,
) -> LedgerResult<Version> {
    let invalid = || LedgerError::InvalidVersion(legacy_version.to_string());
    let (legacy_major, legacy_minor) = legacy_version.split_once('.').ok_or_else(invalid)?;
    let legacy_major: u32 = legacy_major.parse().map_err(|_| invalid())?;
    let legacy_minor: u32 = legacy_minor.parse().map_err(|_| invalid())?;
    if legacy_major == 0 {
        return Err(invalid());
    }

    let major = legacy_minor
        .checked_add(legacy_major - 1)
        .filter(|m| *m > 0)
        .ok_or_else(invalid)?;

    match (portal_type, minor) {
        (PortalType::Module, None) => Ok(Version::module(major)),
        (PortalType::Module, Some(minor)) => Err(LedgerError::InvalidVersion(format!(
            "module version {legacy_version} cannot carry minor version {minor}"
        ))),
        (PortalType::Collection, Some(minor)) => Ok(Version::collection(major, minor)),
        (PortalType::Collection, None) => Err(LedgerError::InvalidVersion(format!(
            "collection version {legacy_version} requires a minor version"
        ))),
    }
}

/// Legacy version string for a major version: `1.{major}`.
pub fn legacy_version_string(major: u32) -> String {
    format!("1.{major}")
}

/// Whether the event came down the legacy path, i.e. supplied its own
/// version string.
pub fn is_legacy_publication(event: &PublicationEvent) -> bool {
    event.legacy_version.is_some()
}
