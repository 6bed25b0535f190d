//! Versioned document access.
//!
//! Version rows are immutable, so every "current" or "latest" answer is a
//! query over the rows of one work. Two orderings coexist and must not be
//! confused:
//!
//! - [`get_current`] picks the most recently *revised* row for a legacy id.
//! - [`latest`] and [`resolve`] pick the numerically greatest
//!   `(major, minor)`. A backfilled row with an older revision date but a
//!   higher number therefore outranks a chronologically newer one.

use folio_store::ArchiveTx;
use folio_types::{DocumentIdentity, DocumentVersion, LegacyId, ModuleIdent, Version};
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};

/// A version row by key, if it exists.
pub fn get(tx: &dyn ArchiveTx, key: ModuleIdent) -> LedgerResult<Option<DocumentVersion>> {
    Ok(tx.document(key)?)
}

/// A version row by key; absence is an error.
pub fn require(tx: &dyn ArchiveTx, key: ModuleIdent) -> LedgerResult<DocumentVersion> {
    get(tx, key)?.ok_or_else(|| LedgerError::NotFound(format!("document key {key}")))
}

/// The most recently revised version published under `legacy_id`, or `None`
/// for a legacy id that has never been published.
pub fn get_current(
    tx: &dyn ArchiveTx,
    legacy_id: &LegacyId,
) -> LedgerResult<Option<DocumentVersion>> {
    Ok(tx
        .documents_by_legacy_id(legacy_id)?
        .into_iter()
        .max_by(|a, b| a.revised.cmp(&b.revised).then(a.key.cmp(&b.key))))
}

/// The numerically greatest version of a work.
pub fn latest(
    tx: &dyn ArchiveTx,
    identity: &DocumentIdentity,
) -> LedgerResult<Option<DocumentVersion>> {
    Ok(tx
        .documents_by_identity(identity)?
        .into_iter()
        .max_by_key(|row| row.version))
}

/// Whether `row` is the latest version of its work.
pub fn is_latest(tx: &dyn ArchiveTx, row: &DocumentVersion) -> LedgerResult<bool> {
    Ok(latest(tx, &row.identity)?.is_some_and(|l| l.key == row.key))
}

/// Every version of a work, oldest version number first.
pub fn history(
    tx: &dyn ArchiveTx,
    identity: &DocumentIdentity,
) -> LedgerResult<Vec<DocumentVersion>> {
    let mut rows = tx.documents_by_identity(identity)?;
    rows.sort_by_key(|row| row.version);
    Ok(rows)
}

/// Surrogate key for a work at a version.
///
/// With `version` omitted this is the latest version; otherwise the exact
/// `(major, minor)` match. Returns `Ok(None)` when nothing matches.
pub fn resolve(
    tx: &dyn ArchiveTx,
    identity: &DocumentIdentity,
    version: Option<Version>,
) -> LedgerResult<Option<ModuleIdent>> {
    let key = match version {
        None => latest(tx, identity)?.map(|row| row.key),
        Some(version) => tx
            .documents_by_identity(identity)?
            .into_iter()
            .find(|row| row.version == version)
            .map(|row| row.key),
    };
    debug!(identity = %identity, ?version, ?key, "resolved document");
    Ok(key)
}

/// The minor version of a row. Rows without one (modules) are an error.
pub fn get_minor(tx: &dyn ArchiveTx, key: ModuleIdent) -> LedgerResult<u32> {
    let row = require(tx, key)?;
    row.version.minor.ok_or_else(|| {
        LedgerError::InvalidVersion(format!(
            "{} {key} has no minor version",
            row.portal_type
        ))
    })
}

/// The minor version the next republication of `key` should carry.
///
/// This is a read; the value is only meaningful inside the same
/// transaction, under the same advisory lock, as the insert that uses it.
pub fn next_minor(tx: &dyn ArchiveTx, key: ModuleIdent) -> LedgerResult<u32> {
    get_minor(tx, key)?.checked_add(1).ok_or_else(|| {
        LedgerError::InvariantViolation(format!("minor version of {key} overflowed"))
    })
}

/// Insert a version row, enforcing `(identity, major, minor)` uniqueness.
pub fn insert(tx: &mut dyn ArchiveTx, row: DocumentVersion) -> LedgerResult<()> {
    debug!(
        key = %row.key,
        identity = %row.identity,
        version = %row.version,
        portal_type = %row.portal_type,
        "inserting document version"
    );
    tx.insert_document(row)?;
    Ok(())
}
