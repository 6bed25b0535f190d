//! Versioned document records for Folio.
//!
//! This crate provides:
//! - [`allocator`] -- identities, legacy ids, surrogate keys, and the mapping
//!   from legacy version strings to `(major, minor)` numbers
//! - [`documents`] -- current/latest lookup, exact resolution, and minor
//!   version arithmetic over immutable version rows
//!
//! Everything runs against an explicit [`folio_store::ArchiveTx`] handle.

pub mod allocator;
pub mod documents;
pub mod error;

pub use allocator::{
    allocate_identity, allocate_key, allocate_legacy_id, claim_legacy_id, derive_version,
    is_legacy_publication, legacy_version_string,
};
pub use documents::{get_current, get_minor, latest, next_minor, resolve};
pub use error::{LedgerError, LedgerResult};
