//! Transactional storage contract for Folio.
//!
//! The versioning engine never talks to a database directly. Every component
//! receives an explicit transaction handle implementing [`ArchiveTx`] and
//! issues its reads and writes through it; whoever opened the transaction
//! decides whether it commits or rolls back.
//!
//! # Storage Contract
//!
//! - Reads inside a transaction see a consistent snapshot plus the
//!   transaction's own writes.
//! - Commit is all-or-nothing. Dropping an uncommitted transaction rolls it
//!   back.
//! - `(identity, major, minor)` is unique; tree nodes must reference an
//!   existing parent and document.
//! - Sequences are atomic and non-transactional: a rolled-back transaction
//!   leaves a gap, never a reused value.
//! - Advisory locks are keyed by document identity and held until the
//!   transaction ends.
//!
//! # Backends
//!
//! - [`InMemoryArchive`] -- snapshot-isolated store for tests and embedding

pub mod config;
pub mod error;
pub mod locks;
pub mod memory;
pub mod sequence;
pub mod traits;

pub use config::ArchiveConfig;
pub use error::{StoreError, StoreResult};
pub use locks::AdvisoryLocks;
pub use memory::{InMemoryArchive, MemoryTransaction};
pub use sequence::{AtomicSequence, Sequence, SequenceName};
pub use traits::{Archive, ArchiveTx, Transaction};
