//! Compatibility shims for Folio publications.
//!
//! Publications arrive from two callers that fill in different fields: the
//! legacy path sends a version string and usually a legacy id, the newer
//! service sends only an identity. Before a version row is written, every
//! event passes through a fixed pipeline of idempotent stages that fill in
//! what is missing and register the people it names:
//!
//! 1. identity -- keep, reuse by legacy id, or mint
//! 2. legacy_id -- validate and claim, inherit, or allocate
//! 3. version -- reconcile the legacy string with `(major, minor)`
//! 4. directory -- user directory entries for every referenced username
//! 5. acl -- publish rights for authors and maintainers
//!
//! Each stage reports [`ShimMarker::Ok`] when its precondition already held
//! and [`ShimMarker::Modify`] when it changed something.
//!
//! ```rust
//! use folio_gate::{ShimConfig, ShimPipeline};
//! use folio_store::{Archive, InMemoryArchive};
//! use folio_types::PublicationEvent;
//!
//! let archive = InMemoryArchive::new();
//! let mut tx = archive.begin().unwrap();
//! let mut event = PublicationEvent::module("Vectors").with_authors(["alice"]);
//! let outcome = ShimPipeline::with_default_stages(ShimConfig::default())
//!     .run(&mut tx, &mut event)
//!     .unwrap();
//! assert!(outcome.modified());
//! assert_eq!(event.legacy_version.as_deref(), Some("1.1"));
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod stage;
pub mod stages;

pub use config::ShimConfig;
pub use error::{ShimError, ShimResult};
pub use pipeline::{ShimOutcome, ShimPipeline};
pub use stage::{ShimContext, ShimMarker, ShimReport, ShimStage};
pub use stages::{AclShim, DirectoryShim, IdentityShim, LegacyIdShim, VersionShim};
