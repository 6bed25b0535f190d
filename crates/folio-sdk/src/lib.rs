//! High-level publication API for Folio.
//!
//! [`Publisher`] is the main entry point for applications embedding the
//! archive. It ties the compatibility shims, version rows, collection
//! trees, and the republish cascade together, one transaction per
//! publication.
//!
//! ```rust
//! use folio_sdk::{Publisher, PublisherConfig, PublicationEvent, TreeDraft};
//!
//! let publisher = Publisher::in_memory(PublisherConfig::default());
//! let page = publisher
//!     .publish(&PublicationEvent::module("Vectors").with_authors(["alice"]))
//!     .unwrap();
//! let book = publisher
//!     .publish(
//!         &PublicationEvent::collection("Physics")
//!             .with_authors(["alice"])
//!             .with_contents(vec![TreeDraft::document(page.row.key)]),
//!     )
//!     .unwrap();
//! let tree = publisher.get_tree(&book.row.identity, None).unwrap().unwrap();
//! assert_eq!(tree.documents(), vec![page.row.key]);
//! ```

pub mod config;
pub mod error;
pub mod publisher;

pub use config::PublisherConfig;
pub use error::{SdkError, SdkResult};
pub use publisher::{PublishReceipt, Publisher};

// Re-export key types
pub use folio_gate::{ShimConfig, ShimMarker};
pub use folio_republish::{PublishHook, RepublishOutcome};
pub use folio_store::{ArchiveConfig, InMemoryArchive};
pub use folio_tree::Tree;
pub use folio_types::{
    Association, DocumentIdentity, DocumentVersion, LegacyId, ModuleIdent, PortalType,
    PublicationEvent, TreeDraft, Version,
};
