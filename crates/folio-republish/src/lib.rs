//! Cascading republication for Folio.
//!
//! A document published into the archive may sit in any number of
//! collections. When a leaf document gets a new version on the legacy
//! path, each collection whose latest version contains it is carried
//! forward: a new minor version row, copied associations, and a cloned
//! tree pointing at the new document. Old rows and old trees are never
//! touched.
//!
//! The cascade runs as a [`PublishHook`] inside the publishing
//! transaction, so either every containing collection moves forward or
//! none does.

pub mod coordinator;
pub mod error;
pub mod hook;

pub use coordinator::{cascade_into, republish, CascadedCollection, RepublishOutcome};
pub use error::{RepublishError, RepublishResult};
pub use hook::{NoOpHook, Publication, PublishHook, RepublishHook};
