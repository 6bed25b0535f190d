//! Foundation types for Folio.
//!
//! This crate provides the data model shared by every other Folio crate: the
//! identities and surrogate keys that name published content, the version
//! numbers attached to it, the persisted row shapes, and the typed publication
//! event that enters the engine.
//!
//! # Key Types
//!
//! - [`DocumentIdentity`] -- Stable identifier for "the same work" across versions
//! - [`ModuleIdent`] -- Surrogate key of one exact version row, never reused
//! - [`Version`] -- `(major, minor?)` pair, ordered numerically
//! - [`LegacyId`] -- Opaque `mNNNN` / `colNNNN` identifier from the legacy system
//! - [`DocumentVersion`] -- One immutable published version
//! - [`TreeNode`] -- One node of a collection's ordered tree
//! - [`PublicationEvent`] -- The inbound "document version committed" payload

pub mod access;
pub mod document;
pub mod error;
pub mod event;
pub mod identity;
pub mod legacy;
pub mod tree;
pub mod version;

pub use access::{AclEntry, DirectoryEntry, LegacyProfile, Permission};
pub use document::{Association, DocumentVersion, PortalType};
pub use error::TypeError;
pub use event::PublicationEvent;
pub use identity::{DocumentIdentity, IdentityRecord, ModuleIdent, NodeId};
pub use legacy::LegacyId;
pub use tree::{TreeDraft, TreeNode};
pub use version::Version;
