//! Built-in shim stages, in pipeline order.

pub mod acl;
pub mod directory;
pub mod identity;
pub mod legacy_id;
pub mod version;

pub use acl::AclShim;
pub use directory::DirectoryShim;
pub use identity::IdentityShim;
pub use legacy_id::LegacyIdShim;
pub use version::VersionShim;
