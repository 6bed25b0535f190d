use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::DocumentIdentity;

/// Permission granted by an ACL entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Permission {
    /// May publish new versions of the work.
    Publish,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Publish => f.write_str("publish"),
        }
    }
}

/// Membership of one user in a work's access-control list. Additive only.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AclEntry {
    pub identity: DocumentIdentity,
    pub user_id: String,
    pub permission: Permission,
}

/// A user profile row from the legacy person table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyProfile {
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
}

/// A user directory entry, materialized the first time a publication
/// references the username.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
}

impl DirectoryEntry {
    /// An entry carrying only the username.
    pub fn bare(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            first_name: None,
            last_name: None,
            full_name: None,
            email: None,
        }
    }
}

impl From<LegacyProfile> for DirectoryEntry {
    fn from(p: LegacyProfile) -> Self {
        Self {
            username: p.username,
            first_name: p.first_name,
            last_name: p.last_name,
            full_name: p.full_name,
            email: p.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_entry_from_profile_keeps_fields() {
        let entry = DirectoryEntry::from(LegacyProfile {
            username: "alice".into(),
            first_name: Some("Alice".into()),
            last_name: Some("Liddell".into()),
            full_name: Some("Alice Liddell".into()),
            email: None,
        });
        assert_eq!(entry.username, "alice");
        assert_eq!(entry.full_name.as_deref(), Some("Alice Liddell"));
    }

    #[test]
    fn bare_entry_has_only_username() {
        let entry = DirectoryEntry::bare("bob");
        assert_eq!(entry.username, "bob");
        assert!(entry.first_name.is_none() && entry.email.is_none());
    }

    #[test]
    fn permission_display() {
        assert_eq!(Permission::Publish.to_string(), "publish");
    }
}
