use serde::{Deserialize, Serialize};

use crate::document::{unique_names, Association, PortalType};
use crate::identity::DocumentIdentity;
use crate::legacy::LegacyId;
use crate::tree::TreeDraft;

/// The inbound "document version committed" payload.
///
/// Built once at the publication entry point and passed by reference through
/// the shim pipeline, which fills in whatever the caller left unset. Two
/// kinds of caller produce these:
///
/// - the legacy path supplies `legacy_version` (and usually `legacy_id`)
///   directly;
/// - the newer publication service supplies only `identity` and lets the
///   version be derived.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationEvent {
    pub portal_type: PortalType,
    pub identity: Option<DocumentIdentity>,
    pub legacy_id: Option<LegacyId>,
    pub legacy_version: Option<String>,
    pub major: Option<u32>,
    pub minor: Option<u32>,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub maintainers: Vec<String>,
    #[serde(default)]
    pub licensors: Vec<String>,
    pub abstract_id: Option<i64>,
    pub license_url: Option<String>,
    #[serde(default)]
    pub associations: Vec<Association>,
    /// Nodes beneath the root of a collection's tree. Ignored for modules.
    #[serde(default)]
    pub contents: Vec<TreeDraft>,
}

impl PublicationEvent {
    /// An event for a new module version with nothing pre-assigned.
    pub fn module(title: impl Into<String>) -> Self {
        Self::new(PortalType::Module, title)
    }

    /// An event for a new collection version with nothing pre-assigned.
    pub fn collection(title: impl Into<String>) -> Self {
        Self::new(PortalType::Collection, title)
    }

    fn new(portal_type: PortalType, title: impl Into<String>) -> Self {
        Self {
            portal_type,
            identity: None,
            legacy_id: None,
            legacy_version: None,
            major: None,
            minor: None,
            title: title.into(),
            authors: Vec::new(),
            maintainers: Vec::new(),
            licensors: Vec::new(),
            abstract_id: None,
            license_url: None,
            associations: Vec::new(),
            contents: Vec::new(),
        }
    }

    pub fn with_identity(mut self, identity: DocumentIdentity) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_legacy_id(mut self, legacy_id: LegacyId) -> Self {
        self.legacy_id = Some(legacy_id);
        self
    }

    pub fn with_legacy_version(mut self, version: impl Into<String>) -> Self {
        self.legacy_version = Some(version.into());
        self
    }

    pub fn with_major(mut self, major: u32) -> Self {
        self.major = Some(major);
        self
    }

    pub fn with_minor(mut self, minor: u32) -> Self {
        self.minor = Some(minor);
        self
    }

    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_maintainers<I, S>(mut self, maintainers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.maintainers = maintainers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_licensors<I, S>(mut self, licensors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.licensors = licensors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_license(mut self, url: impl Into<String>) -> Self {
        self.license_url = Some(url.into());
        self
    }

    pub fn with_association(mut self, association: Association) -> Self {
        self.associations.push(association);
        self
    }

    pub fn with_contents(mut self, contents: Vec<TreeDraft>) -> Self {
        self.contents = contents;
        self
    }

    /// Every username the event references (authors, maintainers, licensors),
    /// deduplicated in first-seen order.
    pub fn people(&self) -> Vec<&str> {
        unique_names(
            self.authors
                .iter()
                .chain(&self.maintainers)
                .chain(&self.licensors),
        )
    }

    /// Usernames that receive ACL entries: authors and maintainers.
    pub fn acl_users(&self) -> Vec<&str> {
        unique_names(self.authors.iter().chain(&self.maintainers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::ModuleIdent;

    #[test]
    fn builder_sets_fields() {
        let id = DocumentIdentity::new();
        let event = PublicationEvent::module("Kinematics")
            .with_identity(id)
            .with_legacy_id(LegacyId::new(PortalType::Module, 4))
            .with_legacy_version("1.3")
            .with_authors(["alice"])
            .with_maintainers(["bob", "alice"]);
        assert_eq!(event.portal_type, PortalType::Module);
        assert_eq!(event.identity, Some(id));
        assert_eq!(event.legacy_version.as_deref(), Some("1.3"));
        assert_eq!(event.acl_users(), vec!["alice", "bob"]);
    }

    #[test]
    fn people_includes_licensors() {
        let event = PublicationEvent::collection("Physics")
            .with_authors(["alice"])
            .with_licensors(["rice", "alice"]);
        assert_eq!(event.people(), vec!["alice", "rice"]);
        assert_eq!(event.acl_users(), vec!["alice"]);
    }

    #[test]
    fn deserializes_minimal_json() {
        let event: PublicationEvent = serde_json::from_str(
            r#"{
                "portal_type": "Collection",
                "identity": null,
                "legacy_id": "col5",
                "legacy_version": "1.2",
                "major": null,
                "minor": null,
                "title": "Physics",
                "abstract_id": null,
                "license_url": null,
                "contents": [{"title": null, "document": 10}]
            }"#,
        )
        .unwrap();
        assert_eq!(event.legacy_id, Some(LegacyId::new(PortalType::Collection, 5)));
        assert_eq!(event.contents[0].document, Some(ModuleIdent(10)));
        assert!(event.authors.is_empty());
    }
}
