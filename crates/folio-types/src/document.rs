use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::identity::{DocumentIdentity, ModuleIdent};
use crate::legacy::LegacyId;
use crate::version::Version;

/// Kind of published content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PortalType {
    /// A leaf document (a page).
    Module,
    /// A book: a document whose tree has children.
    Collection,
}

impl PortalType {
    /// Prefix used by the legacy id namespace of this portal type.
    pub fn legacy_prefix(&self) -> &'static str {
        match self {
            Self::Module => "m",
            Self::Collection => "col",
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Module)
    }
}

impl fmt::Display for PortalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module => f.write_str("Module"),
            Self::Collection => f.write_str("Collection"),
        }
    }
}

impl FromStr for PortalType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Module" => Ok(Self::Module),
            "Collection" => Ok(Self::Collection),
            other => Err(TypeError::UnknownPortalType(other.to_string())),
        }
    }
}

/// One published version of a document (a "module" or "collection" row).
///
/// Rows are immutable: once inserted they are never updated or deleted.
/// `(identity, version)` is unique across all rows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentVersion {
    pub key: ModuleIdent,
    pub identity: DocumentIdentity,
    pub version: Version,
    pub portal_type: PortalType,
    pub legacy_id: LegacyId,
    /// Legacy `L.M` version string, kept in sync with `version.major`.
    pub legacy_version: String,
    pub title: String,
    pub authors: Vec<String>,
    pub maintainers: Vec<String>,
    pub licensors: Vec<String>,
    pub abstract_id: Option<i64>,
    pub license_url: Option<String>,
    pub revised: DateTime<Utc>,
}

impl DocumentVersion {
    /// Every username referenced by this row, deduplicated, in first-seen order.
    pub fn people(&self) -> Vec<&str> {
        unique_names(
            self.authors
                .iter()
                .chain(&self.maintainers)
                .chain(&self.licensors),
        )
    }
}

pub(crate) fn unique_names<'a>(names: impl Iterator<Item = &'a String>) -> Vec<&'a str> {
    let mut seen: Vec<&str> = Vec::new();
    for name in names {
        if !seen.contains(&name.as_str()) {
            seen.push(name.as_str());
        }
    }
    seen
}

/// A many-to-many row attached to one document version.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Association {
    Keyword(String),
    Subject(String),
}
