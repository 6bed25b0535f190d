use folio_ledger::{derive_version, documents, legacy_version_string};
use folio_store::ArchiveTx;
use folio_types::{PortalType, Version};
use tracing::debug;

use crate::error::{ShimError, ShimResult};
use crate::stage::{ShimContext, ShimMarker, ShimStage};

/// Minor version a collection starts each major version at.
const FIRST_MINOR: u32 = 1;

/// Bring the legacy version string and `(major, minor)` into agreement.
///
/// With a legacy string, the numbers are derived from it. Without one, the
/// major version defaults to one past the work's latest (or 1 for a new
/// work) and the string is generated from it. Collections default to
/// minor version 1; modules never carry one.
pub struct VersionShim;

impl VersionShim {
    fn target(
        tx: &dyn ArchiveTx,
        context: &ShimContext<'_>,
    ) -> ShimResult<(Version, String)> {
        let event = &*context.event;
        let minor = match event.portal_type {
            PortalType::Module => event.minor,
            PortalType::Collection => Some(event.minor.unwrap_or(FIRST_MINOR)),
        };

        if let Some(legacy_version) = &event.legacy_version {
            let version = derive_version(event.portal_type, legacy_version, minor)?;
            if let Some(major) = event.major {
                if major != version.major {
                    return Err(ShimError::InvalidEvent(format!(
                        "major version {major} disagrees with legacy version {legacy_version}"
                    )));
                }
            }
            return Ok((version, legacy_version.clone()));
        }

        let major = match event.major {
            Some(major) => major,
            None => {
                let identity = event.identity.ok_or(ShimError::MissingField {
                    stage: "version",
                    field: "identity",
                })?;
                match documents::latest(tx, &identity)? {
                    Some(row) => row.version.major.checked_add(1).ok_or_else(|| {
                        ShimError::InvalidEvent(format!("major version of {identity} overflowed"))
                    })?,
                    None => 1,
                }
            }
        };
        let version = match (event.portal_type, minor) {
            (PortalType::Module, Some(minor)) => {
                return Err(ShimError::InvalidEvent(format!(
                    "module version {major} cannot carry minor version {minor}"
                )))
            }
            (_, minor) => Version { major, minor },
        };
        Ok((version, legacy_version_string(major)))
    }
}

impl ShimStage for VersionShim {
    fn name(&self) -> &'static str {
        "version"
    }

    fn apply(
        &self,
        tx: &mut dyn ArchiveTx,
        context: &mut ShimContext<'_>,
    ) -> ShimResult<ShimMarker> {
        let (version, legacy_version) = Self::target(tx, context)?;
        let event = &mut *context.event;

        let changed = event.major != Some(version.major)
            || event.minor != version.minor
            || event.legacy_version.as_deref() != Some(legacy_version.as_str());
        if changed {
            debug!(%version, %legacy_version, "defaulted version");
            event.major = Some(version.major);
            event.minor = version.minor;
            event.legacy_version = Some(legacy_version);
        }
        Ok(ShimMarker::from_changed(changed))
    }
}
