use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::document::PortalType;
use crate::error::TypeError;

/// Opaque identifier inherited from the legacy publishing system.
///
/// Modules are numbered `m1`, `m2`, ...; collections `col1`, `col2`, ....
/// The two namespaces use independent counters. The legacy id stays the same
/// across every version of a work.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LegacyId {
    pub portal_type: PortalType,
    pub number: u64,
}

impl LegacyId {
    pub fn new(portal_type: PortalType, number: u64) -> Self {
        Self {
            portal_type,
            number,
        }
    }
}

impl fmt::Display for LegacyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.portal_type.legacy_prefix(), self.number)
    }
}

impl FromStr for LegacyId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (portal_type, digits) = if let Some(rest) = s.strip_prefix("col") {
            (PortalType::Collection, rest)
        } else if let Some(rest) = s.strip_prefix('m') {
            (PortalType::Module, rest)
        } else {
            return Err(TypeError::InvalidLegacyId(s.to_string()));
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TypeError::InvalidLegacyId(s.to_string()));
        }
        let number = digits
            .parse::<u64>()
            .map_err(|_| TypeError::InvalidLegacyId(s.to_string()))?;
        Ok(Self::new(portal_type, number))
    }
}

impl Serialize for LegacyId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LegacyId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_module_and_collection() {
        assert_eq!(
            "m10".parse::<LegacyId>().unwrap(),
            LegacyId::new(PortalType::Module, 10)
        );
        assert_eq!(
            "col11406".parse::<LegacyId>().unwrap(),
            LegacyId::new(PortalType::Collection, 11406)
        );
    }

    #[test]
    fn display_uses_portal_prefix() {
        assert_eq!(LegacyId::new(PortalType::Module, 42).to_string(), "m42");
        assert_eq!(LegacyId::new(PortalType::Collection, 7).to_string(), "col7");
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["", "m", "col", "x12", "m12a", "m+1", "colm1"] {
            assert!(bad.parse::<LegacyId>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn serializes_as_string() {
        let id = LegacyId::new(PortalType::Module, 3);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"m3\"");
        let back: LegacyId = serde_json::from_str("\"col9\"").unwrap();
        assert_eq!(back, LegacyId::new(PortalType::Collection, 9));
    }
}
