use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A `(major, minor?)` version number.
///
/// Leaf documents (modules) carry only a major version; collections carry
/// both. Ordering is purely numeric: major first, then minor, with an absent
/// minor sorting before any present one. "Latest" is always the numeric
/// maximum, never the most recently revised row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: Option<u32>,
}

impl Version {
    /// A module version (no minor).
    pub fn module(major: u32) -> Self {
        Self { major, minor: None }
    }

    /// A collection version.
    pub fn collection(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor: Some(minor),
        }
    }

    /// The same major version with the given minor.
    pub fn with_minor(self, minor: u32) -> Self {
        Self {
            major: self.major,
            minor: Some(minor),
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then_with(|| self.minor.cmp(&other.minor))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.minor {
            Some(minor) => write!(f, "{}.{}", self.major, minor),
            None => write!(f, "{}", self.major),
        }
    }
}

impl FromStr for Version {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| {
            part.parse::<u32>()
                .map_err(|_| TypeError::InvalidVersion(s.to_string()))
        };
        match s.split_once('.') {
            Some((major, minor)) => Ok(Self::collection(parse(major)?, parse(minor)?)),
            None => Ok(Self::module(parse(s)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ordering_is_numeric_not_lexical() {
        assert!(Version::collection(1, 10) > Version::collection(1, 9));
        assert!(Version::module(10) > Version::module(9));
        assert!(Version::collection(2, 1) > Version::collection(1, 99));
    }

    #[test]
    fn absent_minor_sorts_first() {
        assert!(Version::module(3) < Version::collection(3, 0));
    }

    #[test]
    fn parse_both_forms() {
        assert_eq!("4".parse::<Version>().unwrap(), Version::module(4));
        assert_eq!("4.2".parse::<Version>().unwrap(), Version::collection(4, 2));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("1.x".parse::<Version>().is_err());
        assert!("".parse::<Version>().is_err());
        assert!("-1".parse::<Version>().is_err());
    }

    proptest! {
        #[test]
        fn display_parses_back(major in 0u32..10_000, minor in proptest::option::of(0u32..10_000)) {
            let v = Version { major, minor };
            prop_assert_eq!(v.to_string().parse::<Version>().unwrap(), v);
        }
    }
}
