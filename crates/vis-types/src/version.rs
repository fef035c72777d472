use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Version class assumed when a caller does not name one.
///
/// Applies to both the write side (prepare, rollback) and the read side
/// (resolve), so an omitted type always addresses the same slot.
pub const DEFAULT_VERSION_TYPE: VersionType = VersionType::Development;

/// The closed set of version classes tracked per repository.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionType {
    Release,
    Development,
    Nightly,
    Patch,
}

impl VersionType {
    /// Every variant, in display order.
    pub const ALL: [VersionType; 4] = [
        VersionType::Release,
        VersionType::Development,
        VersionType::Nightly,
        VersionType::Patch,
    ];

    /// Canonical lowercase name, as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Release => "release",
            Self::Development => "development",
            Self::Nightly => "nightly",
            Self::Patch => "patch",
        }
    }

    /// Parse an optional, user-supplied type. Blank input yields
    /// [`DEFAULT_VERSION_TYPE`].
    pub fn parse_or_default(raw: Option<&str>) -> Result<Self, TypeError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(DEFAULT_VERSION_TYPE),
            Some(s) => s.parse(),
        }
    }
}

impl Default for VersionType {
    fn default() -> Self {
        DEFAULT_VERSION_TYPE
    }
}

impl FromStr for VersionType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| TypeError::UnknownVersionType(trimmed.to_string()))
    }
}

impl fmt::Display for VersionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
