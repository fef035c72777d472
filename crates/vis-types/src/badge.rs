//! Display colours for version badges.

use crate::version::VersionType;

/// Colour for any type string outside the known classes.
///
/// Read-time type parameters are user supplied and never validated, so the
/// renderer always needs a fallback.
pub const DEFAULT_BADGE_COLOR: &str = "#5272B4";

/// Fixed display colour for a known version class.
pub fn type_color(version_type: VersionType) -> &'static str {
    match version_type {
        VersionType::Release => "#2fa84a",
        VersionType::Development => "#2e4ea2",
        VersionType::Nightly => "#8d4bae",
        VersionType::Patch => "#b45853",
    }
}

/// Colour for a raw, unvalidated type string.
pub fn badge_color(raw_type: &str) -> &'static str {
    raw_type
        .parse::<VersionType>()
        .map(type_color)
        .unwrap_or(DEFAULT_BADGE_COLOR)
}
