//! Which permit layer is visible and how many permit markers to draw.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// What the map shows on top of the base style.
///
/// Permit markers and the neighborhood boundary overlay are never shown
/// together.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DisplayMode {
    /// Permit markers are rendered.
    #[default]
    Permits,
    /// The boundary overlay is rendered; permit markers are hidden.
    Boundaries,
}

impl DisplayMode {
    /// Whether permit markers may be rendered.
    #[must_use]
    pub const fn shows_permits(self) -> bool {
        matches!(self, Self::Permits)
    }

    /// Whether the boundary overlay is visible.
    #[must_use]
    pub const fn shows_boundaries(self) -> bool {
        matches!(self, Self::Boundaries)
    }

    /// The other mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Permits => Self::Boundaries,
            Self::Boundaries => Self::Permits,
        }
    }
}

/// Maximum number of permit markers to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DisplayCap {
    /// Render every permit.
    #[default]
    Unlimited,
    /// Render at most this many permits.
    Limit(NonZeroUsize),
}

impl DisplayCap {
    /// A cap of `n` markers; zero means unlimited.
    #[must_use]
    pub const fn from_count(n: usize) -> Self {
        match NonZeroUsize::new(n) {
            Some(limit) => Self::Limit(limit),
            None => Self::Unlimited,
        }
    }

    /// The limit as a plain count, `None` when unlimited.
    #[must_use]
    pub const fn limit(self) -> Option<usize> {
        match self {
            Self::Unlimited => None,
            Self::Limit(n) => Some(n.get()),
        }
    }
}

impl From<Option<usize>> for DisplayCap {
    fn from(value: Option<usize>) -> Self {
        value.map_or(Self::Unlimited, Self::from_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_toggles() {
        assert_eq!(DisplayMode::default(), DisplayMode::Permits);
        assert!(DisplayMode::Boundaries.shows_boundaries());
        assert!(!DisplayMode::Boundaries.shows_permits());
        assert_eq!(DisplayMode::Permits.toggled(), DisplayMode::Boundaries);
        assert_eq!("boundaries".parse::<DisplayMode>().unwrap(), DisplayMode::Boundaries);
    }

    #[test]
    fn cap_from_optional_count() {
        assert_eq!(DisplayCap::from(None), DisplayCap::Unlimited);
        assert_eq!(DisplayCap::from(Some(0)), DisplayCap::Unlimited);
        assert_eq!(DisplayCap::from(Some(25)).limit(), Some(25));
    }
}
