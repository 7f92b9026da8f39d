use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A real width tier. Totally ordered from narrowest to widest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakpointTier {
    Xs,
    Sm,
    Md,
    Lg,
    Xl,
    Xxl,
}

impl BreakpointTier {
    /// All tiers, narrowest first.
    pub const ALL: [BreakpointTier; 6] = [
        BreakpointTier::Xs,
        BreakpointTier::Sm,
        BreakpointTier::Md,
        BreakpointTier::Lg,
        BreakpointTier::Xl,
        BreakpointTier::Xxl,
    ];

    #[inline]
    const fn index(self) -> usize {
        self as usize
    }
}

impl From<BreakpointTier> for Breakpoint {
    fn from(tier: BreakpointTier) -> Self {
        match tier {
            BreakpointTier::Xs => Breakpoint::Xs,
            BreakpointTier::Sm => Breakpoint::Sm,
            BreakpointTier::Md => Breakpoint::Md,
            BreakpointTier::Lg => Breakpoint::Lg,
            BreakpointTier::Xl => Breakpoint::Xl,
            BreakpointTier::Xxl => Breakpoint::Xxl,
        }
    }
}

/// A breakpoint as used in queries: one of the six real tiers, an
/// "and-down"/"and-up" modifier, or one of two sentinels.
///
/// Only the real tiers are ever reported by a platform listener. The
/// modifiers and sentinels exist so callers can ask containment questions
/// like "is the viewport `MdAndUp`?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Breakpoint {
    Xs,
    Sm,
    Md,
    Lg,
    Xl,
    Xxl,

    SmAndDown,
    MdAndDown,
    LgAndDown,
    XlAndDown,

    SmAndUp,
    MdAndUp,
    LgAndUp,
    XlAndUp,

    /// Never matches.
    None,
    /// Always matches.
    Always,
}

impl Breakpoint {
    /// The real tier this breakpoint names, if it is one of `Xs..=Xxl`.
    pub fn tier(self) -> Option<BreakpointTier> {
        match self {
            Breakpoint::Xs => Some(BreakpointTier::Xs),
            Breakpoint::Sm => Some(BreakpointTier::Sm),
            Breakpoint::Md => Some(BreakpointTier::Md),
            Breakpoint::Lg => Some(BreakpointTier::Lg),
            Breakpoint::Xl => Some(BreakpointTier::Xl),
            Breakpoint::Xxl => Some(BreakpointTier::Xxl),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Breakpoint::Xs => "xs",
            Breakpoint::Sm => "sm",
            Breakpoint::Md => "md",
            Breakpoint::Lg => "lg",
            Breakpoint::Xl => "xl",
            Breakpoint::Xxl => "xxl",
            Breakpoint::SmAndDown => "sm-and-down",
            Breakpoint::MdAndDown => "md-and-down",
            Breakpoint::LgAndDown => "lg-and-down",
            Breakpoint::XlAndDown => "xl-and-down",
            Breakpoint::SmAndUp => "sm-and-up",
            Breakpoint::MdAndUp => "md-and-up",
            Breakpoint::LgAndUp => "lg-and-up",
            Breakpoint::XlAndUp => "xl-and-up",
            Breakpoint::None => "none",
            Breakpoint::Always => "always",
        }
    }

    const ALL: [Breakpoint; 16] = [
        Breakpoint::Xs,
        Breakpoint::Sm,
        Breakpoint::Md,
        Breakpoint::Lg,
        Breakpoint::Xl,
        Breakpoint::Xxl,
        Breakpoint::SmAndDown,
        Breakpoint::MdAndDown,
        Breakpoint::LgAndDown,
        Breakpoint::XlAndDown,
        Breakpoint::SmAndUp,
        Breakpoint::MdAndUp,
        Breakpoint::LgAndUp,
        Breakpoint::XlAndUp,
        Breakpoint::None,
        Breakpoint::Always,
    ];
}

impl fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown breakpoint: {0:?}")]
pub struct ParseBreakpointError(pub String);

impl FromStr for Breakpoint {
    type Err = ParseBreakpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Breakpoint::ALL
            .into_iter()
            .find(|bp| bp.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| ParseBreakpointError(s.to_string()))
    }
}

/// A complete minimum-width table, one entry per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakpointThresholds([u32; 6]);

impl BreakpointThresholds {
    /// Process-wide default table.
    pub const DEFAULT: BreakpointThresholds = BreakpointThresholds([0, 600, 960, 1280, 1920, 2560]);

    /// Build a table from a (possibly partial) override map. Tiers the map
    /// does not mention keep their default threshold.
    pub fn with_overrides(overrides: &HashMap<BreakpointTier, u32>) -> Self {
        let mut table = Self::DEFAULT;
        for (tier, min_width) in overrides {
            table.0[tier.index()] = *min_width;
        }
        table
    }

    #[inline]
    pub fn min_width(&self, tier: BreakpointTier) -> u32 {
        self.0[tier.index()]
    }

    /// Expand into a full map, as sent to platform listeners.
    pub fn to_map(&self) -> HashMap<BreakpointTier, u32> {
        BreakpointTier::ALL
            .into_iter()
            .map(|tier| (tier, self.min_width(tier)))
            .collect()
    }
}

impl Default for BreakpointThresholds {
    fn default() -> Self {
        Self::DEFAULT
    }
}
