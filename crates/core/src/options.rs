use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use viewport_protocol::{BreakpointThresholds, BreakpointTier};

/// Per-observer configuration of the platform listener it wants.
///
/// Two observers whose options compare equal share one platform listener.
/// `Clone` is deep: the threshold map is duplicated, so mutating a clone
/// never affects the original.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObservationOptions {
    /// Debounce window, in milliseconds, between a raw resize signal and the
    /// report sent to observers.
    pub report_rate_ms: u32,
    /// Ask the platform listener to log its own activity.
    pub enable_logging: bool,
    /// Skip the report a listener would otherwise send right after creation.
    pub suppress_initial_event: bool,
    /// Only report when the breakpoint changes, not on every resize.
    pub notify_on_breakpoint_change_only: bool,
    /// Breakpoint threshold overrides. `None` and an empty map are NOT
    /// equal for reuse purposes.
    pub breakpoint_thresholds: Option<HashMap<BreakpointTier, u32>>,
}

impl Default for ObservationOptions {
    fn default() -> Self {
        Self {
            report_rate_ms: 100,
            enable_logging: false,
            suppress_initial_event: true,
            notify_on_breakpoint_change_only: true,
            breakpoint_thresholds: None,
        }
    }
}

impl ObservationOptions {
    /// Load options from JSON. Missing keys take their default value.
    pub fn from_json(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }

    /// Resolved threshold table: the overrides merged over the defaults.
    pub fn thresholds(&self) -> BreakpointThresholds {
        match &self.breakpoint_thresholds {
            Some(overrides) => BreakpointThresholds::with_overrides(overrides),
            None => BreakpointThresholds::DEFAULT,
        }
    }

    /// Copy with the threshold table always populated: the caller's table if
    /// it set one, the default table otherwise.
    pub(crate) fn normalized(&self) -> Self {
        let mut options = self.clone();
        if options.breakpoint_thresholds.is_none() {
            options.breakpoint_thresholds = Some(BreakpointThresholds::DEFAULT.to_map());
        }
        options
    }
}

impl PartialEq for ObservationOptions {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }

        if self.report_rate_ms != other.report_rate_ms
            || self.enable_logging != other.enable_logging
            || self.suppress_initial_event != other.suppress_initial_event
            || self.notify_on_breakpoint_change_only != other.notify_on_breakpoint_change_only
        {
            return false;
        }

        match (&self.breakpoint_thresholds, &other.breakpoint_thresholds) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                a.len() == b.len() && a.iter().all(|(tier, width)| b.get(tier) == Some(width))
            }
            _ => false,
        }
    }
}

impl Eq for ObservationOptions {}
