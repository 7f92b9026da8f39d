pub mod breakpoint;
pub mod types;

pub use breakpoint::{Breakpoint, BreakpointThresholds, BreakpointTier, ParseBreakpointError};
pub use types::{BrowserWindowSize, ListenerId, ObserverId};
