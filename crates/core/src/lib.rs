//! Browser viewport observation.
//!
//! [`BrowserViewportService`] multiplexes any number of observers onto the
//! smallest set of platform resize listeners: observers with equal
//! [`ObservationOptions`] share a listener, and each listener's reports are
//! routed only to the observers bound to it. The platform itself sits behind
//! [`PlatformBridge`].

pub mod bridge;
pub mod classify;
pub mod error;
pub mod listener;
pub mod observer;
pub mod options;
pub mod service;

pub use bridge::{BridgeError, PlatformBridge};
pub use classify::{classify, is_within};
pub use error::ViewportError;
pub use listener::{ListenerState, ResizeReport};
pub use observer::{
    AsyncCallbackObserver, BrowserViewportObserver, CallbackObserver, ViewportChangeEvent,
};
pub use options::ObservationOptions;
pub use service::{BrowserViewportService, Subscription};
pub use viewport_protocol::{
    Breakpoint, BreakpointThresholds, BreakpointTier, BrowserWindowSize, ListenerId, ObserverId,
};
