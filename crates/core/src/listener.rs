use tracing::debug;
use viewport_protocol::{
    Breakpoint, BreakpointThresholds, BreakpointTier, BrowserWindowSize, ListenerId,
};

use crate::classify::classify;
use crate::options::ObservationOptions;

/// What a platform listener hands to `on_platform_resize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeReport {
    pub listener_id: ListenerId,
    pub window_size: BrowserWindowSize,
    pub breakpoint: Breakpoint,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    window_size: BrowserWindowSize,
    due_ms: u64,
}

/// Reporting policy of one platform listener, for hosts that implement
/// listeners natively.
///
/// Raw resize signals are debounced by `report_rate_ms`: each signal
/// restarts the window and only the last size is reported. With
/// `notify_on_breakpoint_change_only`, a report whose breakpoint equals the
/// previous one is dropped. Time is passed in by the caller, in
/// milliseconds from any fixed origin.
#[derive(Debug, Clone)]
pub struct ListenerState {
    listener_id: ListenerId,
    options: ObservationOptions,
    thresholds: BreakpointThresholds,
    last_breakpoint: Option<BreakpointTier>,
    pending: Option<Pending>,
}

impl ListenerState {
    pub fn new(listener_id: ListenerId, options: &ObservationOptions) -> Self {
        Self {
            listener_id,
            thresholds: options.thresholds(),
            options: options.clone(),
            last_breakpoint: None,
            pending: None,
        }
    }

    /// Arm the listener at `window_size`. Returns the initial report unless
    /// the options suppress it.
    pub fn start(&mut self, window_size: BrowserWindowSize) -> Option<ResizeReport> {
        let report = if self.options.suppress_initial_event {
            None
        } else {
            self.report(window_size)
        };
        self.last_breakpoint = Some(classify(window_size.width, &self.thresholds));
        report
    }

    /// Record a raw resize signal.
    pub fn observe(&mut self, window_size: BrowserWindowSize, now_ms: u64) {
        self.pending = Some(Pending {
            window_size,
            due_ms: now_ms.saturating_add(u64::from(self.options.report_rate_ms)),
        });
    }

    /// When the pending signal, if any, becomes reportable.
    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.map(|pending| pending.due_ms)
    }

    /// Emit the pending signal once its debounce window has elapsed.
    pub fn poll(&mut self, now_ms: u64) -> Option<ResizeReport> {
        let pending = self.pending.filter(|pending| pending.due_ms <= now_ms)?;
        self.pending = None;
        self.report(pending.window_size)
    }

    fn report(&mut self, window_size: BrowserWindowSize) -> Option<ResizeReport> {
        let tier = classify(window_size.width, &self.thresholds);
        if self.options.notify_on_breakpoint_change_only {
            if self.last_breakpoint == Some(tier) {
                return None;
            }
            self.last_breakpoint = Some(tier);
        }

        if self.options.enable_logging {
            debug!(
                listener_id = %self.listener_id,
                width = window_size.width,
                height = window_size.height,
                breakpoint = ?tier,
                "listener report"
            );
        }

        Some(ResizeReport {
            listener_id: self.listener_id,
            window_size,
            breakpoint: tier.into(),
        })
    }
}
