use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use tracing::debug;
use viewport_core::{BridgeError, ListenerState, ObservationOptions, PlatformBridge, ResizeReport};
use viewport_protocol::{BrowserWindowSize, ListenerId};

/// CSS pixels covered by one terminal cell.
pub const CELL_WIDTH_PX: u32 = 8;
pub const CELL_HEIGHT_PX: u32 = 16;

pub fn window_size(cols: u16, rows: u16) -> BrowserWindowSize {
    BrowserWindowSize::new(
        u32::from(cols) * CELL_WIDTH_PX,
        u32::from(rows) * CELL_HEIGHT_PX,
    )
}

/// Platform bridge over the controlling terminal. The terminal is the
/// "window"; each listener applies its own reporting policy to the resize
/// events fed in through [`TerminalBridge::resize`].
pub struct TerminalBridge {
    origin: Instant,
    window_size: Cell<BrowserWindowSize>,
    listeners: RefCell<HashMap<ListenerId, ListenerState>>,
    ready: RefCell<Vec<ResizeReport>>,
}

impl TerminalBridge {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            origin: Instant::now(),
            window_size: Cell::new(window_size(cols, rows)),
            listeners: RefCell::new(HashMap::new()),
            ready: RefCell::new(Vec::new()),
        }
    }

    pub fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    pub fn window_size(&self) -> BrowserWindowSize {
        self.window_size.get()
    }

    pub fn resize(&self, cols: u16, rows: u16) {
        self.resize_at(window_size(cols, rows), self.now_ms());
    }

    fn resize_at(&self, size: BrowserWindowSize, now_ms: u64) {
        self.window_size.set(size);
        for listener in self.listeners.borrow_mut().values_mut() {
            listener.observe(size, now_ms);
        }
    }

    /// Earliest time a listener has something to report.
    pub fn next_deadline(&self) -> Option<u64> {
        if !self.ready.borrow().is_empty() {
            return Some(0);
        }
        self.listeners
            .borrow()
            .values()
            .filter_map(ListenerState::next_deadline)
            .min()
    }

    /// Reports that are due now, ready for `on_platform_resize`.
    pub fn take_due_reports(&self) -> Vec<ResizeReport> {
        self.take_due_reports_at(self.now_ms())
    }

    fn take_due_reports_at(&self, now_ms: u64) -> Vec<ResizeReport> {
        let mut reports = std::mem::take(&mut *self.ready.borrow_mut());
        reports.extend(
            self.listeners
                .borrow_mut()
                .values_mut()
                .filter_map(|listener| listener.poll(now_ms)),
        );
        reports
    }
}

#[async_trait(?Send)]
impl PlatformBridge for TerminalBridge {
    async fn create_listener(
        &self,
        listener_id: ListenerId,
        options: &ObservationOptions,
    ) -> Result<(), BridgeError> {
        let mut listener = ListenerState::new(listener_id, options);
        if let Some(report) = listener.start(self.window_size.get()) {
            self.ready.borrow_mut().push(report);
        }
        self.listeners.borrow_mut().insert(listener_id, listener);
        debug!(%listener_id, "terminal listener created");
        Ok(())
    }

    async fn cancel_listener(&self, listener_id: ListenerId) -> Result<(), BridgeError> {
        self.listeners.borrow_mut().remove(&listener_id);
        self.ready
            .borrow_mut()
            .retain(|report| report.listener_id != listener_id);
        debug!(%listener_id, "terminal listener cancelled");
        Ok(())
    }

    async fn get_browser_window_size(&self) -> Result<BrowserWindowSize, BridgeError> {
        Ok(self.window_size.get())
    }

    async fn match_media(&self, query: &str) -> Result<bool, BridgeError> {
        evaluate_media_query(query, self.window_size.get())
            .ok_or_else(|| BridgeError::call("match_media", format!("unsupported query: {query}")))
    }

    async fn dispose(&self) -> Result<(), BridgeError> {
        self.listeners.borrow_mut().clear();
        self.ready.borrow_mut().clear();
        Ok(())
    }
}

/// Evaluate the subset of media queries a terminal can answer:
/// `(min-width: Npx)`, `(max-width: Npx)`, `(min-height: Npx)`,
/// `(max-height: Npx)` and `(orientation: landscape|portrait)`, joined with
/// `and`. Returns `None` for anything else.
pub fn evaluate_media_query(query: &str, size: BrowserWindowSize) -> Option<bool> {
    let mut matches = true;
    for clause in query.split(" and ") {
        let clause = clause.trim().strip_prefix('(')?.strip_suffix(')')?;
        let (feature, value) = clause.split_once(':')?;
        let (feature, value) = (feature.trim(), value.trim());

        let holds = match feature {
            "orientation" => match value {
                "landscape" => size.width >= size.height,
                "portrait" => size.height > size.width,
                _ => return None,
            },
            _ => {
                let px: u32 = value.strip_suffix("px")?.trim().parse().ok()?;
                match feature {
                    "min-width" => size.width >= px,
                    "max-width" => size.width <= px,
                    "min-height" => size.height >= px,
                    "max-height" => size.height <= px,
                    _ => return None,
                }
            }
        };
        matches &= holds;
    }
    Some(matches)
}
