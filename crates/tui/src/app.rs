use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use futures::executor::block_on;
use viewport_core::{BrowserViewportService, ObservationOptions, ViewportChangeEvent};
use viewport_protocol::{Breakpoint, BreakpointTier, BrowserWindowSize, ObserverId};

use crate::bridge::TerminalBridge;

const LOG_CAPACITY: usize = 200;
const IDLE_POLL: Duration = Duration::from_millis(500);

/// Recent notifications, newest last.
#[derive(Default)]
pub struct EventLog {
    lines: VecDeque<String>,
}

impl EventLog {
    fn push(&mut self, observer: &str, event: &ViewportChangeEvent) {
        if self.lines.len() == LOG_CAPACITY {
            self.lines.pop_front();
        }
        self.lines.push_back(format!(
            "{observer:<12} {:>5}x{:<5} {:<4} {}",
            event.window_size.width,
            event.window_size.height,
            event.breakpoint.as_str(),
            if event.is_immediate { "(immediate)" } else { "" },
        ));
    }

    pub fn lines(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}

/// What the renderer shows each frame.
pub struct View<'a> {
    pub window_size: BrowserWindowSize,
    pub breakpoint: Breakpoint,
    pub observers: usize,
    pub listeners: usize,
    pub every_resize_subscribed: bool,
    pub log: &'a EventLog,
}

struct DemoObserver {
    id: ObserverId,
    name: &'static str,
    options: Option<ObservationOptions>,
}

/// The observers subscribed at startup. The first two share a listener.
fn demo_observers() -> Vec<DemoObserver> {
    vec![
        DemoObserver {
            id: ObserverId::new(),
            name: "layout",
            options: None,
        },
        DemoObserver {
            id: ObserverId::new(),
            name: "sidebar",
            options: None,
        },
        DemoObserver {
            id: ObserverId::new(),
            name: "every-resize",
            options: Some(ObservationOptions {
                report_rate_ms: 250,
                notify_on_breakpoint_change_only: false,
                ..ObservationOptions::default()
            }),
        },
        DemoObserver {
            id: ObserverId::new(),
            name: "compact",
            options: Some(ObservationOptions {
                breakpoint_thresholds: Some(
                    [(BreakpointTier::Sm, 480), (BreakpointTier::Md, 800)]
                        .into_iter()
                        .collect(),
                ),
                ..ObservationOptions::default()
            }),
        },
    ]
}

pub struct App {
    bridge: Rc<TerminalBridge>,
    service: BrowserViewportService,
    log: Rc<RefCell<EventLog>>,
    observers: Vec<DemoObserver>,
    every_resize_subscribed: bool,
}

impl App {
    pub fn new(cols: u16, rows: u16, default_options: ObservationOptions) -> Self {
        let bridge = Rc::new(TerminalBridge::new(cols, rows));
        let service = BrowserViewportService::with_options(bridge.clone(), default_options);
        Self {
            bridge,
            service,
            log: Rc::new(RefCell::new(EventLog::default())),
            observers: demo_observers(),
            every_resize_subscribed: false,
        }
    }

    pub fn subscribe_all(&mut self) -> Result<()> {
        for index in 0..self.observers.len() {
            self.subscribe(index)?;
        }
        self.every_resize_subscribed = true;
        Ok(())
    }

    fn subscribe(&self, index: usize) -> Result<()> {
        let observer = &self.observers[index];
        let log = Rc::clone(&self.log);
        let name = observer.name;
        block_on(self.service.subscribe_fn(
            observer.id,
            move |event: &ViewportChangeEvent| log.borrow_mut().push(name, event),
            observer.options.clone(),
            true,
        ))?;
        Ok(())
    }

    fn toggle_every_resize(&mut self) -> Result<()> {
        let Some(index) = self.observers.iter().position(|o| o.name == "every-resize") else {
            return Ok(());
        };
        if self.every_resize_subscribed {
            block_on(self.service.unsubscribe(self.observers[index].id))?;
        } else {
            self.subscribe(index)?;
        }
        self.every_resize_subscribed = !self.every_resize_subscribed;
        Ok(())
    }

    /// Wait for input or the next listener deadline. Returns `false` on quit.
    pub fn step(&mut self) -> Result<bool> {
        let timeout = self
            .bridge
            .next_deadline()
            .map(|due| Duration::from_millis(due.saturating_sub(self.bridge.now_ms())))
            .unwrap_or(IDLE_POLL);

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(false),
                    KeyCode::Char('u') => self.toggle_every_resize()?,
                    _ => {}
                },
                Event::Resize(cols, rows) => self.bridge.resize(cols, rows),
                _ => {}
            }
        }

        for report in self.bridge.take_due_reports() {
            block_on(self.service.on_platform_resize(
                report.window_size,
                report.breakpoint,
                report.listener_id,
            ));
        }
        Ok(true)
    }

    pub fn with_view<R>(&self, f: impl FnOnce(&View<'_>) -> R) -> Result<R> {
        let breakpoint = block_on(self.service.get_current_breakpoint())?;
        let log = self.log.borrow();
        Ok(f(&View {
            window_size: self.bridge.window_size(),
            breakpoint,
            observers: self.service.observers_count(),
            listeners: self.service.listeners_count(),
            every_resize_subscribed: self.every_resize_subscribed,
            log: &log,
        }))
    }

    pub fn shutdown(&self) -> Result<()> {
        block_on(self.service.dispose())?;
        Ok(())
    }
}
