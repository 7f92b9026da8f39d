//! Integration tests: drive `BrowserViewportService` against a recording
//! bridge and check listener sharing, routing, teardown and the immediate
//! notification.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::executor::block_on;
use viewport_core::{
    BridgeError, BrowserViewportObserver, BrowserViewportService, ObservationOptions,
    PlatformBridge, ViewportChangeEvent, ViewportError,
};
use viewport_protocol::{Breakpoint, BreakpointTier, BrowserWindowSize, ListenerId, ObserverId};

/// Completes on its second poll, handing control back to the executor once.
struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

#[derive(Default)]
struct RecordingBridge {
    window_size: Cell<Option<BrowserWindowSize>>,
    created: RefCell<Vec<(ListenerId, ObservationOptions)>>,
    cancelled: RefCell<Vec<ListenerId>>,
    size_queries: Cell<usize>,
    disposals: Cell<usize>,
    fail_create: Cell<bool>,
    fail_cancel: Cell<bool>,
}

impl RecordingBridge {
    fn with_size(width: u32, height: u32) -> Rc<Self> {
        let bridge = Rc::new(Self::default());
        bridge.resize(width, height);
        bridge
    }

    fn resize(&self, width: u32, height: u32) {
        self.window_size
            .set(Some(BrowserWindowSize::new(width, height)));
    }

    fn created_count(&self) -> usize {
        self.created.borrow().len()
    }

    fn listener(&self, index: usize) -> ListenerId {
        self.created.borrow()[index].0
    }
}

#[async_trait(?Send)]
impl PlatformBridge for RecordingBridge {
    async fn create_listener(
        &self,
        listener_id: ListenerId,
        options: &ObservationOptions,
    ) -> Result<(), BridgeError> {
        YieldOnce(false).await;
        if self.fail_create.get() {
            return Err(BridgeError::call("create_listener", "listener factory missing"));
        }
        self.created
            .borrow_mut()
            .push((listener_id, options.clone()));
        Ok(())
    }

    async fn cancel_listener(&self, listener_id: ListenerId) -> Result<(), BridgeError> {
        if self.fail_cancel.get() {
            return Err(BridgeError::call("cancel_listener", "page unloading"));
        }
        self.cancelled.borrow_mut().push(listener_id);
        Ok(())
    }

    async fn get_browser_window_size(&self) -> Result<BrowserWindowSize, BridgeError> {
        self.size_queries.set(self.size_queries.get() + 1);
        self.window_size.get().ok_or(BridgeError::Unavailable)
    }

    async fn match_media(&self, _query: &str) -> Result<bool, BridgeError> {
        Ok(false)
    }

    async fn dispose(&self) -> Result<(), BridgeError> {
        self.disposals.set(self.disposals.get() + 1);
        Ok(())
    }
}

struct RecordingObserver {
    id: ObserverId,
    options: RefCell<Option<ObservationOptions>>,
    events: RefCell<Vec<ViewportChangeEvent>>,
}

impl RecordingObserver {
    fn new(options: Option<ObservationOptions>) -> Rc<Self> {
        Rc::new(Self {
            id: ObserverId::new(),
            options: RefCell::new(options),
            events: RefCell::new(Vec::new()),
        })
    }

    fn events(&self) -> Vec<ViewportChangeEvent> {
        self.events.borrow().clone()
    }
}

#[async_trait(?Send)]
impl BrowserViewportObserver for RecordingObserver {
    fn id(&self) -> ObserverId {
        self.id
    }

    fn options(&self) -> Option<ObservationOptions> {
        self.options.borrow().clone()
    }

    async fn notify(&self, event: &ViewportChangeEvent) {
        self.events.borrow_mut().push(*event);
    }
}

fn rate(report_rate_ms: u32) -> Option<ObservationOptions> {
    Some(ObservationOptions {
        report_rate_ms,
        ..ObservationOptions::default()
    })
}

fn subscribe(service: &BrowserViewportService, observer: &Rc<RecordingObserver>, fire: bool) {
    let result = block_on(service.subscribe(observer.clone(), fire));
    assert!(result.is_ok(), "subscribe failed: {result:?}");
}

#[test]
fn equal_options_share_one_listener() {
    let bridge = RecordingBridge::with_size(1024, 768);
    let service = BrowserViewportService::new(bridge.clone());

    let a = RecordingObserver::new(None);
    let b = RecordingObserver::new(Some(ObservationOptions::default()));
    subscribe(&service, &a, false);
    subscribe(&service, &b, false);

    assert_eq!(bridge.created_count(), 1);
    assert_eq!(service.observers_count(), 2);
    assert_eq!(service.listeners_count(), 1);
}

#[test]
fn listener_options_always_carry_a_threshold_table() {
    let bridge = RecordingBridge::with_size(1024, 768);
    let service = BrowserViewportService::new(bridge.clone());
    subscribe(&service, &RecordingObserver::new(None), false);

    let created = bridge.created.borrow();
    let table = created[0].1.breakpoint_thresholds.clone().unwrap_or_default();
    assert_eq!(table.len(), 6);
    assert_eq!(table.get(&BreakpointTier::Md), Some(&960));
}

#[test]
fn different_options_get_separate_listeners() {
    let bridge = RecordingBridge::with_size(1024, 768);
    let service = BrowserViewportService::new(bridge.clone());

    subscribe(&service, &RecordingObserver::new(rate(100)), false);
    subscribe(&service, &RecordingObserver::new(rate(250)), false);

    assert_eq!(bridge.created_count(), 2);
    assert_eq!(service.listeners_count(), 2);
}

#[test]
fn resubscribing_is_idempotent() {
    let bridge = RecordingBridge::with_size(1024, 768);
    let service = BrowserViewportService::new(bridge.clone());
    let observer = RecordingObserver::new(None);

    for _ in 0..3 {
        subscribe(&service, &observer, true);
    }

    assert_eq!(service.observers_count(), 1);
    assert_eq!(bridge.created_count(), 1);
    let events = observer.events();
    assert_eq!(events.len(), 1);
    assert!(events[0].is_immediate);
}

#[test]
fn immediate_fire_reports_current_breakpoint() {
    let bridge = RecordingBridge::with_size(600, 900);
    let service = BrowserViewportService::new(bridge.clone());
    let observer = RecordingObserver::new(None);

    subscribe(&service, &observer, true);

    let events = observer.events();
    assert_eq!(events.len(), 1);
    assert!(events[0].is_immediate);
    assert_eq!(events[0].breakpoint, Breakpoint::Sm);
    assert_eq!(events[0].window_size, BrowserWindowSize::new(600, 900));
    assert_eq!(events[0].listener_id, bridge.listener(0));
}

#[test]
fn immediate_fire_uses_the_observers_thresholds() {
    let bridge = RecordingBridge::with_size(600, 900);
    let service = BrowserViewportService::new(bridge.clone());
    let observer = RecordingObserver::new(Some(ObservationOptions {
        breakpoint_thresholds: Some([(BreakpointTier::Sm, 700)].into_iter().collect()),
        ..ObservationOptions::default()
    }));

    subscribe(&service, &observer, true);
    assert_eq!(observer.events()[0].breakpoint, Breakpoint::Xs);
}

#[test]
fn no_immediate_fire_when_not_requested() {
    let bridge = RecordingBridge::with_size(600, 900);
    let service = BrowserViewportService::new(bridge.clone());
    let observer = RecordingObserver::new(None);

    subscribe(&service, &observer, false);

    assert!(observer.events().is_empty());
    assert_eq!(bridge.size_queries.get(), 0);
}

#[test]
fn resize_reaches_only_observers_on_that_listener() {
    let bridge = RecordingBridge::with_size(1024, 768);
    let service = BrowserViewportService::new(bridge.clone());

    let a = RecordingObserver::new(None);
    let b = RecordingObserver::new(None);
    let c = RecordingObserver::new(rate(250));
    subscribe(&service, &a, false);
    subscribe(&service, &b, false);
    subscribe(&service, &c, false);

    let shared = bridge.listener(0);
    let size = BrowserWindowSize::new(1280, 1024);
    block_on(service.on_platform_resize(size, Breakpoint::Lg, shared));

    for observer in [&a, &b] {
        let events = observer.events();
        assert_eq!(events.len(), 1);
        assert!(!events[0].is_immediate);
        assert_eq!(events[0].breakpoint, Breakpoint::Lg);
        assert_eq!(events[0].window_size, size);
        assert_eq!(events[0].listener_id, shared);
    }
    assert!(c.events().is_empty());

    block_on(service.on_platform_resize(size, Breakpoint::Lg, bridge.listener(1)));
    assert_eq!(a.events().len(), 1);
    assert_eq!(c.events().len(), 1);
}

#[test]
fn resize_for_unknown_listener_is_ignored() {
    let bridge = RecordingBridge::with_size(1024, 768);
    let service = BrowserViewportService::new(bridge.clone());
    let a = RecordingObserver::new(None);
    subscribe(&service, &a, false);

    block_on(service.on_platform_resize(
        BrowserWindowSize::new(300, 300),
        Breakpoint::Xs,
        ListenerId::new(),
    ));
    assert!(a.events().is_empty());
}

#[test]
fn only_the_last_unsubscribe_cancels_the_listener() {
    let bridge = RecordingBridge::with_size(1024, 768);
    let service = BrowserViewportService::new(bridge.clone());
    let a = RecordingObserver::new(None);
    let b = RecordingObserver::new(None);
    subscribe(&service, &a, false);
    subscribe(&service, &b, false);

    assert!(block_on(service.unsubscribe(a.id)).is_ok());
    assert!(bridge.cancelled.borrow().is_empty());
    assert_eq!(service.observers_count(), 1);

    assert!(block_on(service.unsubscribe_observer(&*b)).is_ok());
    assert_eq!(bridge.cancelled.borrow().as_slice(), &[bridge.listener(0)]);
    assert_eq!(service.observers_count(), 0);
    assert_eq!(service.listeners_count(), 0);
}

#[test]
fn unsubscribing_unknown_or_twice_is_a_no_op() {
    let bridge = RecordingBridge::with_size(1024, 768);
    let service = BrowserViewportService::new(bridge.clone());
    let a = RecordingObserver::new(None);
    subscribe(&service, &a, false);

    assert!(block_on(service.unsubscribe(ObserverId::new())).is_ok());
    assert!(block_on(service.unsubscribe(a.id)).is_ok());
    assert!(block_on(service.unsubscribe(a.id)).is_ok());
    assert_eq!(bridge.cancelled.borrow().len(), 1);
}

#[test]
fn failed_cancel_still_removes_the_observer() {
    let bridge = RecordingBridge::with_size(1024, 768);
    let service = BrowserViewportService::new(bridge.clone());
    let a = RecordingObserver::new(None);
    subscribe(&service, &a, false);

    bridge.fail_cancel.set(true);
    let result = block_on(service.unsubscribe(a.id));
    assert!(matches!(result, Err(ViewportError::Bridge(BridgeError::Call { .. }))));
    assert_eq!(service.observers_count(), 0);
}

#[test]
fn failed_create_registers_nothing() {
    let bridge = RecordingBridge::with_size(1024, 768);
    let service = BrowserViewportService::new(bridge.clone());
    bridge.fail_create.set(true);

    let observer = RecordingObserver::new(None);
    let result = block_on(service.subscribe(observer.clone(), true));
    assert!(result.is_err());
    assert_eq!(service.observers_count(), 0);
    assert!(observer.events().is_empty());
}

#[test]
fn dispose_clears_and_disarms() {
    let bridge = RecordingBridge::with_size(1024, 768);
    let service = BrowserViewportService::new(bridge.clone());
    subscribe(&service, &RecordingObserver::new(None), false);
    subscribe(&service, &RecordingObserver::new(rate(20)), false);

    assert!(block_on(service.dispose()).is_ok());
    assert_eq!(service.observers_count(), 0);
    assert!(service.is_disposed());

    let late = RecordingObserver::new(None);
    subscribe(&service, &late, true);
    assert_eq!(service.observers_count(), 0);
    assert!(late.events().is_empty());
    assert_eq!(bridge.created_count(), 2);

    assert!(block_on(service.dispose()).is_ok());
    assert_eq!(bridge.disposals.get(), 1);
}

#[test]
fn options_are_frozen_at_first_subscription() {
    let bridge = RecordingBridge::with_size(1024, 768);
    let service = BrowserViewportService::new(bridge.clone());
    let a = RecordingObserver::new(rate(100));
    subscribe(&service, &a, false);

    // Mutating the observer's options and re-subscribing changes nothing.
    *a.options.borrow_mut() = rate(250);
    subscribe(&service, &a, false);
    assert_eq!(bridge.created_count(), 1);

    // The registered options are still the original ones, so an observer
    // asking for the new options gets its own listener.
    let b = RecordingObserver::new(rate(250));
    subscribe(&service, &b, false);
    assert_eq!(bridge.created_count(), 2);
    assert_eq!(bridge.created.borrow()[0].1.report_rate_ms, 100);
}

#[test]
fn callback_overloads_subscribe_and_notify() {
    let bridge = RecordingBridge::with_size(1920, 1080);
    let service = BrowserViewportService::new(bridge.clone());

    let sync_seen = Rc::new(RefCell::new(Vec::new()));
    let sink = sync_seen.clone();
    let sync_id = ObserverId::new();
    let result = block_on(service.subscribe_fn(
        sync_id,
        move |event: &ViewportChangeEvent| sink.borrow_mut().push(event.breakpoint),
        None,
        true,
    ));
    assert!(result.is_ok());

    let async_seen = Rc::new(RefCell::new(Vec::new()));
    let sink = async_seen.clone();
    let result = block_on(service.subscribe_async_fn(
        ObserverId::new(),
        move |event: ViewportChangeEvent| {
            let sink = sink.clone();
            async move { sink.borrow_mut().push(event.is_immediate) }
        },
        rate(40),
        false,
    ));
    assert!(result.is_ok());

    assert_eq!(sync_seen.borrow().as_slice(), &[Breakpoint::Xl]);
    assert!(async_seen.borrow().is_empty());
    assert_eq!(bridge.created_count(), 2);

    block_on(service.on_platform_resize(
        BrowserWindowSize::new(2600, 1400),
        Breakpoint::Xxl,
        bridge.listener(1),
    ));
    assert_eq!(async_seen.borrow().as_slice(), &[false]);
    assert_eq!(sync_seen.borrow().len(), 1);

    assert!(block_on(service.unsubscribe(sync_id)).is_ok());
    assert_eq!(service.observers_count(), 1);
}

#[test]
fn concurrent_subscribes_share_a_listener() {
    let bridge = RecordingBridge::with_size(1024, 768);
    let service = BrowserViewportService::new(bridge.clone());
    let a = RecordingObserver::new(None);
    let b = RecordingObserver::new(None);

    let (ra, rb) = block_on(futures::future::join(
        service.subscribe(a.clone(), true),
        service.subscribe(b.clone(), true),
    ));
    assert!(ra.is_ok() && rb.is_ok());
    assert_eq!(bridge.created_count(), 1);
    assert_eq!(service.observers_count(), 2);
    assert_eq!(a.events().len(), 1);
    assert_eq!(b.events().len(), 1);
}

#[test]
fn subscribe_racing_last_unsubscribe_never_lands_on_a_cancelled_listener() {
    let bridge = RecordingBridge::with_size(1024, 768);
    let service = BrowserViewportService::new(bridge.clone());
    let a = RecordingObserver::new(None);
    let b = RecordingObserver::new(None);
    subscribe(&service, &a, false);

    let (ra, rb) = block_on(futures::future::join(
        service.unsubscribe(a.id),
        service.subscribe(b.clone(), true),
    ));
    assert!(ra.is_ok() && rb.is_ok());

    let events = b.events();
    assert_eq!(events.len(), 1);
    assert!(!bridge.cancelled.borrow().contains(&events[0].listener_id));
    assert_eq!(service.observers_count(), 1);
    assert_eq!(service.listeners_count(), 1);
}

#[test]
fn failed_immediate_fetch_leaves_the_observer_subscribed() {
    let bridge = Rc::new(RecordingBridge::default());
    let service = BrowserViewportService::new(bridge.clone());
    let observer = RecordingObserver::new(None);

    assert!(matches!(
        block_on(service.subscribe(observer.clone(), true)),
        Err(ViewportError::Bridge(BridgeError::Unavailable))
    ));
    assert_eq!(service.observers_count(), 1);
    assert_eq!(bridge.created_count(), 1);

    // A retry is a re-subscribe and does not fire.
    bridge.resize(800, 600);
    subscribe(&service, &observer, true);
    assert!(observer.events().is_empty());
    assert_eq!(bridge.created_count(), 1);
}

#[test]
fn breakpoint_lookup_caches_but_size_lookup_does_not() {
    let bridge = RecordingBridge::with_size(1024, 768);
    let service = BrowserViewportService::new(bridge.clone());

    assert_eq!(block_on(service.get_current_breakpoint()).ok(), Some(Breakpoint::Md));
    bridge.resize(2000, 1000);
    assert_eq!(block_on(service.get_current_breakpoint()).ok(), Some(Breakpoint::Md));
    assert_eq!(bridge.size_queries.get(), 1);

    let fresh = block_on(service.get_current_browser_window_size()).ok();
    assert_eq!(fresh, Some(BrowserWindowSize::new(2000, 1000)));
    assert_eq!(bridge.size_queries.get(), 2);

    // A platform report refreshes the cached size.
    block_on(service.on_platform_resize(
        BrowserWindowSize::new(2600, 1000),
        Breakpoint::Xxl,
        ListenerId::new(),
    ));
    assert_eq!(block_on(service.get_current_breakpoint()).ok(), Some(Breakpoint::Xxl));
    assert_eq!(
        block_on(service.is_breakpoint_within_window_size(Breakpoint::LgAndUp)).ok(),
        Some(true)
    );
    assert_eq!(
        block_on(service.is_breakpoint_within_window_size(Breakpoint::MdAndDown)).ok(),
        Some(false)
    );
}

#[test]
fn bridge_errors_propagate_from_queries() {
    let bridge = Rc::new(RecordingBridge::default());
    let service = BrowserViewportService::new(bridge.clone());

    assert!(matches!(
        block_on(service.get_current_browser_window_size()),
        Err(ViewportError::Bridge(BridgeError::Unavailable))
    ));
    assert!(block_on(service.get_current_breakpoint()).is_err());
}
