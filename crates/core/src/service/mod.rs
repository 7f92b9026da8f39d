mod subscription;

pub use subscription::Subscription;

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::rc::Rc;

use futures::lock::Mutex;
use tracing::{debug, trace};
use viewport_protocol::{Breakpoint, BrowserWindowSize, ListenerId, ObserverId};

use crate::bridge::PlatformBridge;
use crate::classify::{classify, is_within};
use crate::error::ViewportError;
use crate::observer::{
    AsyncCallbackObserver, BrowserViewportObserver, CallbackObserver, ViewportChangeEvent,
};
use crate::options::ObservationOptions;

/// Multiplexes observers onto as few platform resize listeners as possible.
///
/// Observers whose options compare equal share one listener. Each inbound
/// report from a listener is delivered only to the observers bound to that
/// listener.
///
/// The service is single-threaded: share it with `Rc`. Subscribe,
/// unsubscribe and dispose are serialized by one async lock that is held
/// across bridge calls and across the immediate notification. The lock is
/// not reentrant, so an observer must not (un)subscribe from inside an
/// immediate notification. [`on_platform_resize`](Self::on_platform_resize)
/// does not take the lock.
pub struct BrowserViewportService {
    bridge: Rc<dyn PlatformBridge>,
    default_options: ObservationOptions,
    lock: Mutex<()>,
    /// Never borrowed across an `.await`.
    observers: RefCell<HashMap<Subscription, Rc<dyn BrowserViewportObserver>>>,
    latest_window_size: Cell<Option<BrowserWindowSize>>,
    disposed: Cell<bool>,
}

impl BrowserViewportService {
    pub fn new(bridge: Rc<dyn PlatformBridge>) -> Self {
        Self::with_options(bridge, ObservationOptions::default())
    }

    /// Create a service whose observers without options of their own use
    /// `default_options`.
    pub fn with_options(bridge: Rc<dyn PlatformBridge>, default_options: ObservationOptions) -> Self {
        Self {
            bridge,
            default_options,
            lock: Mutex::new(()),
            observers: RefCell::new(HashMap::new()),
            latest_window_size: Cell::new(None),
            disposed: Cell::new(false),
        }
    }

    /// Subscribe `observer`, reusing an existing platform listener when one
    /// with equal options (or already serving this observer) exists.
    ///
    /// Subscribing an observer id that is already subscribed only replaces
    /// the observer handle: no listener is created, no immediate
    /// notification is sent, and the options frozen at first subscription
    /// stay in effect. After [`dispose`](Self::dispose) this is a no-op.
    ///
    /// Errors are not compensated. If the immediate window-size fetch fails
    /// the error is returned but the observer stays subscribed, and a retry
    /// takes the re-subscribe path above without firing.
    pub async fn subscribe(
        &self,
        observer: Rc<dyn BrowserViewportObserver>,
        fire_immediately: bool,
    ) -> Result<(), ViewportError> {
        if self.disposed.get() {
            return Ok(());
        }

        let _guard = self.lock.lock().await;
        if self.disposed.get() {
            return Ok(());
        }

        let observer_id = observer.id();
        let options = observer
            .options()
            .unwrap_or_else(|| self.default_options.clone())
            .normalized();
        let thresholds = options.thresholds();

        let listener_id = match self.find_reusable_listener(observer_id, &options) {
            Some(listener_id) => {
                debug!(%observer_id, %listener_id, "reusing platform listener");
                listener_id
            }
            None => {
                let listener_id = ListenerId::new();
                self.bridge.create_listener(listener_id, &options).await?;
                debug!(%observer_id, %listener_id, "created platform listener");
                listener_id
            }
        };

        let subscription = Subscription::new(listener_id, observer_id, Some(options));
        let resubscribed = self.observers.borrow().contains_key(&subscription);
        // An equal key already present keeps its original options.
        self.observers
            .borrow_mut()
            .insert(subscription, Rc::clone(&observer));

        if resubscribed {
            trace!(%observer_id, "observer already subscribed");
            return Ok(());
        }

        if fire_immediately {
            let window_size = self.bridge.get_browser_window_size().await?;
            let breakpoint = classify(window_size.width, &thresholds).into();
            observer
                .notify(&ViewportChangeEvent {
                    listener_id,
                    window_size,
                    breakpoint,
                    is_immediate: true,
                })
                .await;
        }

        Ok(())
    }

    /// Subscribe a synchronous callback under `observer_id`.
    pub async fn subscribe_fn<F>(
        &self,
        observer_id: ObserverId,
        callback: F,
        options: Option<ObservationOptions>,
        fire_immediately: bool,
    ) -> Result<(), ViewportError>
    where
        F: Fn(&ViewportChangeEvent) + 'static,
    {
        let observer = CallbackObserver::new(observer_id, options, callback);
        self.subscribe(Rc::new(observer), fire_immediately).await
    }

    /// Subscribe an asynchronous callback under `observer_id`.
    pub async fn subscribe_async_fn<F, Fut>(
        &self,
        observer_id: ObserverId,
        callback: F,
        options: Option<ObservationOptions>,
        fire_immediately: bool,
    ) -> Result<(), ViewportError>
    where
        F: Fn(ViewportChangeEvent) -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        let observer = AsyncCallbackObserver::new(observer_id, options, callback);
        self.subscribe(Rc::new(observer), fire_immediately).await
    }

    /// Remove the observer with `observer_id`. Cancels its platform listener
    /// when no other observer shares it. Unknown ids are ignored.
    ///
    /// The observer is removed even if cancelling the listener fails; the
    /// bridge error is still returned.
    pub async fn unsubscribe(&self, observer_id: ObserverId) -> Result<(), ViewportError> {
        let _guard = self.lock.lock().await;

        let (listener_id, last_on_listener) = {
            let mut observers = self.observers.borrow_mut();
            let Some(key) = observers
                .keys()
                .find(|subscription| subscription.observer_id == observer_id)
                .cloned()
            else {
                return Ok(());
            };
            let sharing = observers
                .keys()
                .filter(|subscription| subscription.listener_id == key.listener_id)
                .count();
            observers.remove(&key);
            (key.listener_id, sharing == 1)
        };

        debug!(%observer_id, %listener_id, "observer unsubscribed");
        if last_on_listener {
            debug!(%listener_id, "cancelling platform listener");
            self.bridge.cancel_listener(listener_id).await?;
        }
        Ok(())
    }

    pub async fn unsubscribe_observer(
        &self,
        observer: &dyn BrowserViewportObserver,
    ) -> Result<(), ViewportError> {
        self.unsubscribe(observer.id()).await
    }

    /// Entry point for platform listeners: deliver a resize report to every
    /// observer bound to `listener_id`, and nobody else.
    pub async fn on_platform_resize(
        &self,
        window_size: BrowserWindowSize,
        breakpoint: Breakpoint,
        listener_id: ListenerId,
    ) {
        self.latest_window_size.set(Some(window_size));

        let targets: Vec<Rc<dyn BrowserViewportObserver>> = self
            .observers
            .borrow()
            .iter()
            .filter(|(subscription, _)| subscription.listener_id == listener_id)
            .map(|(_, observer)| Rc::clone(observer))
            .collect();

        trace!(
            %listener_id,
            %breakpoint,
            width = window_size.width,
            height = window_size.height,
            observers = targets.len(),
            "platform resize"
        );

        for observer in targets {
            observer
                .notify(&ViewportChangeEvent {
                    listener_id,
                    window_size,
                    breakpoint,
                    is_immediate: false,
                })
                .await;
        }
    }

    pub async fn is_media_query_match(&self, query: &str) -> Result<bool, ViewportError> {
        Ok(self.bridge.match_media(query).await?)
    }

    /// Whether `breakpoint` holds for the current window size.
    pub async fn is_breakpoint_within_window_size(
        &self,
        breakpoint: Breakpoint,
    ) -> Result<bool, ViewportError> {
        match breakpoint {
            Breakpoint::None => Ok(false),
            Breakpoint::Always => Ok(true),
            _ => {
                let current = self.get_current_breakpoint().await?;
                Ok(is_within(breakpoint, current))
            }
        }
    }

    pub fn is_breakpoint_within_reference_size(
        &self,
        breakpoint: Breakpoint,
        reference: Breakpoint,
    ) -> bool {
        is_within(breakpoint, reference)
    }

    /// Current breakpoint under the default options' thresholds.
    ///
    /// Uses the last window size seen (from a platform report or a previous
    /// call) and only asks the bridge when none is known yet.
    pub async fn get_current_breakpoint(&self) -> Result<Breakpoint, ViewportError> {
        let window_size = match self.latest_window_size.get() {
            Some(window_size) => window_size,
            None => {
                let window_size = self.bridge.get_browser_window_size().await?;
                self.latest_window_size.set(Some(window_size));
                window_size
            }
        };
        Ok(classify(window_size.width, &self.default_options.thresholds()).into())
    }

    /// Current window size, always fetched from the bridge.
    pub async fn get_current_browser_window_size(
        &self,
    ) -> Result<BrowserWindowSize, ViewportError> {
        Ok(self.bridge.get_browser_window_size().await?)
    }

    /// Drop every observer and release the bridge. Idempotent; later
    /// subscriptions are ignored.
    pub async fn dispose(&self) -> Result<(), ViewportError> {
        let _guard = self.lock.lock().await;
        if self.disposed.replace(true) {
            return Ok(());
        }

        self.observers.borrow_mut().clear();
        debug!("viewport service disposed");
        self.bridge.dispose().await?;
        Ok(())
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    pub fn observers_count(&self) -> usize {
        self.observers.borrow().len()
    }

    /// Number of distinct platform listeners currently serving observers.
    pub fn listeners_count(&self) -> usize {
        self.observers
            .borrow()
            .keys()
            .map(|subscription| subscription.listener_id)
            .collect::<HashSet<_>>()
            .len()
    }

    fn find_reusable_listener(
        &self,
        observer_id: ObserverId,
        options: &ObservationOptions,
    ) -> Option<ListenerId> {
        let observers = self.observers.borrow();
        observers
            .keys()
            .find(|subscription| subscription.observer_id == observer_id)
            .or_else(|| {
                observers
                    .keys()
                    .find(|subscription| subscription.options.as_ref() == Some(options))
            })
            .map(|subscription| subscription.listener_id)
    }
}
