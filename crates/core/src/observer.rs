use std::future::Future;

use async_trait::async_trait;
use serde::Serialize;
use viewport_protocol::{Breakpoint, BrowserWindowSize, ListenerId, ObserverId};

use crate::options::ObservationOptions;

/// One notification delivered to one observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportChangeEvent {
    /// The platform listener that produced the change.
    pub listener_id: ListenerId,
    pub window_size: BrowserWindowSize,
    pub breakpoint: Breakpoint,
    /// Set for the synthetic first notification sent at subscribe time.
    pub is_immediate: bool,
}

/// Something that wants viewport change notifications.
#[async_trait(?Send)]
pub trait BrowserViewportObserver {
    /// Stable identity. Subscribing twice with the same id is a no-op.
    fn id(&self) -> ObserverId;

    /// Listener configuration this observer wants. `None` means the engine
    /// defaults. Read once, at subscribe time.
    fn options(&self) -> Option<ObservationOptions> {
        None
    }

    async fn notify(&self, event: &ViewportChangeEvent);
}

/// Adapts a plain closure to [`BrowserViewportObserver`].
pub struct CallbackObserver<F> {
    id: ObserverId,
    options: Option<ObservationOptions>,
    callback: F,
}

impl<F> CallbackObserver<F>
where
    F: Fn(&ViewportChangeEvent),
{
    pub fn new(id: ObserverId, options: Option<ObservationOptions>, callback: F) -> Self {
        Self {
            id,
            options,
            callback,
        }
    }
}

#[async_trait(?Send)]
impl<F> BrowserViewportObserver for CallbackObserver<F>
where
    F: Fn(&ViewportChangeEvent) + 'static,
{
    fn id(&self) -> ObserverId {
        self.id
    }

    fn options(&self) -> Option<ObservationOptions> {
        self.options.clone()
    }

    async fn notify(&self, event: &ViewportChangeEvent) {
        (self.callback)(event);
    }
}

/// Adapts a closure returning a future to [`BrowserViewportObserver`].
pub struct AsyncCallbackObserver<F> {
    id: ObserverId,
    options: Option<ObservationOptions>,
    callback: F,
}

impl<F, Fut> AsyncCallbackObserver<F>
where
    F: Fn(ViewportChangeEvent) -> Fut,
    Fut: Future<Output = ()>,
{
    pub fn new(id: ObserverId, options: Option<ObservationOptions>, callback: F) -> Self {
        Self {
            id,
            options,
            callback,
        }
    }
}

#[async_trait(?Send)]
impl<F, Fut> BrowserViewportObserver for AsyncCallbackObserver<F>
where
    F: Fn(ViewportChangeEvent) -> Fut + 'static,
    Fut: Future<Output = ()> + 'static,
{
    fn id(&self) -> ObserverId {
        self.id
    }

    fn options(&self) -> Option<ObservationOptions> {
        self.options.clone()
    }

    async fn notify(&self, event: &ViewportChangeEvent) {
        (self.callback)(*event).await;
    }
}
