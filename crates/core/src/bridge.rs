use async_trait::async_trait;
use thiserror::Error;
use viewport_protocol::{BrowserWindowSize, ListenerId};

use crate::options::ObservationOptions;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("platform bridge is not available")]
    Unavailable,
    #[error("{operation} failed: {message}")]
    Call {
        operation: &'static str,
        message: String,
    },
    #[error("malformed bridge payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl BridgeError {
    pub fn call(operation: &'static str, message: impl Into<String>) -> Self {
        BridgeError::Call {
            operation,
            message: message.into(),
        }
    }
}

/// The narrow call surface onto the host platform.
///
/// A bridge creates and tears down real resize listeners and answers
/// point-in-time queries. Listeners it creates report back by calling
/// [`BrowserViewportService::on_platform_resize`] with their id.
///
/// Calls may suspend for arbitrarily long; the engine never retries.
///
/// [`BrowserViewportService::on_platform_resize`]: crate::service::BrowserViewportService::on_platform_resize
#[async_trait(?Send)]
pub trait PlatformBridge {
    /// Register a resize listener configured by `options` under `listener_id`.
    async fn create_listener(
        &self,
        listener_id: ListenerId,
        options: &ObservationOptions,
    ) -> Result<(), BridgeError>;

    /// Tear down a listener previously created with `create_listener`.
    async fn cancel_listener(&self, listener_id: ListenerId) -> Result<(), BridgeError>;

    async fn get_browser_window_size(&self) -> Result<BrowserWindowSize, BridgeError>;

    /// Evaluate a CSS media query.
    async fn match_media(&self, query: &str) -> Result<bool, BridgeError>;

    /// Release everything the bridge holds on the platform side.
    async fn dispose(&self) -> Result<(), BridgeError>;
}
