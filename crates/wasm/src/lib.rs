mod bridge;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::warn;
use viewport_core::{
    BrowserViewportService, ObservationOptions, ViewportChangeEvent, ViewportError, is_within,
};
use viewport_protocol::{Breakpoint, BrowserWindowSize, ListenerId, ObserverId};
use wasm_bindgen::prelude::*;

pub use bridge::JsBridge;

thread_local! {
    static SERVICE: RefCell<Option<Rc<BrowserViewportService>>> = const { RefCell::new(None) };
}

fn service() -> Result<Rc<BrowserViewportService>, JsError> {
    SERVICE
        .with_borrow(Clone::clone)
        .ok_or_else(|| JsError::new("viewport service not initialized; call init() first"))
}

fn js_err(err: impl std::fmt::Display) -> JsError {
    JsError::new(&err.to_string())
}

fn parse_options(json: Option<&str>) -> Result<Option<ObservationOptions>, ViewportError> {
    json.map(|json| ObservationOptions::from_json(json.as_bytes()))
        .transpose()
        .map_err(ViewportError::from)
}

/// Make `service` the page's service. A service it replaces is disposed so
/// its platform listeners are cancelled.
async fn install(service: BrowserViewportService) -> Result<(), ViewportError> {
    let previous = SERVICE.with_borrow_mut(|slot| slot.replace(Rc::new(service)));
    if let Some(previous) = previous {
        warn!("viewport service re-initialized; disposing the previous one");
        previous.dispose().await?;
    }
    Ok(())
}

/// Create the page's viewport service. `default_options_json` configures
/// observers that bring no options of their own. Calling it again disposes
/// the current service first.
#[wasm_bindgen]
pub async fn init(default_options_json: Option<String>) -> Result<(), JsError> {
    console_error_panic_hook::set_once();

    let options = parse_options(default_options_json.as_deref())
        .map_err(js_err)?
        .unwrap_or_default();
    let service = BrowserViewportService::with_options(Rc::new(JsBridge), options);
    install(service).await.map_err(js_err)
}

/// Subscribe a JS callback. It receives each change as a JSON string.
#[wasm_bindgen]
pub async fn subscribe(
    observer_id: String,
    callback: js_sys::Function,
    options_json: Option<String>,
    fire_immediately: bool,
) -> Result<(), JsError> {
    let service = service()?;
    let observer_id: ObserverId = observer_id.parse().map_err(js_err)?;
    let options = parse_options(options_json.as_deref()).map_err(js_err)?;

    let notify = move |event: &ViewportChangeEvent| match serde_json::to_string(event) {
        Ok(json) => {
            if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
                web_sys::console::error_1(
                    &format!("viewport: callback for {observer_id} threw: {err:?}").into(),
                );
            }
        }
        Err(err) => {
            web_sys::console::error_1(&format!("viewport: event encode error: {err}").into());
        }
    };

    service
        .subscribe_fn(observer_id, notify, options, fire_immediately)
        .await
        .map_err(js_err)
}

#[wasm_bindgen]
pub async fn unsubscribe(observer_id: String) -> Result<(), JsError> {
    let service = service()?;
    let observer_id: ObserverId = observer_id.parse().map_err(js_err)?;
    service.unsubscribe(observer_id).await.map_err(js_err)
}

/// Called by JS resize listeners.
#[wasm_bindgen]
pub async fn raise_on_resized(
    width: u32,
    height: u32,
    breakpoint: String,
    listener_id: String,
) -> Result<(), JsError> {
    let service = service()?;
    let breakpoint: Breakpoint = breakpoint.parse().map_err(js_err)?;
    let listener_id: ListenerId = listener_id.parse().map_err(js_err)?;
    service
        .on_platform_resize(BrowserWindowSize::new(width, height), breakpoint, listener_id)
        .await;
    Ok(())
}

#[wasm_bindgen]
pub async fn is_media_query_match(query: String) -> Result<bool, JsError> {
    service()?
        .is_media_query_match(&query)
        .await
        .map_err(js_err)
}

#[wasm_bindgen]
pub async fn is_breakpoint_within_window_size(breakpoint: String) -> Result<bool, JsError> {
    let breakpoint: Breakpoint = breakpoint.parse().map_err(js_err)?;
    service()?
        .is_breakpoint_within_window_size(breakpoint)
        .await
        .map_err(js_err)
}

#[wasm_bindgen]
pub fn is_breakpoint_within_reference_size(
    breakpoint: &str,
    reference: &str,
) -> Result<bool, JsError> {
    let breakpoint: Breakpoint = breakpoint.parse().map_err(js_err)?;
    let reference: Breakpoint = reference.parse().map_err(js_err)?;
    Ok(is_within(breakpoint, reference))
}

#[wasm_bindgen]
pub async fn get_current_breakpoint() -> Result<String, JsError> {
    let breakpoint = service()?.get_current_breakpoint().await.map_err(js_err)?;
    Ok(breakpoint.to_string())
}

/// Current window size as JSON.
#[wasm_bindgen]
pub async fn get_current_browser_window_size() -> Result<String, JsError> {
    let size = service()?
        .get_current_browser_window_size()
        .await
        .map_err(js_err)?;
    serde_json::to_string(&size).map_err(js_err)
}

#[wasm_bindgen]
pub async fn dispose() -> Result<(), JsError> {
    service()?.dispose().await.map_err(js_err)
}
