use async_trait::async_trait;
use js_sys::Promise;
use viewport_core::{BridgeError, ObservationOptions, PlatformBridge};
use viewport_protocol::{BrowserWindowSize, ListenerId};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

mod js {
    use js_sys::Promise;
    use wasm_bindgen::prelude::*;

    // Provided by the page: `window.viewportResizeListener`. Every function
    // returns a Promise.
    #[wasm_bindgen(js_namespace = viewportResizeListener)]
    extern "C" {
        #[wasm_bindgen(js_name = listenForResize, catch)]
        pub fn listen_for_resize(options_json: &str, listener_id: &str) -> Result<Promise, JsValue>;

        #[wasm_bindgen(js_name = cancelListener, catch)]
        pub fn cancel_listener(listener_id: &str) -> Result<Promise, JsValue>;

        /// Resolves to a JSON string `{"width":..,"height":..}`.
        #[wasm_bindgen(js_name = getBrowserWindowSize, catch)]
        pub fn get_browser_window_size() -> Result<Promise, JsValue>;

        #[wasm_bindgen(js_name = matchMedia, catch)]
        pub fn match_media(query: &str) -> Result<Promise, JsValue>;

        #[wasm_bindgen(js_name = dispose, catch)]
        pub fn dispose() -> Result<Promise, JsValue>;
    }
}

/// [`PlatformBridge`] backed by the page's `viewportResizeListener` module.
/// Listeners it creates report back through `raise_on_resized`.
pub struct JsBridge;

fn js_error(operation: &'static str, value: &JsValue) -> BridgeError {
    let message = value
        .as_string()
        .unwrap_or_else(|| format!("{value:?}"));
    BridgeError::call(operation, message)
}

async fn call(
    operation: &'static str,
    promise: Result<Promise, JsValue>,
) -> Result<JsValue, BridgeError> {
    let promise = promise.map_err(|e| js_error(operation, &e))?;
    JsFuture::from(promise)
        .await
        .map_err(|e| js_error(operation, &e))
}

#[async_trait(?Send)]
impl PlatformBridge for JsBridge {
    async fn create_listener(
        &self,
        listener_id: ListenerId,
        options: &ObservationOptions,
    ) -> Result<(), BridgeError> {
        let options_json = serde_json::to_string(options)?;
        let id = listener_id.to_string();
        call(
            "listenForResize",
            js::listen_for_resize(&options_json, &id),
        )
        .await?;
        Ok(())
    }

    async fn cancel_listener(&self, listener_id: ListenerId) -> Result<(), BridgeError> {
        let id = listener_id.to_string();
        call("cancelListener", js::cancel_listener(&id)).await?;
        Ok(())
    }

    async fn get_browser_window_size(&self) -> Result<BrowserWindowSize, BridgeError> {
        let value = call("getBrowserWindowSize", js::get_browser_window_size()).await?;
        let json = value
            .as_string()
            .ok_or_else(|| js_error("getBrowserWindowSize", &value))?;
        Ok(serde_json::from_str(&json)?)
    }

    async fn match_media(&self, query: &str) -> Result<bool, BridgeError> {
        let value = call("matchMedia", js::match_media(query)).await?;
        value.as_bool().ok_or_else(|| js_error("matchMedia", &value))
    }

    async fn dispose(&self) -> Result<(), BridgeError> {
        call("dispose", js::dispose()).await?;
        Ok(())
    }
}
