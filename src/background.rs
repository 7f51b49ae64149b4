/// Service worker entry point
///
/// `background.js` calls `startBackground` once, keeps the returned object and
/// forwards `chrome.runtime.onMessage` and `chrome.tabs.onUpdated` into it.

use js_sys::Promise;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

use crate::chrome::{ActiveTab, ChromeSettings, IndexedDb, now_iso, to_js};
use crate::config::RecorderConfig;
use crate::error::{Error, Result};
use crate::messages::{Request, Response};
use crate::navigation::TabUpdate;
use crate::queue::{self, RecorderHandle};
use crate::service::Recorder;

fn parse_config(value: JsValue) -> Result<RecorderConfig> {
    if value.is_null() || value.is_undefined() {
        return Ok(RecorderConfig::default());
    }
    let config: RecorderConfig = serde_wasm_bindgen::from_value(value)
        .map_err(|e| Error::config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

#[wasm_bindgen]
pub struct Background {
    handle: RecorderHandle,
}

#[wasm_bindgen(js_name = startBackground)]
pub async fn start_background(config: JsValue) -> std::result::Result<Background, JsValue> {
    let config = parse_config(config)?;
    log::set_max_level(config.log_filter()?.to_level_filter());

    let content = IndexedDb::open(&config).await?;
    let recorder = Recorder::load(config, ChromeSettings, content, ActiveTab, now_iso).await?;

    let (handle, jobs) = queue::channel();
    spawn_local(queue::run_queue(recorder, jobs));
    log::info!("Background recorder ready");

    Ok(Background { handle })
}

#[wasm_bindgen]
impl Background {
    /// Resolves to the reply object for `sendResponse`
    #[wasm_bindgen(js_name = handleMessage)]
    pub fn handle_message(&self, message: JsValue) -> Promise {
        let handle = self.handle.clone();
        future_to_promise(async move {
            let response = match serde_wasm_bindgen::from_value::<Request>(message) {
                Ok(request) => handle.request(request).await,
                Err(e) => {
                    log::warn!("Dropping malformed message: {}", e);
                    Response::from(Error::InvalidMessage(e.to_string()))
                }
            };
            Ok(to_js(&response)?)
        })
    }

    /// Resolves to `true` when the URL was appended to the active folder
    #[wasm_bindgen(js_name = tabUpdated)]
    pub fn tab_updated(&self, tab_id: i32, status: Option<String>, url: Option<String>) -> Promise {
        let handle = self.handle.clone();
        let update = TabUpdate { tab_id, status, url };
        future_to_promise(async move {
            let visit = handle.tab_updated(update).await?;
            Ok(JsValue::from_bool(matches!(visit, crate::folders::Visit::Appended { .. })))
        })
    }
}
