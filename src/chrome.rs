/// Browser-backed stores: chrome.storage.local, IndexedDB and the active tab

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use wasm_bindgen::prelude::*;

use crate::config::RecorderConfig;
use crate::content::{ContentItem, ImageItem};
use crate::error::{Error, Result, js_message};
use crate::service::{PageCapture, PageSource};
use crate::store::{ContentStore, SettingsStore};

// Import JS bridge functions
#[wasm_bindgen(module = "/chrome_bridge.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getStorage(keys: JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setStorage(entries: JsValue) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn openDatabase(name: String, version: u32, stores: JsValue, index: String) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn dbPut(db: JsValue, store: String, item: JsValue) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn dbGetAllByIndex(db: JsValue, store: String, index: String, key: String) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn dbDelete(db: JsValue, store: String, id: String) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn dbDeleteByIndex(db: JsValue, stores: JsValue, index: String, key: String) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn captureActivePage() -> std::result::Result<JsValue, JsValue>;
}

/// Plain JS objects rather than `Map`s, so chrome.storage and IndexedDB can clone them
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue> {
    Ok(value.serialize(&serde_wasm_bindgen::Serializer::json_compatible())?)
}

fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T> {
    Ok(serde_wasm_bindgen::from_value(value)?)
}

/// Current time as an ISO-8601 string
pub fn now_iso() -> String {
    js_sys::Date::new_0().to_iso_string().into()
}

pub struct ChromeSettings;

impl SettingsStore for ChromeSettings {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let values = getStorage(to_js(keys)?)
            .await
            .map_err(|e| Error::from_js("Failed to read settings", e))?;
        if values.is_null() || values.is_undefined() {
            return Ok(Map::new());
        }
        from_js(values)
    }

    async fn set(&self, entries: Map<String, Value>) -> Result<()> {
        setStorage(to_js(&entries)?)
            .await
            .map_err(|e| Error::from_js("Failed to save settings", e))
    }
}

/// The extension's IndexedDB database with its content and image stores
pub struct IndexedDb {
    db: JsValue,
    content_store: String,
    image_store: String,
    folder_index: String,
}

impl IndexedDb {
    pub async fn open(config: &RecorderConfig) -> Result<IndexedDb> {
        let stores = to_js(&[&config.content_store, &config.image_store])?;
        let db = openDatabase(
            config.database_name.clone(),
            config.database_version,
            stores,
            config.folder_index.clone(),
        )
        .await
        .map_err(|e| Error::from_js("Failed to open database", e))?;
        log::info!("Opened {} v{}", config.database_name, config.database_version);
        Ok(IndexedDb {
            db,
            content_store: config.content_store.clone(),
            image_store: config.image_store.clone(),
            folder_index: config.folder_index.clone(),
        })
    }

    async fn put<T: Serialize>(&self, store: &str, item: &T) -> Result<()> {
        dbPut(self.db.clone(), store.to_string(), to_js(item)?)
            .await
            .map_err(|e| Error::from_js("Failed to save item", e))
    }

    async fn by_folder<T: DeserializeOwned>(&self, store: &str, folder: &str) -> Result<Vec<T>> {
        let items = dbGetAllByIndex(
            self.db.clone(),
            store.to_string(),
            self.folder_index.clone(),
            folder.to_string(),
        )
        .await
        .map_err(|e| Error::from_js("Failed to load items", e))?;
        from_js(items)
    }

    async fn delete(&self, store: &str, id: &str) -> Result<()> {
        dbDelete(self.db.clone(), store.to_string(), id.to_string())
            .await
            .map_err(|e| Error::from_js("Failed to delete item", e))
    }
}

impl ContentStore for IndexedDb {
    async fn put_content(&self, item: &ContentItem) -> Result<()> {
        self.put(&self.content_store, item).await
    }

    async fn content_for_folder(&self, folder: &str) -> Result<Vec<ContentItem>> {
        self.by_folder(&self.content_store, folder).await
    }

    async fn delete_content(&self, id: &str) -> Result<()> {
        self.delete(&self.content_store, id).await
    }

    async fn put_image(&self, item: &ImageItem) -> Result<()> {
        self.put(&self.image_store, item).await
    }

    async fn images_for_folder(&self, folder: &str) -> Result<Vec<ImageItem>> {
        self.by_folder(&self.image_store, folder).await
    }

    async fn delete_image(&self, id: &str) -> Result<()> {
        self.delete(&self.image_store, id).await
    }

    async fn delete_folder(&self, folder: &str) -> Result<()> {
        let stores = to_js(&[&self.content_store, &self.image_store])?;
        dbDeleteByIndex(self.db.clone(), stores, self.folder_index.clone(), folder.to_string())
            .await
            .map_err(|e| Error::from_js("Failed to delete folder items", e))
    }
}

/// Captures the focused tab through `chrome.scripting`
pub struct ActiveTab;

impl PageSource for ActiveTab {
    async fn capture_active_page(&self) -> Result<PageCapture> {
        let page = captureActivePage()
            .await
            .map_err(|e| Error::extraction(js_message(&e)))?;
        if page.is_null() || page.is_undefined() {
            return Err(Error::NoActivePage);
        }
        from_js(page)
    }
}
