/// Persistence seams: a key-value settings store and an indexed object store
///
/// The browser implementations live in `chrome`; `MemoryStore` backs tests
/// and runs the recorder without a host.
use std::cell::RefCell;
use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::content::{ContentItem, ImageItem};
use crate::error::{Error, Result};

/// `chrome.storage.local`-shaped store
#[allow(async_fn_in_trait)]
pub trait SettingsStore {
    /// Values for the requested keys; missing keys are absent from the map
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>>;

    async fn set(&self, entries: Map<String, Value>) -> Result<()>;
}

/// IndexedDB-shaped store with one collection per item kind, indexed by folder
#[allow(async_fn_in_trait)]
pub trait ContentStore {
    async fn put_content(&self, item: &ContentItem) -> Result<()>;

    async fn content_for_folder(&self, folder: &str) -> Result<Vec<ContentItem>>;

    async fn delete_content(&self, id: &str) -> Result<()>;

    async fn put_image(&self, item: &ImageItem) -> Result<()>;

    async fn images_for_folder(&self, folder: &str) -> Result<Vec<ImageItem>>;

    async fn delete_image(&self, id: &str) -> Result<()>;

    /// Remove every content and image item filed under `folder`
    async fn delete_folder(&self, folder: &str) -> Result<()>;
}

#[derive(Debug, Default)]
struct MemoryData {
    settings: Map<String, Value>,
    content: BTreeMap<String, ContentItem>,
    images: BTreeMap<String, ImageItem>,
    fail_writes: bool,
}

/// In-memory implementation of both stores. Items come back in save order,
/// matching IndexedDB's `getAll` on a time-ordered index.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RefCell<MemoryData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn with_settings(settings: Map<String, Value>) -> Self {
        let store = MemoryStore::new();
        store.data.borrow_mut().settings = settings;
        store
    }

    /// Make every subsequent write fail, to exercise error paths
    pub fn fail_writes(&self, fail: bool) {
        self.data.borrow_mut().fail_writes = fail;
    }

    pub fn setting(&self, key: &str) -> Option<Value> {
        self.data.borrow().settings.get(key).cloned()
    }

    fn check_writable(&self) -> Result<()> {
        if self.data.borrow().fail_writes {
            Err(Error::storage("write rejected"))
        } else {
            Ok(())
        }
    }
}

fn by_save_order<T, K: Ord>(mut items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    items.sort_by_key(|item| key(item));
    items
}

impl SettingsStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
        let data = self.data.borrow();
        Ok(keys
            .iter()
            .filter_map(|k| data.settings.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, entries: Map<String, Value>) -> Result<()> {
        self.check_writable()?;
        self.data.borrow_mut().settings.extend(entries);
        Ok(())
    }
}

impl ContentStore for MemoryStore {
    async fn put_content(&self, item: &ContentItem) -> Result<()> {
        self.check_writable()?;
        let mut data = self.data.borrow_mut();
        if data.content.contains_key(&item.id) {
            return Err(Error::storage(format!("content item {} already exists", item.id)));
        }
        data.content.insert(item.id.clone(), item.clone());
        Ok(())
    }

    async fn content_for_folder(&self, folder: &str) -> Result<Vec<ContentItem>> {
        let items = self
            .data
            .borrow()
            .content
            .values()
            .filter(|c| c.folder_name == folder)
            .cloned()
            .collect();
        Ok(by_save_order(items, |c: &ContentItem| c.saved_at.clone()))
    }

    async fn delete_content(&self, id: &str) -> Result<()> {
        self.check_writable()?;
        self.data.borrow_mut().content.remove(id);
        Ok(())
    }

    async fn put_image(&self, item: &ImageItem) -> Result<()> {
        self.check_writable()?;
        let mut data = self.data.borrow_mut();
        if data.images.contains_key(&item.id) {
            return Err(Error::storage(format!("image {} already exists", item.id)));
        }
        data.images.insert(item.id.clone(), item.clone());
        Ok(())
    }

    async fn images_for_folder(&self, folder: &str) -> Result<Vec<ImageItem>> {
        let items = self
            .data
            .borrow()
            .images
            .values()
            .filter(|i| i.folder_name == folder)
            .cloned()
            .collect();
        Ok(by_save_order(items, |i: &ImageItem| i.uploaded_at.clone()))
    }

    async fn delete_image(&self, id: &str) -> Result<()> {
        self.check_writable()?;
        self.data.borrow_mut().images.remove(id);
        Ok(())
    }

    async fn delete_folder(&self, folder: &str) -> Result<()> {
        self.check_writable()?;
        let mut data = self.data.borrow_mut();
        data.content.retain(|_, c| c.folder_name != folder);
        data.images.retain(|_, i| i.folder_name != folder);
        Ok(())
    }
}
