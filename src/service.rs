/// The background recorder: sole owner of session state
///
/// Every command from the popup and every navigation event is applied here,
/// then persisted before the caller gets an answer. A failed write rolls the
/// in-memory state back to the last persisted snapshot, so memory and storage
/// never disagree after an error.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::config::RecorderConfig;
use crate::content::{ContentItem, DataUrl, ImageItem, validate_upload};
use crate::crop::{CropArea, check_selection, crop_screenshot};
use crate::error::{Error, Result};
use crate::extract::extract_page;
use crate::folders::{FolderMap, FolderState, SessionSnapshot, Visit};
use crate::messages::{Request, Response};
use crate::navigation::TabUpdate;
use crate::store::{ContentStore, SettingsStore};

/// The page the user is looking at, as serialized by the content script
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct PageCapture {
    pub url: String,
    pub title: String,
    pub html: String,
}

#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn capture_active_page(&self) -> Result<PageCapture>;
}

/// Returns the current time as an ISO-8601 string
pub type Clock = fn() -> String;

pub struct Recorder<S, C, P> {
    config: RecorderConfig,
    state: FolderState,
    persisted: FolderState,
    settings: S,
    content: C,
    pages: P,
    clock: Clock,
}

fn read_key<T: DeserializeOwned + Default>(values: &mut Map<String, Value>, key: &str) -> T {
    match values.remove(key) {
        None | Some(Value::Null) => T::default(),
        Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable '{}' in storage: {}", key, e);
            T::default()
        }),
    }
}

impl<S, C, P> Recorder<S, C, P>
where
    S: SettingsStore,
    C: ContentStore,
    P: PageSource,
{
    /// Re-hydrate session state from the settings store
    pub async fn load(config: RecorderConfig, settings: S, content: C, pages: P, clock: Clock) -> Result<Self> {
        let keys = &config.storage_keys;
        let mut values = settings
            .get(&[
                keys.folders.as_str(),
                keys.is_recording.as_str(),
                keys.current_folder.as_str(),
            ])
            .await?;

        let stored = SessionSnapshot {
            folders: read_key::<FolderMap>(&mut values, &keys.folders),
            is_recording: read_key::<bool>(&mut values, &keys.is_recording),
            current_folder: read_key::<Option<String>>(&mut values, &keys.current_folder),
        };
        let state = FolderState::from_snapshot(stored.clone());
        log::info!(
            "Loaded {} folder(s), recording: {}",
            state.snapshot().folders.len(),
            state.current_folder().unwrap_or("no")
        );

        let mut recorder = Recorder {
            persisted: FolderState::from_snapshot(stored.clone()),
            state,
            config,
            settings,
            content,
            pages,
            clock,
        };
        if recorder.state.snapshot() != stored {
            recorder.persist().await?;
        }
        Ok(recorder)
    }

    pub fn state(&self) -> &FolderState {
        &self.state
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// Apply one command and build its reply. Errors become `{success: false}`.
    pub async fn handle(&mut self, request: Request) -> Response {
        let kind = request.kind();
        log::debug!("Handling {}", kind);
        let result = self.dispatch(request).await;
        if let Err(e) = &result {
            log::warn!("{} failed: {}", kind, e);
        }
        result.into()
    }

    async fn dispatch(&mut self, request: Request) -> Result<Response> {
        match request {
            Request::GetState => Ok(Response::State(self.state.snapshot())),
            Request::CreateFolder { folder_name } => {
                self.create_folder(&folder_name).await?;
                Ok(Response::done())
            }
            Request::StartRecording { folder_name } => {
                self.start_recording(&folder_name).await?;
                Ok(Response::done())
            }
            Request::StopRecording => {
                self.stop_recording().await?;
                Ok(Response::done())
            }
            Request::ClearFolder { folder_name } => {
                self.clear_folder(&folder_name).await?;
                Ok(Response::done())
            }
            Request::SavePageText { folder_name } => {
                Ok(Response::saved_content(self.save_page_text(&folder_name).await?))
            }
            Request::GetSavedContent { folder_name } => {
                let folder = self.require_folder(&folder_name)?;
                Ok(Response::content_list(self.content.content_for_folder(&folder).await?))
            }
            Request::SaveImage {
                folder_name,
                image_data,
                file_name,
                file_type,
            } => {
                let image = self
                    .save_image(&folder_name, &image_data, &file_name, &file_type)
                    .await?;
                Ok(Response::saved_image(image))
            }
            Request::SaveCroppedImage {
                folder_name,
                cropped_data_url,
                image_data,
                area,
                ..
            } => {
                let image = match (cropped_data_url, image_data) {
                    (Some(cropped), _) => self.save_precropped_image(&folder_name, &cropped, &area).await?,
                    (None, Some(screenshot)) => self.save_cropped_image(&folder_name, &screenshot, &area).await?,
                    (None, None) => {
                        return Err(Error::InvalidMessage(
                            "SAVE_CROPPED_IMAGE needs croppedDataUrl or imageData".to_string(),
                        ));
                    }
                };
                Ok(Response::saved_image(image))
            }
            Request::GetSavedImages { folder_name } => {
                let folder = self.require_folder(&folder_name)?;
                Ok(Response::image_list(self.content.images_for_folder(&folder).await?))
            }
            Request::DeleteSavedContent { content_id } => {
                self.content.delete_content(&content_id).await?;
                log::info!("Deleted saved content {}", content_id);
                Ok(Response::done())
            }
            Request::DeleteSavedImage { image_id } => {
                self.content.delete_image(&image_id).await?;
                log::info!("Deleted saved image {}", image_id);
                Ok(Response::done())
            }
        }
    }

    pub async fn create_folder(&mut self, name: &str) -> Result<()> {
        if self.state.create_folder(name)? {
            log::info!("Created folder '{}'", name.trim());
            self.persist().await?;
        }
        Ok(())
    }

    pub async fn start_recording(&mut self, name: &str) -> Result<()> {
        self.state.start_recording(name)?;
        log::info!("Recording into '{}'", name.trim());
        self.persist().await
    }

    pub async fn stop_recording(&mut self) -> Result<()> {
        self.state.stop_recording();
        log::info!("Recording stopped");
        self.persist().await
    }

    /// Drop the folder, its URLs and every text and image item saved into it
    pub async fn clear_folder(&mut self, name: &str) -> Result<()> {
        let folder = self.require_folder(name)?;
        self.content.delete_folder(&folder).await?;
        let removed = self.state.clear_folder(&folder)?;
        log::info!("Cleared folder '{}' ({} URLs)", folder, removed.len());
        self.persist().await
    }

    /// Navigation observer: record a completed http(s) load into the active folder
    pub async fn on_tab_updated(&mut self, update: &TabUpdate) -> Result<Visit> {
        if !self.state.is_recording() {
            return Ok(Visit::NotRecording);
        }
        let Some(url) = update.recordable_url(&self.config.recordable_schemes) else {
            return Ok(Visit::NotRecording);
        };
        let visit = self.state.record_visit(url);
        if let Visit::Appended { folder, position } = &visit {
            log::debug!("Tab {} visit #{} in '{}': {}", update.tab_id, position + 1, folder, url);
            self.persist().await?;
        }
        Ok(visit)
    }

    pub async fn save_page_text(&mut self, folder_name: &str) -> Result<ContentItem> {
        let folder = self.require_folder(folder_name)?;
        let page = self.pages.capture_active_page().await?;
        let extracted = extract_page(&page.html)?;
        let title = if page.title.trim().is_empty() {
            extracted.title.unwrap_or_default()
        } else {
            page.title
        };
        let item = ContentItem::new(&folder, &page.url, &title, extracted.text, (self.clock)());
        self.content.put_content(&item).await?;
        log::info!("Saved {} chars of text from {} into '{}'", item.text.len(), item.url, folder);
        Ok(item)
    }

    pub async fn save_image(
        &mut self,
        folder_name: &str,
        image_data: &str,
        file_name: &str,
        file_type: &str,
    ) -> Result<ImageItem> {
        let folder = self.require_folder(folder_name)?;
        let data = validate_upload(file_type, image_data, self.config.max_image_bytes)?;
        let item = ImageItem::new(&folder, &data, file_name, (self.clock)());
        self.content.put_image(&item).await?;
        log::info!("Saved image '{}' ({} bytes) into '{}'", item.file_name, item.size, folder);
        Ok(item)
    }

    pub async fn save_cropped_image(
        &mut self,
        folder_name: &str,
        screenshot: &str,
        area: &CropArea,
    ) -> Result<ImageItem> {
        let folder = self.require_folder(folder_name)?;
        let screenshot = DataUrl::parse(screenshot)?;
        let cropped = crop_screenshot(&screenshot, area, self.config.min_selection)?;
        self.store_capture(&folder, &cropped).await
    }

    /// Store a region the capture page already cropped, after the same size rules
    pub async fn save_precropped_image(
        &mut self,
        folder_name: &str,
        cropped: &str,
        area: &CropArea,
    ) -> Result<ImageItem> {
        let folder = self.require_folder(folder_name)?;
        check_selection(area, self.config.min_selection)?;
        let mime_type = DataUrl::parse(cropped)?.mime_type;
        let data = validate_upload(&mime_type, cropped, self.config.max_image_bytes)?;
        self.store_capture(&folder, &data).await
    }

    async fn store_capture(&mut self, folder: &str, data: &DataUrl) -> Result<ImageItem> {
        let saved_at = (self.clock)();
        let file_name = format!("capture-{}.png", saved_at.replace(':', "-"));
        let item = ImageItem::new(folder, data, &file_name, saved_at);
        self.content.put_image(&item).await?;
        log::info!("Saved cropped capture '{}' into '{}'", item.file_name, folder);
        Ok(item)
    }

    fn require_folder(&self, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::EmptyFolderName);
        }
        if !self.state.contains(name) {
            return Err(Error::FolderNotFound(name.to_string()));
        }
        Ok(name.to_string())
    }

    async fn persist(&mut self) -> Result<()> {
        let snapshot = self.state.snapshot();
        let keys = &self.config.storage_keys;
        let mut entries = Map::new();
        entries.insert(keys.folders.clone(), serde_json::to_value(&snapshot.folders)?);
        entries.insert(keys.is_recording.clone(), Value::Bool(snapshot.is_recording));
        entries.insert(
            keys.current_folder.clone(),
            snapshot.current_folder.map_or(Value::Null, Value::String),
        );

        match self.settings.set(entries).await {
            Ok(()) => {
                self.persisted = self.state.clone();
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to persist session state, rolling back: {}", e);
                self.state = self.persisted.clone();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use futures::executor::block_on;
    use serde_json::json;
    use std::rc::Rc;

    struct FixedPage(Option<PageCapture>);

    impl PageSource for FixedPage {
        async fn capture_active_page(&self) -> Result<PageCapture> {
            self.0.clone().ok_or(Error::NoActivePage)
        }
    }

    /// Lets a test keep a handle on the store the recorder owns
    impl SettingsStore for Rc<MemoryStore> {
        async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>> {
            SettingsStore::get(&**self, keys).await
        }

        async fn set(&self, entries: Map<String, Value>) -> Result<()> {
            SettingsStore::set(&**self, entries).await
        }
    }

    fn clock() -> String {
        "2024-05-01T12:00:00.000Z".to_string()
    }

    type TestRecorder = Recorder<Rc<MemoryStore>, MemoryStore, FixedPage>;

    fn article_page() -> PageCapture {
        PageCapture {
            url: "https://news.example.com/story".to_string(),
            title: "Story".to_string(),
            html: "<nav>menu</nav><main><p>Lead   paragraph.</p></main>".to_string(),
        }
    }

    fn recorder_with(settings: Rc<MemoryStore>, page: Option<PageCapture>) -> TestRecorder {
        block_on(Recorder::load(
            RecorderConfig::default(),
            settings,
            MemoryStore::new(),
            FixedPage(page),
            clock,
        ))
        .unwrap()
    }

    fn recorder() -> (TestRecorder, Rc<MemoryStore>) {
        let settings = Rc::new(MemoryStore::new());
        (recorder_with(settings.clone(), Some(article_page())), settings)
    }

    fn send(recorder: &mut TestRecorder, request: serde_json::Value) -> serde_json::Value {
        let request: Request = serde_json::from_value(request).unwrap();
        serde_json::to_value(block_on(recorder.handle(request))).unwrap()
    }

    fn navigate(recorder: &mut TestRecorder, url: &str) -> Visit {
        block_on(recorder.on_tab_updated(&TabUpdate::completed(1, url))).unwrap()
    }

    fn png_data_url(width: u32, height: u32) -> String {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut buf = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, image::ImageOutputFormat::Png)
            .unwrap();
        format!("data:image/png;base64,{}", STANDARD.encode(buf.into_inner()))
    }

    #[test]
    fn test_example_session_persists_urls() {
        let (mut rec, settings) = recorder();

        assert_eq!(send(&mut rec, json!({"type": "CREATE_FOLDER", "folderName": "caseA"})), json!({"success": true}));
        assert_eq!(settings.setting("folders"), Some(json!({"caseA": []})));

        send(&mut rec, json!({"type": "START_RECORDING", "folderName": "caseA"}));
        navigate(&mut rec, "https://example.com");
        assert_eq!(navigate(&mut rec, "https://example.com"), Visit::Duplicate);
        navigate(&mut rec, "https://other.com");

        let state = send(&mut rec, json!({"type": "GET_STATE"}));
        assert_eq!(
            state,
            json!({
                "isRecording": true,
                "folders": {"caseA": ["https://example.com", "https://other.com"]},
                "currentFolder": "caseA"
            })
        );
        assert_eq!(
            settings.setting("folders"),
            Some(json!({"caseA": ["https://example.com", "https://other.com"]}))
        );
        assert_eq!(settings.setting("currentFolder"), Some(json!("caseA")));
    }

    #[test]
    fn test_observer_filters_and_dedupes_arrival_order() {
        let (mut rec, _) = recorder();
        block_on(rec.start_recording("caseA")).unwrap();

        let arrivals = [
            "https://a.com",
            "chrome://newtab",
            "https://a.com",
            "http://b.com",
            "file:///etc/hosts",
            "http://b.com",
            "https://a.com",
        ];
        for url in arrivals {
            navigate(&mut rec, url);
        }
        block_on(rec.on_tab_updated(&TabUpdate::new(2, Some("loading"), Some("https://c.com")))).unwrap();

        assert_eq!(
            rec.state().folder("caseA").unwrap(),
            ["https://a.com", "http://b.com", "https://a.com"]
        );
    }

    #[test]
    fn test_navigation_ignored_when_not_recording() {
        let (mut rec, settings) = recorder();
        block_on(rec.create_folder("caseA")).unwrap();

        assert_eq!(navigate(&mut rec, "https://example.com"), Visit::NotRecording);
        assert_eq!(settings.setting("folders"), Some(json!({"caseA": []})));
    }

    #[test]
    fn test_stop_then_start_resumes_list() {
        let (mut rec, _) = recorder();
        block_on(rec.start_recording("caseA")).unwrap();
        navigate(&mut rec, "https://one.com");
        send(&mut rec, json!({"type": "STOP_RECORDING"}));
        navigate(&mut rec, "https://ignored.com");
        send(&mut rec, json!({"type": "START_RECORDING", "folderName": "caseA"}));
        navigate(&mut rec, "https://two.com");

        assert_eq!(rec.state().folder("caseA").unwrap(), ["https://one.com", "https://two.com"]);
    }

    #[test]
    fn test_create_existing_folder_keeps_list() {
        let (mut rec, _) = recorder();
        block_on(rec.start_recording("caseA")).unwrap();
        navigate(&mut rec, "https://one.com");

        let reply = send(&mut rec, json!({"type": "CREATE_FOLDER", "folderName": "caseA"}));

        assert_eq!(reply, json!({"success": true}));
        assert_eq!(rec.state().folder("caseA").unwrap(), ["https://one.com"]);
    }

    #[test]
    fn test_invalid_folder_names_surface_errors() {
        let (mut rec, _) = recorder();

        let empty = send(&mut rec, json!({"type": "CREATE_FOLDER", "folderName": "  "}));
        assert_eq!(empty["success"], false);
        assert_eq!(empty["error"], "Folder name must not be empty");

        let missing = send(&mut rec, json!({"type": "CLEAR_FOLDER", "folderName": "ghost"}));
        assert_eq!(missing["error"], "Folder \"ghost\" does not exist");
    }

    #[test]
    fn test_clear_folder_persists_removal() {
        let (mut rec, settings) = recorder();
        block_on(rec.create_folder("caseA")).unwrap();
        block_on(rec.create_folder("caseB")).unwrap();

        send(&mut rec, json!({"type": "CLEAR_FOLDER", "folderName": "caseA"}));

        assert_eq!(settings.setting("folders"), Some(json!({"caseB": []})));
    }

    #[test]
    fn test_clear_folder_discards_saved_items() {
        let (mut rec, _) = recorder();
        block_on(rec.create_folder("caseA")).unwrap();
        block_on(rec.create_folder("caseB")).unwrap();
        send(&mut rec, json!({"type": "SAVE_PAGE_TEXT", "folderName": "caseA"}));
        send(&mut rec, json!({"type": "SAVE_PAGE_TEXT", "folderName": "caseB"}));
        send(&mut rec, json!({
            "type": "SAVE_IMAGE",
            "folderName": "caseA",
            "imageData": png_data_url(20, 20),
            "fileName": "shot.png",
            "fileType": "image/png"
        }));

        assert_eq!(send(&mut rec, json!({"type": "CLEAR_FOLDER", "folderName": "caseA"})), json!({"success": true}));
        send(&mut rec, json!({"type": "CREATE_FOLDER", "folderName": "caseA"}));

        let content = send(&mut rec, json!({"type": "GET_SAVED_CONTENT", "folderName": "caseA"}));
        assert_eq!(content, json!({"success": true, "content": []}));
        let images = send(&mut rec, json!({"type": "GET_SAVED_IMAGES", "folderName": "caseA"}));
        assert_eq!(images, json!({"success": true, "images": []}));
        let other = send(&mut rec, json!({"type": "GET_SAVED_CONTENT", "folderName": "caseB"}));
        assert_eq!(other["content"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_listing_missing_folder_fails() {
        let (mut rec, _) = recorder();

        let content = send(&mut rec, json!({"type": "GET_SAVED_CONTENT", "folderName": "ghost"}));
        assert_eq!(content, json!({"success": false, "error": "Folder \"ghost\" does not exist"}));

        let images = send(&mut rec, json!({"type": "GET_SAVED_IMAGES", "folderName": "ghost"}));
        assert_eq!(images, json!({"success": false, "error": "Folder \"ghost\" does not exist"}));
    }

    #[test]
    fn test_rejected_delete_reports_failure() {
        let content = MemoryStore::new();
        let text = ContentItem::new("caseA", "https://a.com", "A", "text".to_string(), clock());
        block_on(content.put_content(&text)).unwrap();
        let mut rec: TestRecorder = block_on(Recorder::load(
            RecorderConfig::default(),
            Rc::new(MemoryStore::new()),
            content,
            FixedPage(None),
            clock,
        ))
        .unwrap();
        block_on(rec.create_folder("caseA")).unwrap();
        rec.content.fail_writes(true);

        let reply = send(&mut rec, json!({"type": "DELETE_SAVED_CONTENT", "contentId": text.id}));
        assert_eq!(reply, json!({"success": false, "error": "Storage error: write rejected"}));
        let reply = send(&mut rec, json!({"type": "DELETE_SAVED_IMAGE", "imageId": "any"}));
        assert_eq!(reply["success"], false);

        rec.content.fail_writes(false);
        let listed = send(&mut rec, json!({"type": "GET_SAVED_CONTENT", "folderName": "caseA"}));
        assert_eq!(listed["content"][0]["id"], text.id.as_str());
    }

    #[test]
    fn test_failed_persist_rolls_back() {
        let (mut rec, settings) = recorder();
        block_on(rec.create_folder("caseA")).unwrap();
        settings.fail_writes(true);

        let reply = send(&mut rec, json!({"type": "START_RECORDING", "folderName": "caseA"}));

        assert_eq!(reply["success"], false);
        assert!(!rec.state().is_recording());
        assert_eq!(settings.setting("isRecording"), Some(json!(false)));

        settings.fail_writes(false);
        block_on(rec.start_recording("caseA")).unwrap();
        settings.fail_writes(true);
        assert!(block_on(rec.on_tab_updated(&TabUpdate::completed(1, "https://a.com"))).is_err());
        assert!(rec.state().folder("caseA").unwrap().is_empty());
    }

    #[test]
    fn test_load_rehydrates_and_repairs() {
        let mut stored = Map::new();
        stored.insert("folders".to_string(), json!({"caseA": ["https://a.com"]}));
        stored.insert("isRecording".to_string(), json!(true));
        stored.insert("currentFolder".to_string(), json!("caseB"));
        let settings = Rc::new(MemoryStore::with_settings(stored));

        let mut rec = recorder_with(settings.clone(), None);

        assert_eq!(rec.state().current_folder(), Some("caseB"));
        assert_eq!(rec.state().folder("caseA").unwrap(), ["https://a.com"]);
        assert_eq!(
            settings.setting("folders"),
            Some(json!({"caseA": ["https://a.com"], "caseB": []}))
        );
        navigate(&mut rec, "https://b.com");
        assert_eq!(rec.state().folder("caseB").unwrap(), ["https://b.com"]);
    }

    #[test]
    fn test_load_tolerates_corrupt_values() {
        let mut stored = Map::new();
        stored.insert("folders".to_string(), json!("not a map"));
        stored.insert("isRecording".to_string(), json!(false));
        let rec = recorder_with(Rc::new(MemoryStore::with_settings(stored)), None);

        assert!(rec.state().snapshot().folders.is_empty());
    }

    #[test]
    fn test_save_page_text_and_list() {
        let (mut rec, _) = recorder();
        block_on(rec.create_folder("caseA")).unwrap();

        let saved = send(&mut rec, json!({"type": "SAVE_PAGE_TEXT", "folderName": "caseA"}));
        assert_eq!(saved["success"], true);
        assert_eq!(saved["content"]["text"], "Lead paragraph.");
        assert_eq!(saved["content"]["title"], "Story");
        assert_eq!(saved["content"]["savedAt"], clock());

        let listed = send(&mut rec, json!({"type": "GET_SAVED_CONTENT", "folderName": "caseA"}));
        assert_eq!(listed["content"].as_array().unwrap().len(), 1);

        let id = saved["content"]["id"].as_str().unwrap();
        send(&mut rec, json!({"type": "DELETE_SAVED_CONTENT", "contentId": id}));
        let listed = send(&mut rec, json!({"type": "GET_SAVED_CONTENT", "folderName": "caseA"}));
        assert_eq!(listed, json!({"success": true, "content": []}));
    }

    #[test]
    fn test_save_page_text_without_page_fails() {
        let mut rec = recorder_with(Rc::new(MemoryStore::new()), None);
        block_on(rec.create_folder("caseA")).unwrap();

        let reply = send(&mut rec, json!({"type": "SAVE_PAGE_TEXT", "folderName": "caseA"}));

        assert_eq!(reply, json!({"success": false, "error": "No active page to capture"}));
    }

    #[test]
    fn test_save_page_text_requires_folder() {
        let (mut rec, _) = recorder();
        let reply = send(&mut rec, json!({"type": "SAVE_PAGE_TEXT", "folderName": "nope"}));
        assert_eq!(reply["success"], false);
    }

    #[test]
    fn test_save_and_delete_image() {
        let (mut rec, _) = recorder();
        block_on(rec.create_folder("caseA")).unwrap();

        let saved = send(&mut rec, json!({
            "type": "SAVE_IMAGE",
            "folderName": "caseA",
            "imageData": format!("data:image/png;base64,{}", STANDARD.encode([1u8, 2, 3, 4])),
            "fileName": "evidence.png",
            "fileType": "image/png"
        }));
        assert_eq!(saved["success"], true);
        assert_eq!(saved["image"]["size"], 4);
        assert_eq!(saved["image"]["uploadedAt"], clock());

        let id = saved["image"]["id"].as_str().unwrap().to_string();
        let listed = send(&mut rec, json!({"type": "GET_SAVED_IMAGES", "folderName": "caseA"}));
        assert_eq!(listed["images"][0]["fileName"], "evidence.png");

        send(&mut rec, json!({"type": "DELETE_SAVED_IMAGE", "imageId": id}));
        let listed = send(&mut rec, json!({"type": "GET_SAVED_IMAGES", "folderName": "caseA"}));
        assert_eq!(listed["images"], json!([]));
    }

    #[test]
    fn test_save_image_rejects_non_image() {
        let (mut rec, _) = recorder();
        block_on(rec.create_folder("caseA")).unwrap();

        let reply = send(&mut rec, json!({
            "type": "SAVE_IMAGE",
            "folderName": "caseA",
            "imageData": "data:text/plain;base64,aGk=",
            "fileName": "notes.txt",
            "fileType": "text/plain"
        }));

        assert_eq!(reply["success"], false);
    }

    #[test]
    fn test_save_cropped_image() {
        let (mut rec, _) = recorder();
        block_on(rec.create_folder("caseA")).unwrap();

        let saved = send(&mut rec, json!({
            "type": "SAVE_CROPPED_IMAGE",
            "folderName": "caseA",
            "imageData": png_data_url(80, 60),
            "area": {"left": 5, "top": 5, "width": 40, "height": 20}
        }));

        assert_eq!(saved["success"], true);
        assert_eq!(saved["image"]["fileName"], "capture-2024-05-01T12-00-00.000Z.png");
        let data = DataUrl::parse(saved["image"]["imageData"].as_str().unwrap()).unwrap();
        let img = image::load_from_memory(&data.bytes).unwrap();
        assert_eq!((img.width(), img.height()), (40, 20));
    }

    #[test]
    fn test_small_crop_not_saved() {
        let (mut rec, _) = recorder();
        block_on(rec.create_folder("caseA")).unwrap();

        let reply = send(&mut rec, json!({
            "type": "SAVE_CROPPED_IMAGE",
            "folderName": "caseA",
            "imageData": png_data_url(80, 60),
            "area": {"left": 5, "top": 5, "width": 10, "height": 40}
        }));

        assert_eq!(reply["success"], false);
        let listed = send(&mut rec, json!({"type": "GET_SAVED_IMAGES", "folderName": "caseA"}));
        assert_eq!(listed["images"], json!([]));
    }

    #[test]
    fn test_save_precropped_capture_as_is() {
        let (mut rec, _) = recorder();
        block_on(rec.create_folder("caseA")).unwrap();
        let cropped = png_data_url(40, 20);

        let saved = send(&mut rec, json!({
            "type": "SAVE_CROPPED_IMAGE",
            "folderName": "caseA",
            "originalTab": 7,
            "croppedDataUrl": cropped,
            "area": {"left": 100, "top": 100, "width": 40, "height": 20}
        }));

        assert_eq!(saved["success"], true);
        assert_eq!(saved["image"]["imageData"], cropped.as_str());
        assert_eq!(saved["image"]["fileType"], "image/png");
        assert_eq!(saved["image"]["fileName"], "capture-2024-05-01T12-00-00.000Z.png");
    }

    #[test]
    fn test_precropped_capture_checks_area_and_data() {
        let (mut rec, _) = recorder();
        block_on(rec.create_folder("caseA")).unwrap();

        let small = send(&mut rec, json!({
            "type": "SAVE_CROPPED_IMAGE",
            "folderName": "caseA",
            "croppedDataUrl": png_data_url(8, 40),
            "area": {"left": 0, "top": 0, "width": 8, "height": 40}
        }));
        assert_eq!(small["success"], false);

        let not_image = send(&mut rec, json!({
            "type": "SAVE_CROPPED_IMAGE",
            "folderName": "caseA",
            "croppedDataUrl": "data:text/plain;base64,aGk=",
            "area": {"left": 0, "top": 0, "width": 40, "height": 40}
        }));
        assert_eq!(not_image["success"], false);

        let no_image = send(&mut rec, json!({
            "type": "SAVE_CROPPED_IMAGE",
            "folderName": "caseA",
            "area": {"left": 0, "top": 0, "width": 40, "height": 40}
        }));
        assert_eq!(no_image["success"], false);

        let listed = send(&mut rec, json!({"type": "GET_SAVED_IMAGES", "folderName": "caseA"}));
        assert_eq!(listed["images"], json!([]));
    }
}
