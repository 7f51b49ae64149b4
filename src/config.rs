/// Recorder configuration
///
/// Every field has a default, so `background.js` may pass nothing, a partial
/// object, or a full override. Names follow the JS side (camelCase).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Keys used in `chrome.storage.local` for the session snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageKeys {
    pub folders: String,
    pub is_recording: String,
    pub current_folder: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        StorageKeys {
            folders: "folders".to_string(),
            is_recording: "isRecording".to_string(),
            current_folder: "currentFolder".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecorderConfig {
    pub storage_keys: StorageKeys,
    /// IndexedDB database holding saved page text and images
    pub database_name: String,
    pub database_version: u32,
    pub content_store: String,
    pub image_store: String,
    pub folder_index: String,
    /// Largest accepted image upload, in decoded bytes
    pub max_image_bytes: usize,
    /// Crop selections must be strictly larger than this in both dimensions
    pub min_selection: u32,
    pub recordable_schemes: Vec<String>,
    pub log_level: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        RecorderConfig {
            storage_keys: StorageKeys::default(),
            database_name: "LPInvestigatorDB".to_string(),
            database_version: 2,
            content_store: "pageContent".to_string(),
            image_store: "images".to_string(),
            folder_index: "folderName".to_string(),
            max_image_bytes: 5 * 1024 * 1024,
            min_selection: 10,
            recordable_schemes: vec!["http".to_string(), "https".to_string()],
            log_level: "info".to_string(),
        }
    }
}

impl RecorderConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: RecorderConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let names = [
            ("storageKeys.folders", &self.storage_keys.folders),
            ("storageKeys.isRecording", &self.storage_keys.is_recording),
            ("storageKeys.currentFolder", &self.storage_keys.current_folder),
            ("databaseName", &self.database_name),
            ("contentStore", &self.content_store),
            ("imageStore", &self.image_store),
            ("folderIndex", &self.folder_index),
        ];
        if let Some((field, _)) = names.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(Error::config(format!("{} must not be empty", field)));
        }
        if self.content_store == self.image_store {
            return Err(Error::config("contentStore and imageStore must differ"));
        }
        if self.database_version == 0 {
            return Err(Error::config("databaseVersion must be at least 1"));
        }
        if self.max_image_bytes == 0 {
            return Err(Error::config("maxImageBytes must be positive"));
        }
        if self.recordable_schemes.is_empty() {
            return Err(Error::config("at least one recordable scheme is required"));
        }
        self.log_filter()?;
        Ok(())
    }

    pub fn log_filter(&self) -> Result<log::Level> {
        self.log_level
            .parse::<log::Level>()
            .map_err(|_| Error::config(format!("unknown log level '{}'", self.log_level)))
    }
}
