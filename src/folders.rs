/// Folder and recording state for an investigation session
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Folder name -> visited URLs in visit order
pub type FolderMap = BTreeMap<String, Vec<String>>;

/// Snapshot of the session, as returned by GET_STATE and as persisted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub is_recording: bool,
    pub folders: FolderMap,
    pub current_folder: Option<String>,
}

/// Outcome of offering a URL to the active folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visit {
    Appended { folder: String, position: usize },
    Duplicate,
    NotRecording,
}

/// In-memory session state. `current_folder` is always a key of `folders`
/// while recording, and `None` otherwise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FolderState {
    folders: FolderMap,
    is_recording: bool,
    current_folder: Option<String>,
}

fn check_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(Error::EmptyFolderName)
    } else {
        Ok(trimmed)
    }
}

impl FolderState {
    pub fn new() -> Self {
        FolderState::default()
    }

    /// Rebuild state from a persisted snapshot, repairing a recording flag
    /// that points nowhere.
    pub fn from_snapshot(snapshot: SessionSnapshot) -> Self {
        let SessionSnapshot {
            mut folders,
            is_recording,
            current_folder,
        } = snapshot;

        let current_folder = match (is_recording, current_folder) {
            (true, Some(name)) if !name.trim().is_empty() => {
                if !folders.contains_key(&name) {
                    log::warn!("Recording folder '{}' missing from storage, recreating it", name);
                    folders.insert(name.clone(), Vec::new());
                }
                Some(name)
            }
            (true, _) => {
                log::warn!("Recording flag set without a folder, resetting");
                None
            }
            (false, _) => None,
        };

        FolderState {
            is_recording: current_folder.is_some(),
            folders,
            current_folder,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            is_recording: self.is_recording,
            folders: self.folders.clone(),
            current_folder: self.current_folder.clone(),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    pub fn current_folder(&self) -> Option<&str> {
        self.current_folder.as_deref()
    }

    pub fn folder(&self, name: &str) -> Option<&[String]> {
        self.folders.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.folders.contains_key(name)
    }

    /// Create an empty folder. Returns `false` when the folder already existed,
    /// in which case nothing changes.
    pub fn create_folder(&mut self, name: &str) -> Result<bool> {
        let name = check_name(name)?;
        if self.folders.contains_key(name) {
            return Ok(false);
        }
        self.folders.insert(name.to_string(), Vec::new());
        Ok(true)
    }

    /// Start recording into `name`, creating it if needed. An existing list is
    /// kept, so a stop/start pair resumes where it left off.
    pub fn start_recording(&mut self, name: &str) -> Result<()> {
        let name = check_name(name)?;
        self.folders.entry(name.to_string()).or_default();
        self.is_recording = true;
        self.current_folder = Some(name.to_string());
        Ok(())
    }

    pub fn stop_recording(&mut self) {
        self.is_recording = false;
        self.current_folder = None;
    }

    /// Delete a folder and its URLs. Clearing the folder being recorded also
    /// stops the recording.
    pub fn clear_folder(&mut self, name: &str) -> Result<Vec<String>> {
        let name = check_name(name)?;
        let removed = self
            .folders
            .remove(name)
            .ok_or_else(|| Error::FolderNotFound(name.to_string()))?;
        if self.current_folder.as_deref() == Some(name) {
            self.stop_recording();
        }
        Ok(removed)
    }

    /// Append `url` to the active folder unless it repeats the last entry
    pub fn record_visit(&mut self, url: &str) -> Visit {
        let Some(folder) = self.current_folder.clone().filter(|_| self.is_recording) else {
            return Visit::NotRecording;
        };
        let urls = self.folders.entry(folder.clone()).or_default();
        if urls.last().map(String::as_str) == Some(url) {
            return Visit::Duplicate;
        }
        urls.push(url.to_string());
        Visit::Appended {
            folder,
            position: urls.len() - 1,
        }
    }
}
