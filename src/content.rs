/// Saved artifacts: extracted page text and images, each tied to a folder
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// A snapshot of a page's readable text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: String,
    pub folder_name: String,
    pub url: String,
    pub title: String,
    pub text: String,
    pub saved_at: String,
}

impl ContentItem {
    pub fn new(folder_name: &str, url: &str, title: &str, text: String, saved_at: String) -> ContentItem {
        let title = if title.trim().is_empty() { "Untitled" } else { title.trim() };
        ContentItem {
            id: Uuid::new_v4().to_string(),
            folder_name: folder_name.to_string(),
            url: url.to_string(),
            title: title.to_string(),
            text,
            saved_at,
        }
    }
}

/// An uploaded or cropped image, stored as a data URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageItem {
    pub id: String,
    pub folder_name: String,
    pub file_name: String,
    pub file_type: String,
    pub image_data: String,
    pub uploaded_at: String,
    /// Decoded size in bytes
    pub size: usize,
}

impl ImageItem {
    pub fn new(folder_name: &str, data: &DataUrl, file_name: &str, uploaded_at: String) -> ImageItem {
        ImageItem {
            id: Uuid::new_v4().to_string(),
            folder_name: folder_name.to_string(),
            file_name: file_name.to_string(),
            file_type: data.mime_type.clone(),
            image_data: data.to_string(),
            uploaded_at,
            size: data.bytes.len(),
        }
    }
}

/// A decoded `data:<mime>;base64,<payload>` URL
#[derive(Debug, Clone, PartialEq)]
pub struct DataUrl {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    pub fn parse(url: &str) -> Result<DataUrl> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| Error::invalid_image("expected a data: URL"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| Error::invalid_image("data URL has no payload"))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| Error::invalid_image("data URL is not base64 encoded"))?;
        let bytes = STANDARD.decode(payload.trim())?;
        Ok(DataUrl {
            mime_type: mime_type.to_ascii_lowercase(),
            bytes,
        })
    }

    pub fn png(bytes: Vec<u8>) -> DataUrl {
        DataUrl {
            mime_type: "image/png".to_string(),
            bytes,
        }
    }
}

impl std::fmt::Display for DataUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

/// Validate an image upload before it is stored. The declared file type wins
/// over the data URL's own header, as the popup reports what the file picker saw.
pub fn validate_upload(file_type: &str, image_data: &str, max_bytes: usize) -> Result<DataUrl> {
    let file_type = file_type.trim().to_ascii_lowercase();
    if !file_type.starts_with("image/") {
        return Err(Error::invalid_image(format!("'{}' is not an image type", file_type)));
    }
    let mut data = DataUrl::parse(image_data)?;
    if data.bytes.is_empty() {
        return Err(Error::invalid_image("image is empty"));
    }
    if data.bytes.len() > max_bytes {
        return Err(Error::ImageTooLarge {
            size: data.bytes.len(),
            max: max_bytes,
        });
    }
    data.mime_type = file_type;
    Ok(data)
}
