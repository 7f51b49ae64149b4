/// Error type shared by the recorder, the stores and the capture paths
use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Folder name must not be empty")]
    EmptyFolderName,

    #[error("Folder \"{0}\" does not exist")]
    FolderNotFound(String),

    #[error("No active page to capture")]
    NoActivePage,

    #[error("Failed to extract page text: {0}")]
    Extraction(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Image file too large ({size} bytes, max {max})")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Selection {width}x{height} is too small (must exceed {min}x{min})")]
    SelectionTooSmall { width: u32, height: u32, min: u32 },

    #[error("Unrecognized message: {0}")]
    InvalidMessage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid base64 data: {0}")]
    Base64(#[from] base64::DecodeError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::Extraction(msg.into())
    }

    pub fn invalid_image(msg: impl Into<String>) -> Self {
        Self::InvalidImage(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Turn a rejected JS promise into a storage error
    pub fn from_js(context: &str, value: JsValue) -> Self {
        Self::Storage(format!("{}: {}", context, js_message(&value)))
    }
}

/// Text of a thrown JS value: the string itself, or an `Error`'s `message`
pub fn js_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            js_sys::Reflect::get(value, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| format!("{:?}", value))
}

impl From<serde_wasm_bindgen::Error> for Error {
    fn from(e: serde_wasm_bindgen::Error) -> Self {
        Error::Storage(format!("Failed to convert value: {}", e))
    }
}

impl From<Error> for JsValue {
    fn from(e: Error) -> Self {
        JsValue::from_str(&e.to_string())
    }
}
