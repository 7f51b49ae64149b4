/// Message surface between the popup/capture views and the background service
use serde::{Deserialize, Serialize};

use crate::content::{ContentItem, ImageItem};
use crate::crop::CropArea;
use crate::error::Error;
use crate::folders::SessionSnapshot;

/// A command sent through `chrome.runtime.sendMessage`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum Request {
    GetState,
    CreateFolder {
        folder_name: String,
    },
    StartRecording {
        folder_name: String,
    },
    StopRecording,
    ClearFolder {
        folder_name: String,
    },
    SavePageText {
        folder_name: String,
    },
    GetSavedContent {
        folder_name: String,
    },
    SaveImage {
        folder_name: String,
        image_data: String,
        file_name: String,
        file_type: String,
    },
    /// Either an image the capture page already cropped (`croppedDataUrl`)
    /// or a full screenshot (`imageData`) to be cropped to `area` here
    SaveCroppedImage {
        folder_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cropped_data_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image_data: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        original_tab: Option<i64>,
        area: CropArea,
    },
    GetSavedImages {
        folder_name: String,
    },
    DeleteSavedContent {
        content_id: String,
    },
    DeleteSavedImage {
        image_id: String,
    },
}

impl Request {
    /// Name used in logs, matching the wire `type`
    pub fn kind(&self) -> &'static str {
        match self {
            Request::GetState => "GET_STATE",
            Request::CreateFolder { .. } => "CREATE_FOLDER",
            Request::StartRecording { .. } => "START_RECORDING",
            Request::StopRecording => "STOP_RECORDING",
            Request::ClearFolder { .. } => "CLEAR_FOLDER",
            Request::SavePageText { .. } => "SAVE_PAGE_TEXT",
            Request::GetSavedContent { .. } => "GET_SAVED_CONTENT",
            Request::SaveImage { .. } => "SAVE_IMAGE",
            Request::SaveCroppedImage { .. } => "SAVE_CROPPED_IMAGE",
            Request::GetSavedImages { .. } => "GET_SAVED_IMAGES",
            Request::DeleteSavedContent { .. } => "DELETE_SAVED_CONTENT",
            Request::DeleteSavedImage { .. } => "DELETE_SAVED_IMAGE",
        }
    }
}

/// Reply to a `Request`. Every variant except `State` carries `success`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    State(SessionSnapshot),
    Done {
        success: bool,
    },
    SavedContent {
        success: bool,
        content: ContentItem,
    },
    ContentList {
        success: bool,
        content: Vec<ContentItem>,
    },
    SavedImage {
        success: bool,
        image: ImageItem,
    },
    ImageList {
        success: bool,
        images: Vec<ImageItem>,
    },
    Failed {
        success: bool,
        error: String,
    },
}

impl Response {
    pub fn done() -> Response {
        Response::Done { success: true }
    }

    pub fn saved_content(content: ContentItem) -> Response {
        Response::SavedContent { success: true, content }
    }

    pub fn content_list(content: Vec<ContentItem>) -> Response {
        Response::ContentList { success: true, content }
    }

    pub fn saved_image(image: ImageItem) -> Response {
        Response::SavedImage { success: true, image }
    }

    pub fn image_list(images: Vec<ImageItem>) -> Response {
        Response::ImageList { success: true, images }
    }

    pub fn is_success(&self) -> bool {
        match self {
            Response::State(_) => true,
            Response::Done { success }
            | Response::SavedContent { success, .. }
            | Response::ContentList { success, .. }
            | Response::SavedImage { success, .. }
            | Response::ImageList { success, .. }
            | Response::Failed { success, .. } => *success,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Response::Failed { error, .. } => Some(error.as_str()),
            _ => None,
        }
    }
}

impl From<Error> for Response {
    fn from(e: Error) -> Self {
        Response::Failed {
            success: false,
            error: e.to_string(),
        }
    }
}

impl From<crate::error::Result<Response>> for Response {
    fn from(result: crate::error::Result<Response>) -> Self {
        result.unwrap_or_else(Response::from)
    }
}
