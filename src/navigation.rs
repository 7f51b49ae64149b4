/// Tab navigation events and the filter deciding which ones are recorded
use serde::{Deserialize, Serialize};
use url::Url;

/// The subset of `chrome.tabs.onUpdated` data the recorder needs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabUpdate {
    pub tab_id: i32,
    /// `changeInfo.status`, "loading" or "complete"
    pub status: Option<String>,
    /// `tab.url`, absent when the extension lacks host access
    pub url: Option<String>,
}

impl TabUpdate {
    pub fn new(tab_id: i32, status: Option<&str>, url: Option<&str>) -> TabUpdate {
        TabUpdate {
            tab_id,
            status: status.map(str::to_string),
            url: url.map(str::to_string),
        }
    }

    pub fn completed(tab_id: i32, url: &str) -> TabUpdate {
        TabUpdate::new(tab_id, Some("complete"), Some(url))
    }

    pub fn is_complete(&self) -> bool {
        self.status.as_deref() == Some("complete")
    }

    /// URL to record, if the load finished and the scheme is allowed
    pub fn recordable_url(&self, schemes: &[String]) -> Option<&str> {
        if !self.is_complete() {
            return None;
        }
        self.url
            .as_deref()
            .filter(|url| has_scheme(url, schemes))
    }
}

/// Check that `url` parses and uses one of `schemes`
pub fn has_scheme(url: &str, schemes: &[String]) -> bool {
    match Url::parse(url) {
        Ok(parsed) => schemes.iter().any(|s| s.eq_ignore_ascii_case(parsed.scheme())),
        Err(_) => false,
    }
}
