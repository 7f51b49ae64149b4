/// LP Investigator - Chrome Extension for recording investigation sessions
/// Built with Rust + WASM

pub mod background;
pub mod chrome;
pub mod config;
pub mod content;
pub mod crop;
pub mod error;
pub mod extract;
pub mod folders;
pub mod messages;
pub mod navigation;
pub mod queue;
pub mod service;
pub mod store;

use wasm_bindgen::prelude::*;

pub use error::{Error, Result};

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Text extraction for views that already hold a page's HTML
#[wasm_bindgen(js_name = extractPageText)]
pub fn extract_page_text(html: &str) -> std::result::Result<String, JsValue> {
    Ok(extract::extract_page(html)?.text)
}

// Crop overlay check: only drags strictly larger than `min` in both directions are saved
#[wasm_bindgen(js_name = isSelectionAccepted)]
pub fn is_selection_accepted(start_x: f64, start_y: f64, end_x: f64, end_y: f64, min: u32) -> bool {
    crop::Selection::new(crop::Point::new(start_x, start_y), crop::Point::new(end_x, end_y)).is_accepted(min)
}
