#![cfg(target_arch = "wasm32")]
/// Browser-only checks, run with `wasm-pack test --headless --chrome`

use lp_investigator::error::js_message;
use lp_investigator::{extract_page_text, is_selection_accepted};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn extracts_main_text() {
    let html = "<nav>menu</nav><header>top</header><script>x()</script><main>Hello   World</main>";
    assert_eq!(extract_page_text(html).unwrap(), "Hello World");
}

#[wasm_bindgen_test]
fn empty_page_is_rejected() {
    assert!(extract_page_text("<script>x()</script>").is_err());
}

#[wasm_bindgen_test]
fn selection_must_exceed_minimum() {
    assert!(!is_selection_accepted(0.0, 0.0, 10.0, 200.0, 10));
    assert!(is_selection_accepted(30.0, 30.0, 0.0, 0.0, 10));
}

#[wasm_bindgen_test]
fn thrown_error_message_is_kept() {
    let thrown: JsValue = js_sys::Error::new("Cannot access a chrome:// URL").into();
    assert_eq!(js_message(&thrown), "Cannot access a chrome:// URL");
    assert_eq!(js_message(&JsValue::from_str("plain reason")), "plain reason");
}
