//! WASM bindings for the citation viewer
//!
//! Rendering goes through pdf.js (see `www/js/pdf-bridge.js`); everything
//! else (payload decoding, dimension tracking, coordinate mapping, overlay
//! layout) lives in `citeview-core` and is only painted here.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { CitationViewer, classifySummary, selectDocument } from './pkg/citeview_wasm.js';
//!
//! await init();
//!
//! const viewer = new CitationViewer(document.getElementById('viewer'), { citationPolicy: 'clamp' });
//! viewer.setOnBoxClick((box) => showCitation(box));
//!
//! const file = selectDocument(response.files, 'lease.pdf');
//! await viewer.load(file.data, classifySummary(JSON.stringify(response.summary)));
//! viewer.zoomIn();
//! ```

pub mod logging;
pub mod overlay;
pub mod pdf_bridge;
pub mod viewer;

use citeview_core::select_document;
use serde::Serialize;
use std::collections::BTreeMap;
use wasm_bindgen::prelude::*;

// Re-export main types for JavaScript
pub use overlay::OverlayPainter;
pub use pdf_bridge::PdfHandle;
pub use viewer::CitationViewer;

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    logging::init(logging::default_level());
}

/// Get the library version
#[wasm_bindgen(js_name = getVersion)]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Turn a legal summary JSON string into colored citation boxes
#[wasm_bindgen(js_name = classifySummary)]
pub fn classify_summary(summary_json: &str) -> Result<JsValue, JsValue> {
    let boxes =
        citeview_core::classify_json(summary_json).map_err(|e| JsValue::from_str(&e.to_string()))?;

    serde_wasm_bindgen::to_value(&boxes)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

#[derive(Serialize)]
struct SelectedDocument<'a> {
    filename: &'a str,
    data: &'a str,
}

/// Pick the document to display from a `{ filename: base64 }` object.
///
/// Returns `{ filename, data }` for `preferred` when present, otherwise for the
/// first filename in sorted order, or `null` for an empty object.
#[wasm_bindgen(js_name = selectDocument)]
pub fn select_document_wasm(files: JsValue, preferred: Option<String>) -> Result<JsValue, JsValue> {
    let files: BTreeMap<String, String> = serde_wasm_bindgen::from_value(files)
        .map_err(|e| JsValue::from_str(&format!("Invalid files map: {}", e)))?;

    match select_document(&files, preferred.as_deref()) {
        Some((filename, data)) => serde_wasm_bindgen::to_value(&SelectedDocument { filename, data })
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e))),
        None => Ok(JsValue::NULL),
    }
}
