//! pdf.js integration for rendering PDFs in the browser via WASM

use citeview_core::{CanvasMeasurement, PageRendered, PageSize, RenderEpoch};
use js_sys::{Reflect, Uint8Array};
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

// External JavaScript functions from pdf-bridge.js
#[wasm_bindgen(module = "/www/js/pdf-bridge.js")]
extern "C" {
    #[wasm_bindgen(catch, js_name = initPdfJs)]
    async fn init_pdf_js_internal(worker_src: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = loadDocument)]
    async fn load_document_internal(data: Uint8Array) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_name = renderPage)]
    async fn render_page_internal(
        doc: &JsValue,
        page_num: u32,
        canvas: &HtmlCanvasElement,
        scale: f64,
    ) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_name = destroyDocument)]
    fn destroy_document_internal(doc: &JsValue);
}

/// Start the pdf.js worker from `worker_src`. Rejects when the worker
/// script cannot be loaded. Safe to call more than once.
pub async fn init_pdf_js(worker_src: &str) -> Result<(), JsValue> {
    init_pdf_js_internal(worker_src).await.map(|_| ())
}

/// An open pdf.js document
#[derive(Debug, Clone)]
pub struct PdfHandle {
    proxy: JsValue,
    num_pages: u32,
}

impl PdfHandle {
    /// Open a document from bytes
    pub async fn open(bytes: &[u8]) -> Result<Self, JsValue> {
        let data = Uint8Array::new_with_length(bytes.len() as u32);
        data.copy_from(bytes);

        let proxy = load_document_internal(data).await?;
        if proxy.is_undefined() || proxy.is_null() {
            return Err(JsValue::from_str("Failed to load PDF document"));
        }

        let num_pages = number_field(&proxy, "numPages")
            .ok_or_else(|| JsValue::from_str("PDF document has no page count"))?
            as u32;

        Ok(Self { proxy, num_pages })
    }

    pub fn num_pages(&self) -> u32 {
        self.num_pages
    }

    /// Render one page onto `canvas` and return the page's intrinsic size in points
    pub async fn render_page(
        &self,
        page_num: u32,
        canvas: &HtmlCanvasElement,
        scale: f64,
    ) -> Result<PageSize, JsValue> {
        if page_num < 1 || page_num > self.num_pages {
            return Err(JsValue::from_str(&format!(
                "Invalid page number: {} (document has {} pages)",
                page_num, self.num_pages
            )));
        }

        let result = render_page_internal(&self.proxy, page_num, canvas, scale).await?;

        let width = number_field(&result, "originalWidth");
        let height = number_field(&result, "originalHeight");
        match (width, height) {
            (Some(w), Some(h)) => Ok(PageSize::new(w, h)),
            _ => Err(JsValue::from_str("renderPage returned no page size")),
        }
    }

    /// Release the worker-side document
    pub fn destroy(&self) {
        destroy_document_internal(&self.proxy);
    }
}

/// Whether a render rejection came from pdf.js (or the bridge) cancelling a
/// render that a newer one replaced
pub fn is_render_cancelled(error: &JsValue) -> bool {
    Reflect::get(error, &JsValue::from_str("name"))
        .ok()
        .and_then(|name| name.as_string())
        .is_some_and(|name| name == "RenderingCancelledException")
}

fn number_field(value: &JsValue, key: &str) -> Option<f64> {
    Reflect::get(value, &JsValue::from_str(key))
        .ok()
        .and_then(|v| v.as_f64())
}

/// Read the canvas a render just finished on.
///
/// Returns `None` when the canvas has been detached from the document (e.g.
/// the viewer was torn down mid-render) or has no backing pixels.
pub fn measure_canvas(canvas: &HtmlCanvasElement) -> Option<CanvasMeasurement> {
    if !canvas.is_connected() || canvas.width() == 0 || canvas.height() == 0 {
        return None;
    }

    let ratio = web_sys::window()
        .map(|w| w.device_pixel_ratio())
        .unwrap_or(1.0);

    Some(CanvasMeasurement::new(canvas.width(), canvas.height(), ratio))
}

/// Build the render-complete report for one page
pub fn page_rendered(
    page_number: u32,
    epoch: RenderEpoch,
    original: PageSize,
    canvas: &HtmlCanvasElement,
) -> PageRendered {
    PageRendered {
        page_number,
        epoch,
        original,
        canvas: measure_canvas(canvas),
    }
}
