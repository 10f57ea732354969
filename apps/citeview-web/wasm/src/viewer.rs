//! Citation viewer mounted into a host element
//!
//! Owns the DOM for one viewer (toolbar plus a column of page containers),
//! drives pdf.js through [`PdfHandle`] and feeds every completed render back
//! into the core [`ViewerShell`]. Overlays are painted only from what the shell
//! returns, so a page that has not reported a render at the current scale
//! shows no boxes.

use crate::overlay::{ClickHandler, ClickListener, OverlayPainter};
use crate::pdf_bridge::{init_pdf_js, is_render_cancelled, page_rendered, PdfHandle};
use citeview_core::{
    BoundingBox, DocumentState, PageRenderListener, PageSize, RenderPlan, ViewerConfig,
    ViewerError, ViewerShell,
};
use js_sys::Function;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use tracing::{debug, error, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, HtmlCanvasElement, HtmlElement, MouseEvent};

fn to_js(err: ViewerError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// DOM for one page: canvas with the overlay layer stacked on top
struct PageSlot {
    canvas: HtmlCanvasElement,
    overlay: HtmlElement,
    /// Listeners for the boxes currently painted on `overlay`
    listeners: Vec<ClickListener>,
}

struct Toolbar {
    zoom_out: HtmlElement,
    zoom_label: HtmlElement,
    zoom_in: HtmlElement,
    count: HtmlElement,
    status: HtmlElement,
}

struct ViewerInner {
    shell: ViewerShell,
    document: Document,
    painter: OverlayPainter,
    host: Element,
    toolbar: Toolbar,
    pages_root: HtmlElement,
    slots: BTreeMap<u32, PageSlot>,
    pdf: Option<PdfHandle>,
    worker_ready: bool,
    on_box_click: ClickHandler,
    toolbar_listeners: Vec<Closure<dyn FnMut(MouseEvent)>>,
}

impl ViewerInner {
    fn element(&self, tag: &str, class_name: &str) -> Result<HtmlElement, JsValue> {
        let element: HtmlElement = self.document.create_element(tag)?.dyn_into()?;
        element.set_class_name(class_name);
        Ok(element)
    }

    fn refresh_toolbar(&self) {
        let toolbar = &self.toolbar;
        toolbar
            .zoom_label
            .set_text_content(Some(&format!("{}%", self.shell.zoom_percent())));
        set_disabled(&toolbar.zoom_in, !self.shell.can_zoom_in());
        set_disabled(&toolbar.zoom_out, !self.shell.can_zoom_out());

        let count = self.shell.annotation_count();
        let noun = if count == 1 { "annotation" } else { "annotations" };
        toolbar
            .count
            .set_text_content(Some(&format!("{} {}", count, noun)));

        let status = match self.shell.state() {
            DocumentState::Empty => "No document",
            DocumentState::Loading { .. } => "Loading PDF...",
            DocumentState::Ready { .. } => "",
            DocumentState::Failed { reason } => reason.as_str(),
        };
        toolbar.status.set_text_content(Some(status));
        if let Err(e) = self
            .host
            .set_attribute("data-status", self.shell.state().as_str())
        {
            debug!(error = ?e, "failed to tag host status");
        }
    }

    /// Drop every page and the pdf.js document
    fn teardown(&mut self) {
        if let Some(pdf) = self.pdf.take() {
            pdf.destroy();
        }
        // Remove the boxes before their listeners are dropped
        self.pages_root.set_inner_html("");
        self.slots.clear();
    }

    /// Create one container per planned page, sized from local inspection when known
    fn mount_pages(
        &mut self,
        plan: &RenderPlan,
        page_sizes: Option<&[PageSize]>,
    ) -> Result<(), JsValue> {
        for &page_number in &plan.pages {
            let container = self.element("div", "citeview-page")?;
            container.set_attribute("data-page-number", &page_number.to_string())?;
            let style = container.style();
            style.set_property("position", "relative")?;
            style.set_property("width", "fit-content")?;
            style.set_property("margin", "0 auto 16px")?;
            style.set_property("box-shadow", "0 1px 4px rgba(0, 0, 0, 0.2)")?;

            let canvas: HtmlCanvasElement = self.document.create_element("canvas")?.dyn_into()?;
            canvas.style().set_property("display", "block")?;

            let placeholder = page_sizes
                .and_then(|sizes| sizes.get(page_number as usize - 1))
                .map(|size| size.scaled(plan.scale));
            if let Some(size) = placeholder {
                canvas
                    .style()
                    .set_property("width", &format!("{}px", size.width))?;
                canvas
                    .style()
                    .set_property("height", &format!("{}px", size.height))?;
            }

            let overlay = self.painter.create_overlay(page_number)?;
            container.append_child(&canvas)?;
            container.append_child(&overlay)?;
            self.pages_root.append_child(&container)?;

            self.slots.insert(
                page_number,
                PageSlot {
                    canvas,
                    overlay,
                    listeners: Vec::new(),
                },
            );
        }
        Ok(())
    }

    /// Bring one page's boxes in line with the shell
    fn repaint(&mut self, page_number: u32) -> Result<(), JsValue> {
        let Some(slot) = self.slots.get_mut(&page_number) else {
            return Ok(());
        };

        match self.shell.overlay(page_number) {
            Some(page) => {
                slot.listeners = self.painter.paint(&slot.overlay, &page, &self.on_box_click)?;
            }
            None => {
                OverlayPainter::clear(&slot.overlay);
                slot.listeners.clear();
            }
        }
        Ok(())
    }

    fn repaint_all(&mut self) {
        let pages: Vec<u32> = self.slots.keys().copied().collect();
        for page_number in pages {
            if let Err(e) = self.repaint(page_number) {
                warn!(page_number, error = ?e, "failed to paint overlay");
            }
        }
    }
}

fn set_disabled(element: &HtmlElement, disabled: bool) {
    let result = if disabled {
        element.set_attribute("disabled", "")
    } else {
        element.remove_attribute("disabled")
    };
    if let Err(e) = result {
        debug!(error = ?e, "failed to toggle button");
    }
}

/// Render every planned page in order, stopping once a newer plan exists
async fn render_pass(inner: &Rc<RefCell<ViewerInner>>, plan: RenderPlan) {
    debug!(
        epoch = plan.epoch.value(),
        scale = plan.scale,
        pages = plan.pages.len(),
        "render pass started"
    );

    for &page_number in &plan.pages {
        let target = {
            let state = inner.borrow();
            if state.shell.epoch() != plan.epoch {
                debug!(epoch = plan.epoch.value(), "render pass superseded");
                return;
            }
            match (&state.pdf, state.slots.get(&page_number)) {
                (Some(pdf), Some(slot)) => Some((pdf.clone(), slot.canvas.clone())),
                _ => None,
            }
        };
        let Some((pdf, canvas)) = target else {
            continue;
        };

        match pdf.render_page(page_number, &canvas, plan.scale).await {
            Ok(original) => {
                let event = page_rendered(page_number, plan.epoch, original, &canvas);
                let mut state = inner.borrow_mut();
                let update = state.shell.on_page_rendered(event);
                if update.needs_redraw() {
                    if let Err(e) = state.repaint(page_number) {
                        warn!(page_number, error = ?e, "failed to paint overlay");
                    }
                }
            }
            Err(e) => {
                // pdf-bridge cancels a canvas's previous render when a new one starts
                let current = inner.borrow().shell.epoch() == plan.epoch;
                if current && !is_render_cancelled(&e) {
                    warn!(page_number, error = ?e, "page render failed");
                } else {
                    debug!(page_number, "page render cancelled");
                }
            }
        }
    }
}

/// Apply a zoom action and re-render if the document is showing
fn apply_zoom(
    inner: &Rc<RefCell<ViewerInner>>,
    action: impl FnOnce(&mut ViewerShell) -> Option<RenderPlan>,
) {
    let plan = {
        let mut state = inner.borrow_mut();
        let plan = action(&mut state.shell);
        state.refresh_toolbar();
        let Some(plan) = plan else {
            return;
        };
        // Boxes come back page by page as the new renders report in
        state.repaint_all();
        plan
    };

    let inner = Rc::clone(inner);
    spawn_local(async move {
        render_pass(&inner, plan).await;
    });
}

/// Interactive PDF viewer with clickable citation boxes
#[wasm_bindgen]
pub struct CitationViewer {
    inner: Rc<RefCell<ViewerInner>>,
}

#[wasm_bindgen]
impl CitationViewer {
    /// Mount a viewer into `host`. `config` is an optional plain object; any
    /// omitted field takes its default.
    #[wasm_bindgen(constructor)]
    pub fn new(host: Element, config: JsValue) -> Result<CitationViewer, JsValue> {
        let config: ViewerConfig = if config.is_undefined() || config.is_null() {
            ViewerConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Invalid viewer configuration: {}", e)))?
        };
        let shell = ViewerShell::new(config).map_err(to_js)?;

        let document = host
            .owner_document()
            .ok_or_else(|| JsValue::from_str("Host element has no document"))?;

        let create = |tag: &str, class_name: &str| -> Result<HtmlElement, JsValue> {
            let element: HtmlElement = document.create_element(tag)?.dyn_into()?;
            element.set_class_name(class_name);
            Ok(element)
        };

        let toolbar_root = create("div", "citeview-toolbar")?;
        let style = toolbar_root.style();
        style.set_property("position", "sticky")?;
        style.set_property("top", "0")?;
        style.set_property("z-index", "10")?;
        style.set_property("display", "flex")?;
        style.set_property("align-items", "center")?;
        style.set_property("gap", "8px")?;

        let toolbar = Toolbar {
            zoom_out: create("button", "citeview-zoom-out")?,
            zoom_label: create("span", "citeview-zoom-label")?,
            zoom_in: create("button", "citeview-zoom-in")?,
            count: create("span", "citeview-count")?,
            status: create("span", "citeview-status")?,
        };
        toolbar.zoom_out.set_text_content(Some("\u{2212}"));
        toolbar.zoom_out.set_title("Zoom out");
        toolbar.zoom_in.set_text_content(Some("+"));
        toolbar.zoom_in.set_title("Zoom in");
        for part in [
            &toolbar.zoom_out,
            &toolbar.zoom_label,
            &toolbar.zoom_in,
            &toolbar.count,
            &toolbar.status,
        ] {
            toolbar_root.append_child(part)?;
        }

        let pages_root = create("div", "citeview-pages")?;
        let style = pages_root.style();
        style.set_property("display", "flex")?;
        style.set_property("flex-direction", "column")?;
        style.set_property("padding", "16px 0")?;

        host.set_inner_html("");
        host.append_child(&toolbar_root)?;
        host.append_child(&pages_root)?;

        let inner = Rc::new(RefCell::new(ViewerInner {
            shell,
            painter: OverlayPainter::new(document.clone()),
            document,
            host,
            toolbar,
            pages_root,
            slots: BTreeMap::new(),
            pdf: None,
            worker_ready: false,
            on_box_click: Rc::new(RefCell::new(None)),
            toolbar_listeners: Vec::new(),
        }));

        let zoom_in = toolbar_action(&inner, ViewerShell::zoom_in);
        let zoom_out = toolbar_action(&inner, ViewerShell::zoom_out);
        {
            let mut state = inner.borrow_mut();
            state
                .toolbar
                .zoom_in
                .add_event_listener_with_callback("click", zoom_in.as_ref().unchecked_ref())?;
            state
                .toolbar
                .zoom_out
                .add_event_listener_with_callback("click", zoom_out.as_ref().unchecked_ref())?;
            state.toolbar_listeners = vec![zoom_in, zoom_out];
            state.refresh_toolbar();
        }

        info!("citation viewer mounted");
        Ok(CitationViewer { inner })
    }

    /// Show a document (data URL or bare base64) with its citation boxes.
    ///
    /// Resolves once the first render pass finishes. Rejects when the payload
    /// or the document is unusable; the viewer then shows the failure. A
    /// pdf.js worker that cannot start leaves the viewer in the failed state
    /// without rejecting.
    pub async fn load(&self, pdf_base64: String, bounding_boxes: JsValue) -> Result<(), JsValue> {
        let citations: Vec<BoundingBox> =
            if bounding_boxes.is_undefined() || bounding_boxes.is_null() {
                Vec::new()
            } else {
                serde_wasm_bindgen::from_value(bounding_boxes)
                    .map_err(|e| JsValue::from_str(&format!("Invalid bounding boxes: {}", e)))?
            };

        let (request, worker_src, worker_ready) = {
            let mut state = self.inner.borrow_mut();
            state.shell.set_citations(citations);

            let loaded = state.shell.load_document(&pdf_base64);
            let request = match loaded {
                Ok(Some(request)) => request,
                Ok(None) => {
                    // Same document: only the boxes may have changed
                    state.repaint_all();
                    state.refresh_toolbar();
                    return Ok(());
                }
                Err(e) => {
                    state.teardown();
                    state.refresh_toolbar();
                    return Err(to_js(e));
                }
            };

            state.teardown();
            state.refresh_toolbar();
            let worker_src = state.shell.config().worker_src.clone();
            (request, worker_src, state.worker_ready)
        };

        if !worker_ready {
            if let Err(e) = init_pdf_js(&worker_src).await {
                error!(error = ?e, "pdf.js failed to start");
                let mut state = self.inner.borrow_mut();
                state.shell.renderer_unavailable(&js_error_message(&e));
                state.refresh_toolbar();
                return Ok(());
            }
            self.inner.borrow_mut().worker_ready = true;
        }

        let handle = match PdfHandle::open(&request.bytes).await {
            Ok(handle) => handle,
            Err(e) => {
                let reason = js_error_message(&e);
                let mut state = self.inner.borrow_mut();
                state.shell.document_failed(&request.digest, &reason);
                state.refresh_toolbar();
                return Err(e);
            }
        };

        let plan = {
            let mut state = self.inner.borrow_mut();
            let plan = match state.shell.document_loaded(&request.digest, handle.num_pages()) {
                Ok(Some(plan)) => plan,
                Ok(None) => {
                    // A newer load started while this one was opening
                    handle.destroy();
                    return Ok(());
                }
                Err(e) => {
                    handle.destroy();
                    state.refresh_toolbar();
                    return Err(to_js(e));
                }
            };

            state.pdf = Some(handle);
            state.mount_pages(&plan, request.page_sizes.as_deref())?;
            state.refresh_toolbar();
            plan
        };

        info!(
            pages = plan.pages.len(),
            digest = request.digest.short(),
            "document mounted"
        );
        render_pass(&self.inner, plan).await;
        Ok(())
    }

    /// Set (or clear) the callback invoked with the clicked `BoundingBox`
    #[wasm_bindgen(js_name = setOnBoxClick)]
    pub fn set_on_box_click(&self, callback: Option<Function>) {
        let handler = Rc::clone(&self.inner.borrow().on_box_click);
        *handler.borrow_mut() = callback;
    }

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&self) {
        apply_zoom(&self.inner, ViewerShell::zoom_in);
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&self) {
        apply_zoom(&self.inner, ViewerShell::zoom_out);
    }

    /// Jump to a scale; clamped to the configured range
    #[wasm_bindgen(js_name = setScale)]
    pub fn set_scale(&self, scale: f64) {
        apply_zoom(&self.inner, |shell| shell.set_scale(scale));
    }

    #[wasm_bindgen(getter)]
    pub fn scale(&self) -> f64 {
        self.inner.borrow().shell.scale()
    }

    #[wasm_bindgen(getter, js_name = annotationCount)]
    pub fn annotation_count(&self) -> usize {
        self.inner.borrow().shell.annotation_count()
    }

    #[wasm_bindgen(getter, js_name = numPages)]
    pub fn num_pages(&self) -> u32 {
        self.inner.borrow().shell.num_pages().unwrap_or(0)
    }

    /// `empty`, `loading`, `ready` or `failed`
    #[wasm_bindgen(getter)]
    pub fn status(&self) -> String {
        self.inner.borrow().shell.state().as_str().to_string()
    }

    /// Citation drawn at a point of a page (CSS pixels), or `undefined`
    #[wasm_bindgen(js_name = citationAt)]
    pub fn citation_at(&self, page_number: u32, x: f64, y: f64) -> Result<JsValue, JsValue> {
        match self.inner.borrow().shell.citation_at(page_number, x, y) {
            Some(citation) => serde_wasm_bindgen::to_value(&citation)
                .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e))),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Citations removed by the out-of-range policy, with reasons
    #[wasm_bindgen(js_name = droppedCitations)]
    pub fn dropped_citations(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.borrow().shell.dropped_citations())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Release the document and empty the host element
    pub fn destroy(&self) {
        let mut state = self.inner.borrow_mut();
        state.teardown();
        state.toolbar_listeners.clear();
        state.host.set_inner_html("");
        info!("citation viewer destroyed");
    }
}

/// Toolbar button handler holding only a weak reference to the viewer
fn toolbar_action(
    inner: &Rc<RefCell<ViewerInner>>,
    action: fn(&mut ViewerShell) -> Option<RenderPlan>,
) -> Closure<dyn FnMut(MouseEvent)> {
    let weak: Weak<RefCell<ViewerInner>> = Rc::downgrade(inner);
    Closure::new(move |_event: MouseEvent| {
        if let Some(inner) = weak.upgrade() {
            apply_zoom(&inner, action);
        }
    })
}

fn js_error_message(value: &JsValue) -> String {
    if let Some(message) = value.as_string() {
        return message;
    }
    js_sys::Reflect::get(value, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| "unknown pdf.js error".to_string())
}
