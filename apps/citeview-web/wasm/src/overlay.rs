//! Overlay painting for citation boxes
//!
//! Turns a [`PageOverlay`] computed by the core into absolutely positioned
//! divs stacked over a page canvas. The overlay container ignores pointer
//! events so the page stays scrollable; only the boxes themselves are
//! clickable.

use citeview_core::{to_normalized, BoundingBox, OverlayRegion, PageOverlay};
use js_sys::Function;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, MouseEvent};

/// Click callback slot shared between the viewer and every painted box
pub type ClickHandler = Rc<RefCell<Option<Function>>>;

/// Listener attached to one painted box; must outlive the element's listener registration
pub type ClickListener = Closure<dyn FnMut(MouseEvent)>;

/// CSS class carried by every painted box, ahead of the citation's own color class
pub const BOX_CLASS: &str = "citeview-box";

/// Paints overlay divs for PDF pages
pub struct OverlayPainter {
    document: Document,
}

impl OverlayPainter {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// Create the (empty) overlay layer for a page
    ///
    /// # Errors
    /// Returns JsValue error if unable to create or style the element
    pub fn create_overlay(&self, page_num: u32) -> Result<HtmlElement, JsValue> {
        let overlay: HtmlElement = self.document.create_element("div")?.dyn_into()?;
        overlay.set_class_name("citeview-overlay");
        overlay.set_id(&format!("overlay-page-{}", page_num));

        let style = overlay.style();
        style.set_property("position", "absolute")?;
        style.set_property("top", "0")?;
        style.set_property("left", "0")?;
        style.set_property("width", "100%")?;
        style.set_property("height", "100%")?;
        style.set_property("pointer-events", "none")?;

        Ok(overlay)
    }

    /// Replace the contents of `overlay` with the regions of `page`.
    ///
    /// The returned listeners must be kept alive for as long as the boxes are
    /// in the DOM, and dropped only after [`OverlayPainter::clear`].
    pub fn paint(
        &self,
        overlay: &Element,
        page: &PageOverlay,
        on_click: &ClickHandler,
    ) -> Result<Vec<ClickListener>, JsValue> {
        Self::clear(overlay);

        let mut listeners = Vec::with_capacity(page.len());
        for region in &page.regions {
            let element = self.region_element(region)?;

            let handler = Rc::downgrade(on_click);
            let citation = region.citation.clone();
            let rect = region.rect;
            let dims = page.dimensions;

            let listener = ClickListener::new(move |event: MouseEvent| {
                event.stop_propagation();

                let (x, y) = to_normalized(
                    rect.left + f64::from(event.offset_x()),
                    rect.top + f64::from(event.offset_y()),
                    &dims,
                );
                debug!(
                    page_number = citation.page_number,
                    x,
                    y,
                    id = citation.id.as_deref().unwrap_or(""),
                    "citation clicked"
                );

                notify(&handler, &citation);
            });

            element.add_event_listener_with_callback("click", listener.as_ref().unchecked_ref())?;
            overlay.append_child(&element)?;
            listeners.push(listener);
        }

        debug!(
            page_number = page.page_number,
            boxes = page.len(),
            "overlay painted"
        );
        Ok(listeners)
    }

    /// Remove every box from an overlay layer
    pub fn clear(overlay: &Element) {
        overlay.set_inner_html("");
    }

    fn region_element(&self, region: &OverlayRegion) -> Result<HtmlElement, JsValue> {
        let element: HtmlElement = self.document.create_element("div")?.dyn_into()?;

        let class_name = match region.class_name() {
            "" => BOX_CLASS.to_string(),
            color => format!("{} {}", BOX_CLASS, color),
        };
        element.set_class_name(&class_name);
        element.set_attribute("data-citation-key", &region.key)?;
        if let Some(label) = &region.citation.label {
            element.set_title(label);
        }

        let style = element.style();
        style.set_property("position", "absolute")?;
        style.set_property("left", &format!("{}px", region.rect.left))?;
        style.set_property("top", &format!("{}px", region.rect.top))?;
        style.set_property("width", &format!("{}px", region.rect.width))?;
        style.set_property("height", &format!("{}px", region.rect.height))?;
        style.set_property("box-sizing", "border-box")?;
        style.set_property("border-width", "2px")?;
        style.set_property("border-style", "solid")?;
        style.set_property("cursor", "pointer")?;
        style.set_property("pointer-events", "auto")?;

        Ok(element)
    }
}

/// Call the current click handler, if any, with the clicked citation
fn notify(handler: &Weak<RefCell<Option<Function>>>, citation: &BoundingBox) {
    let Some(slot) = handler.upgrade() else {
        return;
    };
    // Clone out so the slot is not borrowed while JS runs (it may call setOnBoxClick)
    let Some(function) = slot.borrow().clone() else {
        return;
    };

    match serde_wasm_bindgen::to_value(citation) {
        Ok(value) => {
            if let Err(e) = function.call1(&JsValue::NULL, &value) {
                warn!(error = ?e, "box click handler threw");
            }
        }
        Err(e) => warn!(error = %e, "failed to serialize clicked citation"),
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use citeview_core::{build_page_overlay, PageDimensions, PageSize, PageStatus};
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn document() -> Document {
        web_sys::window().unwrap().document().unwrap()
    }

    fn measured_page(citations: &[BoundingBox]) -> PageOverlay {
        let status = PageStatus::Measured(PageDimensions::new(
            PageSize::new(612.0, 792.0),
            PageSize::new(800.0, 1000.0),
        ));
        build_page_overlay(1, citations, &status).unwrap()
    }

    #[wasm_bindgen_test]
    fn test_overlay_layer_ignores_pointer() {
        let painter = OverlayPainter::new(document());
        let overlay = painter.create_overlay(3).unwrap();
        assert_eq!(overlay.id(), "overlay-page-3");
        assert_eq!(
            overlay.style().get_property_value("pointer-events").unwrap(),
            "none"
        );
    }

    #[wasm_bindgen_test]
    fn test_paints_positioned_boxes() {
        let painter = OverlayPainter::new(document());
        let overlay = painter.create_overlay(1).unwrap();
        let page = measured_page(&[BoundingBox::new(1, 0.1, 0.2, 0.3, 0.05)
            .with_id("high-0")
            .with_color("border-red-500")]);
        let handler: ClickHandler = Rc::new(RefCell::new(None));

        let listeners = painter.paint(&overlay, &page, &handler).unwrap();
        assert_eq!(listeners.len(), 1);
        assert_eq!(overlay.child_element_count(), 1);

        let element: HtmlElement = overlay.first_element_child().unwrap().dyn_into().unwrap();
        assert_eq!(element.class_name(), "citeview-box border-red-500");
        assert_eq!(
            element.get_attribute("data-citation-key").as_deref(),
            Some("high-0")
        );
        let style = element.style();
        assert_eq!(style.get_property_value("left").unwrap(), "80px");
        assert_eq!(style.get_property_value("top").unwrap(), "200px");
        assert_eq!(style.get_property_value("width").unwrap(), "240px");
        assert_eq!(style.get_property_value("height").unwrap(), "50px");
    }

    #[wasm_bindgen_test]
    fn test_repaint_replaces_boxes() {
        let painter = OverlayPainter::new(document());
        let overlay = painter.create_overlay(1).unwrap();
        let handler: ClickHandler = Rc::new(RefCell::new(None));

        let two = measured_page(&[
            BoundingBox::new(1, 0.1, 0.1, 0.1, 0.1),
            BoundingBox::new(1, 0.5, 0.5, 0.1, 0.1),
        ]);
        let _first = painter.paint(&overlay, &two, &handler).unwrap();
        assert_eq!(overlay.child_element_count(), 2);

        let one = measured_page(&[BoundingBox::new(1, 0.1, 0.1, 0.1, 0.1)]);
        let _second = painter.paint(&overlay, &one, &handler).unwrap();
        assert_eq!(overlay.child_element_count(), 1);

        OverlayPainter::clear(&overlay);
        assert_eq!(overlay.child_element_count(), 0);
    }

    #[wasm_bindgen_test]
    fn test_click_calls_handler_once() {
        let painter = OverlayPainter::new(document());
        let overlay = painter.create_overlay(1).unwrap();
        let page = measured_page(&[BoundingBox::new(1, 0.1, 0.2, 0.3, 0.05).with_id("a")]);

        let calls = js_sys::Array::new();
        let recorder = Closure::<dyn FnMut(JsValue)>::new({
            let calls = calls.clone();
            move |value: JsValue| {
                calls.push(&value);
            }
        });
        let handler: ClickHandler = Rc::new(RefCell::new(Some(
            recorder.as_ref().unchecked_ref::<Function>().clone(),
        )));

        let _listeners = painter.paint(&overlay, &page, &handler).unwrap();
        let element: HtmlElement = overlay.first_element_child().unwrap().dyn_into().unwrap();
        element.click();

        assert_eq!(calls.length(), 1);
        let id = js_sys::Reflect::get(&calls.get(0), &JsValue::from_str("id")).unwrap();
        assert_eq!(id.as_string().as_deref(), Some("a"));

        // Clicking the empty layer reaches nothing
        overlay.click();
        assert_eq!(calls.length(), 1);
    }
}
