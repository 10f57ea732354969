//! Coordinate transformation between normalized citation space and rendered page pixels

use crate::tracker::PageStatus;
use crate::types::{BoundingBox, PageDimensions, PixelRect};

/// Convert a normalized citation (top-left origin, page fractions) to CSS pixels
/// on the page's rendered surface.
pub fn map_box(bbox: &BoundingBox, dims: &PageDimensions) -> PixelRect {
    PixelRect {
        left: bbox.x * dims.rendered_width,
        top: bbox.y * dims.rendered_height,
        width: bbox.width * dims.rendered_width,
        height: bbox.height * dims.rendered_height,
    }
}

/// Map a citation against the current state of its page.
///
/// Returns `None` while the page has not been measured at the current scale.
pub fn map_for_page(bbox: &BoundingBox, status: &PageStatus) -> Option<PixelRect> {
    status.dimensions().map(|dims| map_box(bbox, dims))
}

/// Convert a point on the rendered surface back to page fractions
pub fn to_normalized(dom_x: f64, dom_y: f64, dims: &PageDimensions) -> (f64, f64) {
    let rendered = dims.rendered();
    (dom_x / rendered.width, dom_y / rendered.height)
}
