//! Per-page overlay model
//!
//! Builds the positioned, clickable regions for one page from the citation
//! list and that page's measurement state. The DOM layer only paints what
//! this module produces.

use crate::coords::map_box;
use crate::tracker::PageStatus;
use crate::types::{BoundingBox, PageDimensions, PixelRect};
use serde::Serialize;

/// One clickable rectangle drawn over a page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayRegion {
    /// Stable reconciliation key
    pub key: String,
    /// Citation this region was built from
    pub citation: BoundingBox,
    /// Position on the rendered page
    pub rect: PixelRect,
}

impl OverlayRegion {
    /// Style class carried over verbatim from the citation
    pub fn class_name(&self) -> &str {
        self.citation.color.as_deref().unwrap_or("")
    }
}

/// All regions of one measured page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageOverlay {
    pub page_number: u32,
    /// Dimensions the regions were computed from
    pub dimensions: PageDimensions,
    /// Regions in drawing order; later regions sit on top
    pub regions: Vec<OverlayRegion>,
}

impl PageOverlay {
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Topmost region containing the point, in page pixel coordinates
    pub fn hit_test(&self, x: f64, y: f64) -> Option<&OverlayRegion> {
        self.regions.iter().rev().find(|r| r.rect.contains(x, y))
    }
}

/// Build the overlay for `page_number`.
///
/// Returns `None` while the page is unmeasured; no placeholder regions are
/// produced. Citations for other pages are never included.
pub fn build_page_overlay(
    page_number: u32,
    citations: &[BoundingBox],
    status: &PageStatus,
) -> Option<PageOverlay> {
    build_indexed_overlay(page_number, citations.iter().enumerate(), status)
}

/// Build the overlay for `page_number` from citations paired with their
/// index in the originally supplied list. The index feeds the fallback key,
/// so keys do not move when other citations are filtered out.
pub fn build_indexed_overlay<'a>(
    page_number: u32,
    citations: impl IntoIterator<Item = (usize, &'a BoundingBox)>,
    status: &PageStatus,
) -> Option<PageOverlay> {
    let dims = status.dimensions()?;

    let regions = citations
        .into_iter()
        .filter(|(_, bbox)| bbox.page_number == page_number)
        .map(|(index, bbox)| OverlayRegion {
            key: bbox.key(index),
            citation: bbox.clone(),
            rect: map_box(bbox, dims),
        })
        .collect();

    Some(PageOverlay {
        page_number,
        dimensions: *dims,
        regions,
    })
}
