//! Local document inspection
//!
//! pdf.js does the actual rendering; this only reads the page tree so the
//! viewer can refuse oversized documents early and reserve page space at the
//! right aspect ratio before the first render lands.

use crate::error::ViewerError;
use crate::types::PageSize;
use lopdf::{Dictionary, Document, Object};

/// US Letter, used when a page has no resolvable MediaBox
const FALLBACK_PAGE: PageSize = PageSize {
    width: 612.0,
    height: 792.0,
};

/// Page tree summary of a PDF
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentInfo {
    pub page_count: u32,
    /// Displayed size of each page in points (rotation applied), in page order
    pub page_sizes: Vec<PageSize>,
}

impl DocumentInfo {
    /// Parse the page tree of a PDF held in memory
    pub fn inspect(bytes: &[u8]) -> Result<Self, ViewerError> {
        let doc =
            Document::load_mem(bytes).map_err(|e| ViewerError::DocumentLoad(e.to_string()))?;

        let pages = doc.get_pages();
        let mut page_sizes = Vec::with_capacity(pages.len());

        for page_id in pages.values() {
            let size = doc
                .get_object(*page_id)
                .ok()
                .and_then(|obj| obj.as_dict().ok())
                .map(|dict| displayed_size(&doc, dict))
                .unwrap_or(FALLBACK_PAGE);
            page_sizes.push(size);
        }

        Ok(Self {
            page_count: pages.len() as u32,
            page_sizes,
        })
    }

    /// Size of a page (1-indexed)
    pub fn page_size(&self, page_number: u32) -> Option<PageSize> {
        let index = page_number.checked_sub(1)? as usize;
        self.page_sizes.get(index).copied()
    }
}

fn displayed_size(doc: &Document, page: &Dictionary) -> PageSize {
    let size = inherited(doc, page, b"MediaBox")
        .and_then(|obj| parse_rect(doc, obj))
        .unwrap_or(FALLBACK_PAGE);

    let rotation = inherited(doc, page, b"Rotate")
        .and_then(|obj| number(doc, obj))
        .map(|r| (r as i64).rem_euclid(360))
        .unwrap_or(0);

    if rotation == 90 || rotation == 270 {
        PageSize::new(size.height, size.width)
    } else {
        size
    }
}

/// Look up a page attribute, walking up the Parent chain for inherited values
fn inherited<'a>(doc: &'a Document, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut current = page;
    // Page trees are shallow; the bound guards against Parent cycles
    for _ in 0..32 {
        if let Ok(value) = current.get(key) {
            return Some(value);
        }
        let parent_id = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_object(parent_id).ok()?.as_dict().ok()?;
    }
    None
}

/// Parse a PDF rectangle array into a width/height pair
fn parse_rect(doc: &Document, obj: &Object) -> Option<PageSize> {
    let arr = match obj {
        Object::Array(a) => a,
        Object::Reference(id) => doc.get_object(*id).ok()?.as_array().ok()?,
        _ => return None,
    };

    if arr.len() != 4 {
        return None;
    }

    let mut values = [0.0f64; 4];
    for (i, obj) in arr.iter().enumerate() {
        values[i] = number(doc, obj)?;
    }

    let width = (values[2] - values[0]).abs();
    let height = (values[3] - values[1]).abs();
    if width == 0.0 || height == 0.0 {
        return None;
    }

    Some(PageSize::new(width, height))
}

fn number(doc: &Document, obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        Object::Reference(id) => number(doc, doc.get_object(*id).ok()?),
        _ => None,
    }
}
