//! Geometry shared by the mapper, tracker and overlay builder
//!
//! Citation geometry is normalized (page fractions, top-left origin).
//! Rendered geometry is in CSS pixels relative to the page's rendered surface.

use serde::{Deserialize, Serialize};

/// Tolerance used when checking that a citation lies inside its page
const PAGE_EPSILON: f64 = 1e-9;

/// A citation rectangle on a single page, in page-fraction units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Page number (1-indexed)
    pub page_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Style tag assigned by the classifier, e.g. `border-red-500`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl BoundingBox {
    /// Create a bare citation with no identity or styling
    pub fn new(page_number: u32, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            page_number,
            id: None,
            label: None,
            confidence: None,
            color: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Stable reconciliation key: the explicit id, or `box-<page>-<index>`
    /// where `index` is the position in the citation list as supplied.
    pub fn key(&self, index: usize) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("box-{}-{}", self.page_number, index),
        }
    }

    /// All four numbers are finite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    /// The rectangle is non-negative and lies inside the unit square
    pub fn is_within_page(&self) -> bool {
        self.is_finite()
            && self.x >= 0.0
            && self.y >= 0.0
            && self.width >= 0.0
            && self.height >= 0.0
            && self.x + self.width <= 1.0 + PAGE_EPSILON
            && self.y + self.height <= 1.0 + PAGE_EPSILON
    }

    /// Clip the rectangle to the unit square.
    ///
    /// Returns `None` when nothing of the rectangle remains on the page.
    pub fn clamped(&self) -> Option<Self> {
        if !self.is_finite() {
            return None;
        }

        let left = self.x.clamp(0.0, 1.0);
        let top = self.y.clamp(0.0, 1.0);
        let right = (self.x + self.width).clamp(0.0, 1.0);
        let bottom = (self.y + self.height).clamp(0.0, 1.0);

        if right <= left || bottom <= top {
            return None;
        }

        Some(Self {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
            ..self.clone()
        })
    }
}

/// Width/height pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn scaled(&self, scale: f64) -> Self {
        Self::new(self.width * scale, self.height * scale)
    }
}

/// Raw size of a rendered canvas together with the device pixel ratio it was drawn at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasMeasurement {
    /// Backing store width in device pixels
    pub pixel_width: u32,
    /// Backing store height in device pixels
    pub pixel_height: u32,
    pub device_pixel_ratio: f64,
}

impl CanvasMeasurement {
    pub fn new(pixel_width: u32, pixel_height: u32, device_pixel_ratio: f64) -> Self {
        Self {
            pixel_width,
            pixel_height,
            device_pixel_ratio,
        }
    }

    /// Size in CSS pixels. A missing or nonsensical ratio counts as 1.0.
    pub fn css_size(&self) -> PageSize {
        let ratio = if self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0 {
            self.device_pixel_ratio
        } else {
            1.0
        };

        PageSize::new(
            f64::from(self.pixel_width) / ratio,
            f64::from(self.pixel_height) / ratio,
        )
    }
}

/// Intrinsic and rendered size of one page
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDimensions {
    /// Intrinsic page width in PDF points
    pub original_width: f64,
    /// Intrinsic page height in PDF points
    pub original_height: f64,
    /// On-screen width in CSS pixels
    pub rendered_width: f64,
    /// On-screen height in CSS pixels
    pub rendered_height: f64,
}

impl PageDimensions {
    pub fn new(original: PageSize, rendered: PageSize) -> Self {
        Self {
            original_width: original.width,
            original_height: original.height,
            rendered_width: rendered.width,
            rendered_height: rendered.height,
        }
    }

    pub fn rendered(&self) -> PageSize {
        PageSize::new(self.rendered_width, self.rendered_height)
    }

    /// Effective zoom of the rendered surface relative to the intrinsic size
    pub fn effective_scale(&self) -> f64 {
        if self.original_width > 0.0 {
            self.rendered_width / self.original_width
        } else {
            0.0
        }
    }
}

/// Absolute rectangle in CSS pixels, relative to the page's rendered surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Half-open containment: left/top edges are inside, right/bottom edges are not
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }
}
