//! Citation overlays for rendered PDF pages
//!
//! This crate holds the platform-independent half of the citation viewer:
//! decoding PDF payloads, tracking per-page render measurements, mapping
//! normalized citation rectangles onto rendered pages and classifying
//! risk-assessment citations into colored boxes.
//!
//! The browser half (`citeview-wasm`) renders pages with pdf.js, reports each
//! completed render back through [`PageRenderListener`] and paints the
//! [`PageOverlay`] that [`ViewerShell::overlay`] returns.

pub mod classifier;
pub mod config;
pub mod coords;
pub mod document;
pub mod error;
pub mod overlay;
pub mod payload;
pub mod policy;
pub mod shell;
pub mod summary;
pub mod tracker;
pub mod types;
pub mod zoom;

pub use classifier::{classify, classify_json, classify_summary, SeverityBucket};
pub use config::{CitationPolicy, ViewerConfig, DEFAULT_MAX_PAGES, DEFAULT_WORKER_SRC};
pub use coords::{map_box, map_for_page, to_normalized};
pub use document::DocumentInfo;
pub use error::ViewerError;
pub use overlay::{build_indexed_overlay, build_page_overlay, OverlayRegion, PageOverlay};
pub use payload::{select_document, DocumentDigest, PdfPayload};
pub use policy::{apply_policy, apply_policy_indexed, DropReason, DroppedCitation};
pub use shell::{DocumentState, LoadRequest, RenderPlan, ViewerShell};
pub use summary::LegalDocumentSummary;
pub use tracker::{
    PageRenderListener, PageRenderTracker, PageRendered, PageStatus, RenderEpoch, TrackerUpdate,
};
pub use types::{BoundingBox, CanvasMeasurement, PageDimensions, PageSize, PixelRect};
pub use zoom::{ScaleChange, ZoomController};
