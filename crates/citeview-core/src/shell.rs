//! Document viewer state
//!
//! Holds everything one viewer instance knows: the loaded document, the
//! citation list, the zoom level and the per-page measurements. The browser
//! layer drives it with user actions and renderer callbacks and paints what it
//! returns; nothing here touches the DOM.

use crate::config::ViewerConfig;
use crate::document::DocumentInfo;
use crate::error::ViewerError;
use crate::overlay::{build_indexed_overlay, PageOverlay};
use crate::payload::{DocumentDigest, PdfPayload};
use crate::policy::{apply_policy_indexed, DroppedCitation};
use crate::tracker::{
    PageRenderListener, PageRenderTracker, PageRendered, PageStatus, RenderEpoch, TrackerUpdate,
};
use crate::types::{BoundingBox, PageSize};
use crate::zoom::{ScaleChange, ZoomController};
use std::ops::RangeInclusive;
use tracing::{debug, error, info, warn};

/// Lifecycle of the displayed document
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentState {
    Empty,
    Loading {
        digest: DocumentDigest,
    },
    Ready {
        digest: DocumentDigest,
        num_pages: u32,
    },
    Failed {
        reason: String,
    },
}

impl DocumentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentState::Empty => "empty",
            DocumentState::Loading { .. } => "loading",
            DocumentState::Ready { .. } => "ready",
            DocumentState::Failed { .. } => "failed",
        }
    }

    fn digest(&self) -> Option<&DocumentDigest> {
        match self {
            DocumentState::Loading { digest } | DocumentState::Ready { digest, .. } => Some(digest),
            _ => None,
        }
    }
}

/// Bytes to hand to the PDF renderer for a new document
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub digest: DocumentDigest,
    pub bytes: Vec<u8>,
    /// Page sizes from local inspection, when the page tree could be read
    pub page_sizes: Option<Vec<PageSize>>,
}

/// Pages to (re-)render at a scale, tagged with the epoch their reports must carry
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub epoch: RenderEpoch,
    pub scale: f64,
    pub pages: Vec<u32>,
}

pub struct ViewerShell {
    config: ViewerConfig,
    zoom: ZoomController,
    tracker: PageRenderTracker,
    state: DocumentState,
    /// Citations as supplied by the caller
    source_citations: Vec<BoundingBox>,
    /// Citations after the out-of-range policy
    citations: Vec<BoundingBox>,
    /// Position of each kept citation in `source_citations`
    citation_indices: Vec<usize>,
    dropped: Vec<DroppedCitation>,
}

impl ViewerShell {
    pub fn new(config: ViewerConfig) -> Result<Self, ViewerError> {
        config.validate()?;
        Ok(Self {
            zoom: ZoomController::new(&config),
            config,
            tracker: PageRenderTracker::new(),
            state: DocumentState::Empty,
            source_citations: Vec::new(),
            citations: Vec::new(),
            citation_indices: Vec::new(),
            dropped: Vec::new(),
        })
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn state(&self) -> &DocumentState {
        &self.state
    }

    pub fn scale(&self) -> f64 {
        self.zoom.scale()
    }

    pub fn zoom_percent(&self) -> u32 {
        self.zoom.percent()
    }

    pub fn can_zoom_in(&self) -> bool {
        self.zoom.can_zoom_in()
    }

    pub fn can_zoom_out(&self) -> bool {
        self.zoom.can_zoom_out()
    }

    pub fn epoch(&self) -> RenderEpoch {
        self.tracker.epoch()
    }

    pub fn num_pages(&self) -> Option<u32> {
        match self.state {
            DocumentState::Ready { num_pages, .. } => Some(num_pages),
            _ => None,
        }
    }

    /// Mounted page numbers in display order; empty until the document is ready
    pub fn page_numbers(&self) -> RangeInclusive<u32> {
        1..=self.num_pages().unwrap_or(0)
    }

    pub fn citations(&self) -> &[BoundingBox] {
        &self.citations
    }

    pub fn annotation_count(&self) -> usize {
        self.citations.len()
    }

    pub fn dropped_citations(&self) -> &[DroppedCitation] {
        &self.dropped
    }

    pub fn page_status(&self, page_number: u32) -> &PageStatus {
        self.tracker.status(page_number)
    }

    /// Replace the citation list
    pub fn set_citations(&mut self, citations: Vec<BoundingBox>) {
        self.source_citations = citations;
        self.reapply_policy();
    }

    fn reapply_policy(&mut self) {
        let (kept, dropped) = apply_policy_indexed(
            self.config.citation_policy,
            &self.source_citations,
            self.num_pages(),
        );
        debug!(
            kept = kept.len(),
            dropped = dropped.len(),
            "citation list updated"
        );
        let (indices, citations): (Vec<usize>, Vec<BoundingBox>) = kept.into_iter().unzip();
        self.citation_indices = indices;
        self.citations = citations;
        self.dropped = dropped;
    }

    /// Start loading a new document from a data URL or bare base64.
    ///
    /// Returns `Ok(None)` when the payload is the document already shown or
    /// being loaded. Otherwise all per-page state is torn down and the bytes
    /// are returned for the renderer.
    pub fn load_document(&mut self, payload: &str) -> Result<Option<LoadRequest>, ViewerError> {
        let payload = match PdfPayload::from_base64(payload) {
            Ok(payload) => payload,
            Err(e) => return Err(self.fail(e)),
        };

        if self.state.digest() == Some(payload.digest()) {
            debug!(digest = payload.digest().short(), "document unchanged");
            return Ok(None);
        }

        let digest = payload.digest().clone();
        info!(digest = digest.short(), bytes = payload.bytes().len(), "loading document");

        self.tracker.clear();
        self.state = DocumentState::Loading {
            digest: digest.clone(),
        };
        self.reapply_policy();

        // The renderer has the final word on page count; local inspection only
        // refuses oversized documents early and seeds placeholder sizes.
        let page_sizes = match DocumentInfo::inspect(payload.bytes()) {
            Ok(info) if info.page_count > self.config.max_pages => {
                return Err(self.fail(ViewerError::PageLimitExceeded {
                    pages: info.page_count,
                    max: self.config.max_pages,
                }));
            }
            Ok(info) => Some(info.page_sizes),
            Err(e) => {
                debug!(error = %e, "local inspection failed, deferring to renderer");
                None
            }
        };

        Ok(Some(LoadRequest {
            digest,
            bytes: payload.into_bytes(),
            page_sizes,
        }))
    }

    /// The renderer opened the document.
    ///
    /// Returns `Ok(None)` if `digest` is no longer the document being loaded.
    pub fn document_loaded(
        &mut self,
        digest: &DocumentDigest,
        num_pages: u32,
    ) -> Result<Option<RenderPlan>, ViewerError> {
        if !self.is_loading(digest) {
            debug!(digest = digest.short(), "ignoring superseded document load");
            return Ok(None);
        }

        if num_pages == 0 {
            return Err(self.fail(ViewerError::EmptyDocument));
        }

        if num_pages > self.config.max_pages {
            return Err(self.fail(ViewerError::PageLimitExceeded {
                pages: num_pages,
                max: self.config.max_pages,
            }));
        }

        let epoch = self.tracker.mount(num_pages);
        self.state = DocumentState::Ready {
            digest: digest.clone(),
            num_pages,
        };
        self.reapply_policy();

        info!(num_pages, "document ready");
        Ok(Some(self.plan(epoch)))
    }

    /// The renderer could not open the document. No retry is attempted.
    pub fn document_failed(&mut self, digest: &DocumentDigest, reason: &str) {
        if !self.is_loading(digest) {
            return;
        }
        self.fail(ViewerError::DocumentLoad(reason.to_string()));
    }

    /// The renderer itself could not start (e.g. the worker script failed to load)
    pub fn renderer_unavailable(&mut self, reason: &str) {
        self.fail(ViewerError::RendererUnavailable(reason.to_string()));
    }

    fn is_loading(&self, digest: &DocumentDigest) -> bool {
        matches!(&self.state, DocumentState::Loading { digest: current } if current == digest)
    }

    /// Enter the failed state and hand the error back for propagation
    fn fail(&mut self, err: ViewerError) -> ViewerError {
        error!(error = %err, "document unavailable");
        self.tracker.clear();
        self.state = DocumentState::Failed {
            reason: err.to_string(),
        };
        self.reapply_policy();
        err
    }

    pub fn zoom_in(&mut self) -> Option<RenderPlan> {
        let change = self.zoom.zoom_in();
        self.rescale(change)
    }

    pub fn zoom_out(&mut self) -> Option<RenderPlan> {
        let change = self.zoom.zoom_out();
        self.rescale(change)
    }

    pub fn set_scale(&mut self, scale: f64) -> Option<RenderPlan> {
        let change = self.zoom.set_scale(scale);
        self.rescale(change)
    }

    /// Every measurement is discarded before any page is re-rendered, so no
    /// overlay is computed from the previous scale's dimensions.
    fn rescale(&mut self, change: Option<ScaleChange>) -> Option<RenderPlan> {
        let change = change?;
        debug!(from = change.from, to = change.to, "scale changed");

        self.num_pages()?;
        let epoch = self.tracker.invalidate();
        Some(self.plan(epoch))
    }

    fn plan(&self, epoch: RenderEpoch) -> RenderPlan {
        RenderPlan {
            epoch,
            scale: self.zoom.scale(),
            pages: self.page_numbers().collect(),
        }
    }

    /// Overlay for one page, or `None` while the page is unmeasured or not mounted
    pub fn overlay(&self, page_number: u32) -> Option<PageOverlay> {
        if !self.page_numbers().contains(&page_number) {
            return None;
        }
        build_indexed_overlay(
            page_number,
            self.citation_indices.iter().copied().zip(&self.citations),
            self.tracker.status(page_number),
        )
    }

    /// Citation drawn at a point of a page, in page pixel coordinates
    pub fn citation_at(&self, page_number: u32, x: f64, y: f64) -> Option<BoundingBox> {
        self.overlay(page_number)?
            .hit_test(x, y)
            .map(|region| region.citation.clone())
    }
}

impl PageRenderListener for ViewerShell {
    fn on_page_rendered(&mut self, event: PageRendered) -> TrackerUpdate {
        let update = self.tracker.record(event);
        if let TrackerUpdate::UnknownPage { page_number } = update {
            warn!(page_number, state = self.state.as_str(), "render report outside the document");
        }
        update
    }
}
