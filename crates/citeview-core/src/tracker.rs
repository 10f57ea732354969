//! Per-page render measurement
//!
//! Each mounted page is either unmeasured or measured at the current render
//! epoch. A new epoch starts whenever the scale changes or a document is
//! mounted, which puts every page back to `Unmeasured` until the renderer
//! reports a fresh render. Reports tagged with an older epoch are dropped, so
//! an overlay can never pair old-scale dimensions with the current scale.

use crate::types::{CanvasMeasurement, PageDimensions, PageSize};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Monotonic counter identifying one layout pass (document mount or scale change)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct RenderEpoch(u64);

impl RenderEpoch {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

/// Measurement state of one page
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PageStatus {
    /// No render has completed at the current epoch
    Unmeasured,
    /// Dimensions of the most recent render at the current epoch
    Measured(PageDimensions),
}

static UNMEASURED: PageStatus = PageStatus::Unmeasured;

impl PageStatus {
    pub fn dimensions(&self) -> Option<&PageDimensions> {
        match self {
            PageStatus::Unmeasured => None,
            PageStatus::Measured(dims) => Some(dims),
        }
    }

    pub fn is_measured(&self) -> bool {
        matches!(self, PageStatus::Measured(_))
    }
}

/// Render-complete report from the PDF renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRendered {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Epoch the render was requested for
    pub epoch: RenderEpoch,
    /// Intrinsic page size in PDF points
    pub original: PageSize,
    /// Canvas measurement, `None` when the canvas could not be located
    pub canvas: Option<CanvasMeasurement>,
}

/// Outcome of feeding a render report to the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerUpdate {
    /// Dimensions stored; `changed` is false when they equal the previous measurement
    Measured { page_number: u32, changed: bool },
    /// Canvas missing; the page stays unmeasured until the next render
    CanvasMissing { page_number: u32 },
    /// Report belongs to an older epoch and was ignored
    Stale { page_number: u32, epoch: RenderEpoch },
    /// Page is not mounted
    UnknownPage { page_number: u32 },
}

impl TrackerUpdate {
    /// Whether the page's overlay must be redrawn
    pub fn needs_redraw(&self) -> bool {
        matches!(self, TrackerUpdate::Measured { changed: true, .. })
    }
}

/// Receives render-complete reports from whichever PDF renderer is in use
pub trait PageRenderListener {
    fn on_page_rendered(&mut self, event: PageRendered) -> TrackerUpdate;
}

/// Dimension table for the mounted pages of one document
#[derive(Debug, Default)]
pub struct PageRenderTracker {
    epoch: RenderEpoch,
    pages: BTreeMap<u32, PageStatus>,
}

impl PageRenderTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> RenderEpoch {
        self.epoch
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn measured_count(&self) -> usize {
        self.pages.values().filter(|s| s.is_measured()).count()
    }

    /// Mount pages `1..=num_pages`, all unmeasured, under a new epoch
    pub fn mount(&mut self, num_pages: u32) -> RenderEpoch {
        self.epoch = self.epoch.next();
        self.pages = (1..=num_pages)
            .map(|page| (page, PageStatus::Unmeasured))
            .collect();
        self.epoch
    }

    /// Forget all measurements (e.g. after a scale change) under a new epoch
    pub fn invalidate(&mut self) -> RenderEpoch {
        self.epoch = self.epoch.next();
        for status in self.pages.values_mut() {
            *status = PageStatus::Unmeasured;
        }
        self.epoch
    }

    /// Tear down everything; late reports for the old document become stale
    pub fn clear(&mut self) {
        self.epoch = self.epoch.next();
        self.pages.clear();
    }

    pub fn status(&self, page_number: u32) -> &PageStatus {
        self.pages.get(&page_number).unwrap_or(&UNMEASURED)
    }

    pub fn dimensions(&self, page_number: u32) -> Option<&PageDimensions> {
        self.status(page_number).dimensions()
    }

    /// Apply a render report
    pub fn record(&mut self, event: PageRendered) -> TrackerUpdate {
        let page_number = event.page_number;

        if event.epoch != self.epoch {
            debug!(
                page_number,
                event_epoch = event.epoch.value(),
                current_epoch = self.epoch.value(),
                "ignoring render report from an earlier epoch"
            );
            return TrackerUpdate::Stale {
                page_number,
                epoch: event.epoch,
            };
        }

        let Some(status) = self.pages.get_mut(&page_number) else {
            warn!(page_number, "render report for a page that is not mounted");
            return TrackerUpdate::UnknownPage { page_number };
        };

        let Some(canvas) = event.canvas else {
            warn!(page_number, "rendered page has no canvas, overlay deferred");
            return TrackerUpdate::CanvasMissing { page_number };
        };

        let dims = PageDimensions::new(event.original, canvas.css_size());
        let changed = status.dimensions() != Some(&dims);
        *status = PageStatus::Measured(dims);

        debug!(
            page_number,
            rendered_width = dims.rendered_width,
            rendered_height = dims.rendered_height,
            effective_scale = dims.effective_scale(),
            changed,
            "page measured"
        );

        TrackerUpdate::Measured {
            page_number,
            changed,
        }
    }
}

impl PageRenderListener for PageRenderTracker {
    fn on_page_rendered(&mut self, event: PageRendered) -> TrackerUpdate {
        self.record(event)
    }
}
