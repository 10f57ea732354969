//! Viewer configuration
//!
//! Passed explicitly by the host page (as a plain JS object in the browser).
//! Every field has a default, so `{}` is a valid configuration.

use crate::error::ViewerError;
use serde::{Deserialize, Serialize};

/// pdf.js worker used when the host does not supply one
pub const DEFAULT_WORKER_SRC: &str =
    "https://cdn.jsdelivr.net/npm/pdfjs-dist@3.11.174/build/pdf.worker.min.js";

/// Upload flow cap on document length
pub const DEFAULT_MAX_PAGES: u32 = 30;

/// What to do with citations that fall outside their page or the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationPolicy {
    /// Clip rectangles to the page; drop citations on missing pages
    #[default]
    Clamp,
    /// Drop any citation not fully inside an existing page
    Drop,
    /// Draw everything as given, logging a warning per offending citation
    Render,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    pub scale_step: f64,
    pub initial_scale: f64,
    /// Documents longer than this are refused
    pub max_pages: u32,
    pub citation_policy: CitationPolicy,
    /// URL of the pdf.js worker script
    pub worker_src: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.5,
            max_scale: 3.0,
            scale_step: 0.25,
            initial_scale: 1.0,
            max_pages: DEFAULT_MAX_PAGES,
            citation_policy: CitationPolicy::default(),
            worker_src: DEFAULT_WORKER_SRC.to_string(),
        }
    }
}

impl ViewerConfig {
    /// Parse a JSON configuration and validate it
    pub fn from_json(json: &str) -> Result<Self, ViewerError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ViewerError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_citation_policy(mut self, policy: CitationPolicy) -> Self {
        self.citation_policy = policy;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Check scale bounds and limits for consistency
    pub fn validate(&self) -> Result<(), ViewerError> {
        let scales = [
            self.min_scale,
            self.max_scale,
            self.scale_step,
            self.initial_scale,
        ];
        if scales.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(ViewerError::InvalidConfig(
                "scale values must be positive and finite".to_string(),
            ));
        }

        if self.min_scale > self.max_scale {
            return Err(ViewerError::InvalidConfig(format!(
                "minScale {} exceeds maxScale {}",
                self.min_scale, self.max_scale
            )));
        }

        if self.initial_scale < self.min_scale || self.initial_scale > self.max_scale {
            return Err(ViewerError::InvalidConfig(format!(
                "initialScale {} outside [{}, {}]",
                self.initial_scale, self.min_scale, self.max_scale
            )));
        }

        if self.max_pages == 0 {
            return Err(ViewerError::InvalidConfig(
                "maxPages must be at least 1".to_string(),
            ));
        }

        if self.worker_src.trim().is_empty() {
            return Err(ViewerError::InvalidConfig(
                "workerSrc must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
