//! Handling of citations that do not fit the loaded document

use crate::config::CitationPolicy;
use crate::types::BoundingBox;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DropReason {
    /// Page number is 0 or beyond the document
    PageOutOfRange { num_pages: u32 },
    /// Coordinates contain NaN or infinity
    NonFinite,
    /// Rectangle is not fully inside the page
    OutsidePage,
    /// Nothing of the rectangle is left after clipping
    Empty,
}

/// A citation removed by the policy, kept for reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedCitation {
    pub citation: BoundingBox,
    pub reason: DropReason,
}

/// Apply `policy` to `citations`.
///
/// `num_pages` is `None` while no document is loaded; page numbers are then
/// not checked. Returns the citations to draw and the ones removed.
pub fn apply_policy(
    policy: CitationPolicy,
    citations: &[BoundingBox],
    num_pages: Option<u32>,
) -> (Vec<BoundingBox>, Vec<DroppedCitation>) {
    let (kept, dropped) = apply_policy_indexed(policy, citations, num_pages);
    (kept.into_iter().map(|(_, citation)| citation).collect(), dropped)
}

/// Same as [`apply_policy`], but every kept citation is paired with its
/// index in `citations`.
pub fn apply_policy_indexed(
    policy: CitationPolicy,
    citations: &[BoundingBox],
    num_pages: Option<u32>,
) -> (Vec<(usize, BoundingBox)>, Vec<DroppedCitation>) {
    let mut kept = Vec::with_capacity(citations.len());
    let mut dropped = Vec::new();

    for (index, citation) in citations.iter().enumerate() {
        let on_existing_page = match num_pages {
            Some(n) => (1..=n).contains(&citation.page_number),
            None => true,
        };

        let verdict = match policy {
            CitationPolicy::Render => {
                if !on_existing_page || !citation.is_within_page() {
                    warn!(
                        page_number = citation.page_number,
                        id = citation.id.as_deref().unwrap_or(""),
                        "drawing citation outside its page"
                    );
                }
                Ok(citation.clone())
            }
            _ if !on_existing_page => Err(DropReason::PageOutOfRange {
                num_pages: num_pages.unwrap_or(0),
            }),
            _ if !citation.is_finite() => Err(DropReason::NonFinite),
            CitationPolicy::Drop if !citation.is_within_page() => Err(DropReason::OutsidePage),
            CitationPolicy::Drop => Ok(citation.clone()),
            CitationPolicy::Clamp => citation.clamped().ok_or(DropReason::Empty),
        };

        match verdict {
            Ok(citation) => kept.push((index, citation)),
            Err(reason) => {
                warn!(
                    page_number = citation.page_number,
                    id = citation.id.as_deref().unwrap_or(""),
                    ?reason,
                    "dropping citation"
                );
                dropped.push(DroppedCitation {
                    citation: citation.clone(),
                    reason,
                });
            }
        }
    }

    (kept, dropped)
}
