//! Turns risk-assessment items into colored citation boxes for the viewer

use crate::error::ViewerError;
use crate::summary::{LegalDocumentSummary, RiskAssessment, RiskItem};
use crate::types::BoundingBox;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Risk bucket a citation was classified into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityBucket {
    High,
    Medium,
    Low,
}

impl SeverityBucket {
    pub const ALL: [SeverityBucket; 3] = [Self::High, Self::Medium, Self::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Style class applied to the overlay border
    pub fn color_class(self) -> &'static str {
        match self {
            Self::High => "border-red-500",
            Self::Medium => "border-yellow-500",
            Self::Low => "border-green-500",
        }
    }

    fn items(self, assessment: &RiskAssessment) -> &[RiskItem] {
        match self {
            Self::High => &assessment.high_risk_items,
            Self::Medium => &assessment.medium_risk_items,
            Self::Low => &assessment.low_risk_items,
        }
    }
}

/// Flatten all risk buckets (high, then medium, then low) into citation boxes.
///
/// Each box gets the id `<bucket>-<index>`, the risk title as label and the
/// bucket's color class.
pub fn classify(assessment: &RiskAssessment) -> Vec<BoundingBox> {
    let mut boxes = Vec::with_capacity(assessment.total_items());

    for bucket in SeverityBucket::ALL {
        for (index, item) in bucket.items(assessment).iter().enumerate() {
            let citation = &item.source_citation;
            let rect = citation.bounding_box;
            if citation.page_number == 0 {
                warn!(
                    bucket = bucket.as_str(),
                    index,
                    title = %item.title,
                    "risk citation has no valid page number"
                );
            }

            boxes.push(
                BoundingBox::new(
                    citation.page_number,
                    rect.x,
                    rect.y,
                    rect.width,
                    rect.height,
                )
                .with_id(format!("{}-{}", bucket.as_str(), index))
                .with_label(item.title.clone())
                .with_color(bucket.color_class()),
            );
        }
    }

    debug!(count = boxes.len(), "classified risk citations");
    boxes
}

pub fn classify_summary(summary: &LegalDocumentSummary) -> Vec<BoundingBox> {
    classify(&summary.risk_assessment)
}

/// Parse a summary JSON document and classify its risk citations
pub fn classify_json(json: &str) -> Result<Vec<BoundingBox>, ViewerError> {
    let summary = LegalDocumentSummary::from_json(json)?;
    Ok(classify_summary(&summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CitationPolicy;
    use crate::policy::{apply_policy, DropReason};
    use pretty_assertions::assert_eq;

    fn item(title: &str, page: u32, x: f64) -> serde_json::Value {
        serde_json::json!({
            "title": title,
            "severity": "high",
            "source_citation": {
                "filename": "lease.pdf",
                "bounding_box": {"x": x, "y": 0.2, "width": 0.3, "height": 0.05},
                "paragraph_text": "",
                "page_number": page,
                "paragraph_id": ""
            }
        })
    }

    fn summary_json() -> String {
        serde_json::json!({
            "risk_assessment": {
                "overall_risk_score": 7,
                "risk_summary": "",
                "high_risk_items": [item("Indemnity", 1, 0.1), item("Waiver", 2, 0.2)],
                "medium_risk_items": [item("Late fee", 1, 0.3)],
                "low_risk_items": [item("Notice", 3, 0.4)]
            }
        })
        .to_string()
    }

    #[test]
    fn test_flattens_in_severity_order() {
        let boxes = classify_json(&summary_json()).unwrap();
        let ids: Vec<_> = boxes.iter().map(|b| b.id.clone().unwrap()).collect();
        assert_eq!(ids, vec!["high-0", "high-1", "medium-0", "low-0"]);
    }

    #[test]
    fn test_assigns_bucket_colors() {
        let boxes = classify_json(&summary_json()).unwrap();
        let colors: Vec<_> = boxes.iter().map(|b| b.color.clone().unwrap()).collect();
        assert_eq!(
            colors,
            vec![
                "border-red-500",
                "border-red-500",
                "border-yellow-500",
                "border-green-500"
            ]
        );
    }

    #[test]
    fn test_copies_geometry_and_page() {
        let boxes = classify_json(&summary_json()).unwrap();
        let waiver = &boxes[1];
        assert_eq!(waiver.page_number, 2);
        assert_eq!(waiver.x, 0.2);
        assert_eq!(waiver.y, 0.2);
        assert_eq!(waiver.width, 0.3);
        assert_eq!(waiver.height, 0.05);
        assert_eq!(waiver.label.as_deref(), Some("Waiver"));
        assert!(waiver.confidence.is_none());
    }

    #[test]
    fn test_empty_assessment_yields_nothing() {
        assert!(classify(&RiskAssessment::default()).is_empty());
    }

    #[test]
    fn test_bad_page_number_keeps_rest_of_summary() {
        let mut bad = item("Arbitration", 1, 0.5);
        bad["source_citation"]["page_number"] = serde_json::json!(-1);
        let json = serde_json::json!({
            "risk_assessment": {"high_risk_items": [item("Indemnity", 1, 0.1), bad]}
        })
        .to_string();

        let boxes = classify_json(&json).unwrap();
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].page_number, 1);
        assert_eq!(boxes[1].page_number, 0);

        let (kept, dropped) = apply_policy(CitationPolicy::Clamp, &boxes, Some(3));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id.as_deref(), Some("high-0"));
        assert_eq!(dropped[0].citation.id.as_deref(), Some("high-1"));
        assert_eq!(dropped[0].reason, DropReason::PageOutOfRange { num_pages: 3 });
    }

    #[test]
    fn test_malformed_json_is_invalid_summary() {
        let result = classify_json("{\"risk_assessment\": 5}");
        assert!(matches!(result, Err(ViewerError::InvalidSummary(_))));
    }
}
