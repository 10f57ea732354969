//! Legal document summary produced by the analysis backend
//!
//! Only the risk assessment drives the viewer; the other sections are typed so
//! the whole payload can be deserialized and passed around in one piece.

use serde::{Deserialize, Deserializer, Serialize};

/// Normalized rectangle as emitted by the backend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CitationRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Where a piece of extracted text came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCitation {
    #[serde(default)]
    pub filename: String,
    pub bounding_box: CitationRect,
    #[serde(default)]
    pub paragraph_text: String,
    /// Page number (1-indexed). Anything that is not a positive integer
    /// becomes 0 so the viewer reports the citation instead of rejecting
    /// the whole summary.
    #[serde(deserialize_with = "lenient_page_number")]
    pub page_number: u32,
    #[serde(default)]
    pub paragraph_id: String,
}

fn lenient_page_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let page = match &value {
        serde_json::Value::Number(n) => match n.as_u64() {
            Some(page) => u32::try_from(page).ok(),
            None => n
                .as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 1.0 && *f <= f64::from(u32::MAX))
                .map(|f| f as u32),
        },
        _ => None,
    };
    Ok(page.unwrap_or(0))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Standard,
    Medium,
    High,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightType {
    Positive,
    Warning,
    Neutral,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObligationCategory {
    Financial,
    Access,
    Maintenance,
    Legal,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryParty {
    pub role: String,
    pub name: String,
    pub source_citation: SourceCitation,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentOverview {
    pub title: String,
    pub primary_parties: Vec<PrimaryParty>,
    pub document_type: String,
    pub effective_period: String,
    pub total_pages: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialTerm {
    pub term: String,
    pub amount: String,
    #[serde(default)]
    pub description: String,
    pub source_citation: SourceCitation,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportantDate {
    pub event: String,
    pub date: String,
    #[serde(default)]
    pub description: String,
    pub source_citation: SourceCitation,
    pub importance: Level,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskItem {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub why_risky: String,
    #[serde(default)]
    pub recommendation: String,
    pub source_citation: SourceCitation,
    pub severity: Level,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskAssessment {
    pub overall_risk_score: f64,
    pub risk_summary: String,
    pub high_risk_items: Vec<RiskItem>,
    pub medium_risk_items: Vec<RiskItem>,
    pub low_risk_items: Vec<RiskItem>,
}

impl RiskAssessment {
    pub fn total_items(&self) -> usize {
        self.high_risk_items.len() + self.medium_risk_items.len() + self.low_risk_items.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obligation {
    pub party: String,
    pub obligation: String,
    #[serde(default)]
    pub consequence: String,
    pub source_citation: SourceCitation,
    pub category: ObligationCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryHighlight {
    #[serde(rename = "type")]
    pub kind: HighlightType,
    pub text: String,
    pub source_citation: SourceCitation,
}

/// Complete structured summary of one legal document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegalDocumentSummary {
    pub document_overview: DocumentOverview,
    pub key_financial_terms: Vec<FinancialTerm>,
    pub important_dates: Vec<ImportantDate>,
    pub risk_assessment: RiskAssessment,
    pub key_obligations: Vec<Obligation>,
    pub summary_highlights: Vec<SummaryHighlight>,
}

impl LegalDocumentSummary {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
