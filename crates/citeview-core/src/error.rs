use thiserror::Error;

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("Invalid PDF payload: {0}")]
    InvalidPayload(String),

    #[error("Payload is not a PDF document")]
    NotAPdf,

    #[error("Failed to load PDF: {0}")]
    DocumentLoad(String),

    #[error("PDF has no pages")]
    EmptyDocument,

    #[error("PDF has {pages} pages, the viewer accepts at most {max}")]
    PageLimitExceeded { pages: u32, max: u32 },

    #[error("Failed to parse summary: {0}")]
    InvalidSummary(#[from] serde_json::Error),

    #[error("Invalid viewer configuration: {0}")]
    InvalidConfig(String),

    #[error("PDF renderer unavailable: {0}")]
    RendererUnavailable(String),
}
