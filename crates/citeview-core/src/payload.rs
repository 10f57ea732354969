//! PDF payload decoding
//!
//! The file-retrieval layer hands over either a `data:application/pdf;base64,`
//! URL or bare base64. Both are decoded to bytes and identified by the SHA-256
//! of the decoded content, so re-sending the same document is detectable.

use crate::error::ViewerError;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// PDF readers accept the header anywhere in the first 1024 bytes
const HEADER_WINDOW: usize = 1024;
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Hex SHA-256 of a decoded document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DocumentDigest(String);

impl DocumentDigest {
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for log lines
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl fmt::Display for DocumentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decoded PDF bytes plus their identity
#[derive(Debug, Clone)]
pub struct PdfPayload {
    bytes: Vec<u8>,
    digest: DocumentDigest,
}

impl PdfPayload {
    /// Decode a data URL or bare base64 string
    pub fn from_base64(input: &str) -> Result<Self, ViewerError> {
        let encoded = strip_data_url(input)?;
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();

        if compact.is_empty() {
            return Err(ViewerError::InvalidPayload("payload is empty".to_string()));
        }

        let bytes = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| ViewerError::InvalidPayload(e.to_string()))?;

        Self::from_bytes(bytes)
    }

    /// Wrap already-decoded bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ViewerError> {
        if !has_pdf_header(&bytes) {
            return Err(ViewerError::NotAPdf);
        }

        let digest = DocumentDigest::of(&bytes);
        Ok(Self { bytes, digest })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn digest(&self) -> &DocumentDigest {
        &self.digest
    }
}

/// Return the base64 part of a data URL, or the input unchanged
fn strip_data_url(input: &str) -> Result<&str, ViewerError> {
    let trimmed = input.trim();
    let Some(rest) = trimmed.strip_prefix("data:") else {
        return Ok(trimmed);
    };

    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| ViewerError::InvalidPayload("data URL has no data section".to_string()))?;

    if !header.ends_with(";base64") {
        return Err(ViewerError::InvalidPayload(
            "data URL is not base64-encoded".to_string(),
        ));
    }

    Ok(data)
}

fn has_pdf_header(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_WINDOW)];
    window.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
}

/// Pick the document to show from a `filename -> base64` map.
///
/// The preferred file wins when present; otherwise the first file in key order.
pub fn select_document<'a>(
    files: &'a BTreeMap<String, String>,
    preferred: Option<&str>,
) -> Option<(&'a str, &'a str)> {
    if let Some(name) = preferred {
        if let Some((key, value)) = files.get_key_value(name) {
            return Some((key.as_str(), value.as_str()));
        }
    }

    files
        .iter()
        .next()
        .map(|(key, value)| (key.as_str(), value.as_str()))
}
