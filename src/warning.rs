//! The closed warning taxonomy emitted by every stage.
//!
//! Every stage accumulates `Warning`s onto the run rather than failing hard;
//! only a handful of conditions escalate to a `CoreError`. Codes are a fixed
//! enumeration so that downstream QA gates and consumers can match on them
//! without parsing message text.

use serde::{Deserialize, Serialize};

/// One of the stable warning codes a stage may emit.
///
/// `as_str()` is the wire representation used in `Warning::code` and in the
/// schema; keep this enumeration closed — new conditions should map onto an
/// existing code before a new one is minted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningCode {
    InvalidMimeType,
    InvalidSha256,
    EmptyDocument,
    OcrDisabled,
    OcrUnavailable,
    OcrTimeout,
    OcrQualityLow,
    OcrNoText,
    OcrBudgetExceeded,
    BboxFallback,
    NoProvidersDetected,
    SchemaValidationError,
    LitigationReviewFail,
}

impl WarningCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningCode::InvalidMimeType => "INVALID_MIME_TYPE",
            WarningCode::InvalidSha256 => "INVALID_SHA256",
            WarningCode::EmptyDocument => "EMPTY_DOCUMENT",
            WarningCode::OcrDisabled => "OCR_DISABLED",
            WarningCode::OcrUnavailable => "OCR_UNAVAILABLE",
            WarningCode::OcrTimeout => "OCR_TIMEOUT",
            WarningCode::OcrQualityLow => "OCR_QUALITY_LOW",
            WarningCode::OcrNoText => "OCR_NO_TEXT",
            WarningCode::OcrBudgetExceeded => "OCR_BUDGET_EXCEEDED",
            WarningCode::BboxFallback => "BBOX_FALLBACK",
            WarningCode::NoProvidersDetected => "NO_PROVIDERS_DETECTED",
            WarningCode::SchemaValidationError => "SCHEMA_VALIDATION_ERROR",
            WarningCode::LitigationReviewFail => "LITIGATION_REVIEW_FAIL",
        }
    }
}

impl std::fmt::Display for WarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single warning accumulated on the run. `page`/`document_id` are present
/// when the warning is attributable to a specific location in the source
/// material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

impl Warning {
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code: code.as_str().to_string(),
            message: message.into(),
            page: None,
            document_id: None,
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_document(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_code_strings_are_stable() {
        assert_eq!(WarningCode::BboxFallback.as_str(), "BBOX_FALLBACK");
        assert_eq!(
            WarningCode::NoProvidersDetected.as_str(),
            "NO_PROVIDERS_DETECTED"
        );
    }

    #[test]
    fn test_warning_builder() {
        let w = Warning::new(WarningCode::OcrTimeout, "page 4 timed out")
            .with_page(4)
            .with_document("doc-1");
        assert_eq!(w.code, "OCR_TIMEOUT");
        assert_eq!(w.page, Some(4));
        assert_eq!(w.document_id.as_deref(), Some("doc-1"));
    }
}
