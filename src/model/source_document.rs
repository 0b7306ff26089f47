use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A raw input file, as supplied by the caller. Created externally; the
/// core never mutates a `SourceDocument` once received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    pub document_id: String,
    pub filename: String,
    pub mime_type: String,
    /// 64 lowercase hex characters identifying the byte content.
    pub sha256: String,
    pub bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

impl SourceDocument {
    /// `sha256` is well-formed: exactly 64 lowercase hex characters.
    pub fn has_valid_sha256(&self) -> bool {
        self.sha256.len() == 64 && self.sha256.chars().all(|c| c.is_ascii_hexdigit())
    }

    pub fn is_supported_mime_type(&self) -> bool {
        self.mime_type == "application/pdf"
    }

    pub fn is_empty(&self) -> bool {
        self.bytes == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(sha256: &str, bytes: u64) -> SourceDocument {
        SourceDocument {
            document_id: "doc-1".to_string(),
            filename: "packet.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            sha256: sha256.to_string(),
            bytes,
            uploaded_at: Utc::now(),
        }
    }

    #[test]
    fn test_valid_sha256() {
        let d = doc(&"a".repeat(64), 10);
        assert!(d.has_valid_sha256());
    }

    #[test]
    fn test_invalid_sha256_wrong_length() {
        let d = doc("deadbeef", 10);
        assert!(!d.has_valid_sha256());
    }

    #[test]
    fn test_invalid_sha256_non_hex() {
        let d = doc(&"z".repeat(64), 10);
        assert!(!d.has_valid_sha256());
    }

    #[test]
    fn test_empty_document() {
        let d = doc(&"a".repeat(64), 0);
        assert!(d.is_empty());
    }
}
