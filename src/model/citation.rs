use serde::{Deserialize, Serialize};

use super::page::Layout;

/// Points a Fact back at the verbatim text it was extracted from.
/// Invariant: every Fact references a Citation; the snippet must be
/// findable on that page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub citation_id: String,
    pub source_document_id: String,
    pub page_number: u32,
    pub snippet: String,
    pub bbox: Layout,
    /// sha256 of the normalized snippet.
    pub text_hash: String,
}

impl Citation {
    pub fn has_fallback_bbox(&self) -> bool {
        self.bbox == Layout::default()
    }
}
