//! Render-manifest anchors: bidirectional navigation metadata between
//! timeline rows and the appendix page references that back them.
//!
//! Ported from `render_manifest.py`. The renderer never resolves a link to
//! an actual PDF annotation target here — that's the PDF renderer's
//! best-effort post-pass — this module only accumulates the anchor/link
//! bookkeeping that `render_manifest.json` serializes verbatim.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

/// Anchor attached to a rendered timeline row.
pub fn chron_anchor(event_id: &str) -> String {
    format!("chron_row_{event_id}")
}

/// Anchor attached to an appendix page reference. The suffix is a stable
/// hash of `doc_id|page` so the same citation always anchors to the same
/// fragment across re-renders.
pub fn appendix_anchor(source_document_id: &str, page: u32) -> String {
    format!("app_{source_document_id}_p_{page}_{}", stable_suffix(source_document_id, page))
}

fn stable_suffix(source_document_id: &str, page: u32) -> String {
    let key = format!("{source_document_id}|{page}");
    let digest = Sha1::digest(key.as_bytes());
    hex::encode(digest)[..8].to_string()
}

pub fn parse_chron_anchor(anchor: &str) -> Option<&str> {
    anchor.strip_prefix("chron_row_")
}

pub fn parse_appendix_anchor(anchor: &str) -> Option<(&str, u32)> {
    let tail = anchor.strip_prefix("app_")?;
    let (doc_id, rest) = tail.rsplit_once("_p_")?;
    let page_str = rest.split('_').next()?;
    let page = page_str.parse().ok()?;
    Some((doc_id, page))
}

/// The `render_manifest.json` output contract: anchors plus forward/back
/// link adjacency, keyed by anchor string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderManifest {
    pub chron_anchors: Vec<String>,
    pub appendix_anchors: Vec<String>,
    pub forward_links: BTreeMap<String, Vec<String>>,
    pub back_links: BTreeMap<String, Vec<String>>,
}

impl RenderManifest {
    pub fn add_chron_anchor(&mut self, anchor: impl Into<String>) {
        let anchor = anchor.into();
        if !self.chron_anchors.contains(&anchor) {
            self.chron_anchors.push(anchor);
        }
    }

    pub fn add_appendix_anchor(&mut self, anchor: impl Into<String>) {
        let anchor = anchor.into();
        if !self.appendix_anchors.contains(&anchor) {
            self.appendix_anchors.push(anchor);
        }
    }

    pub fn add_link(&mut self, from_anchor: impl Into<String>, to_anchor: impl Into<String>) {
        let from_anchor = from_anchor.into();
        let to_anchor = to_anchor.into();
        let forward = self.forward_links.entry(from_anchor.clone()).or_default();
        if !forward.contains(&to_anchor) {
            forward.push(to_anchor.clone());
        }
        let back = self.back_links.entry(to_anchor).or_default();
        if !back.contains(&from_anchor) {
            back.push(from_anchor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_formats() {
        assert_eq!(chron_anchor("e1"), "chron_row_e1");
        let anchor = appendix_anchor("doc-1", 3);
        assert!(anchor.starts_with("app_doc-1_p_3_"));
        assert_eq!(anchor.len(), "app_doc-1_p_3_".len() + 8);
    }

    #[test]
    fn test_anchor_roundtrip() {
        let anchor = appendix_anchor("doc-1", 3);
        let (doc_id, page) = parse_appendix_anchor(&anchor).unwrap();
        assert_eq!(doc_id, "doc-1");
        assert_eq!(page, 3);
        assert_eq!(parse_chron_anchor("chron_row_e1"), Some("e1"));
    }

    #[test]
    fn test_add_link_populates_both_directions() {
        let mut manifest = RenderManifest::default();
        manifest.add_link("chron_row_e1", "app_doc-1_p_3_abcdef01");
        assert_eq!(manifest.forward_links["chron_row_e1"], vec!["app_doc-1_p_3_abcdef01".to_string()]);
        assert_eq!(manifest.back_links["app_doc-1_p_3_abcdef01"], vec!["chron_row_e1".to_string()]);
    }

    #[test]
    fn test_anchor_dedup() {
        let mut manifest = RenderManifest::default();
        manifest.add_chron_anchor("chron_row_e1");
        manifest.add_chron_anchor("chron_row_e1");
        assert_eq!(manifest.chron_anchors.len(), 1);
    }
}
