//! Event extractors (component F).
//!
//! Seven parallel typed extractors, one per clinical domain, each scanning
//! pages whose classified type matches its domain and producing typed
//! `Event` records with facts, citations, and page references. Shared
//! regex families and citation-building helpers live here; domain-specific
//! fact patterns live in each submodule.

mod billing;
mod clinical;
pub(crate) mod common;
mod discharge;
mod imaging;
mod lab;
mod operative;
mod pt;

use std::collections::HashMap;

use crate::config::RunConfig;
use crate::model::{Citation, Event, Page};
use crate::warning::Warning;

/// Runs all seven extractors over the page set and returns the combined
/// events and citations, plus any warnings raised along the way.
pub fn extract_all_events(
    pages: &[Page],
    page_provider_map: &HashMap<u32, String>,
    config: &RunConfig,
) -> (Vec<Event>, Vec<Citation>, Vec<Warning>) {
    let mut events = Vec::new();
    let mut citations = Vec::new();
    let mut warnings = Vec::new();

    for extractor in [
        clinical::extract as fn(&[Page], &HashMap<u32, String>, &RunConfig) -> (Vec<Event>, Vec<Citation>, Vec<Warning>),
        imaging::extract,
        pt::extract,
        billing::extract,
        lab::extract,
        discharge::extract,
        operative::extract,
    ] {
        let (e, c, w) = extractor(pages, page_provider_map, config);
        events.extend(e);
        citations.extend(c);
        warnings.extend(w);
    }

    (events, citations, warnings)
}
