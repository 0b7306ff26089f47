//! Artifact rendering (component P): turns the finished evidence graph and
//! projection into the fixed 14-file output contract.
//!
//! `markdown` builds the canonical report text shared by `chronology.md`
//! and `chronology.pdf` so the two never diverge in substance; `csv` and
//! `docx` render the tabular/word-processor variants from the same
//! projection rows; `manifest` accumulates the anchor/link bookkeeping as
//! the Markdown pass walks the timeline and appendices; `fail_cover`
//! prepends a QA-failure summary page when any scorer or the checklist
//! fails, without touching the bytes beneath it.

pub mod csv;
pub mod docx;
pub mod fail_cover;
pub mod manifest;
pub mod markdown;
pub mod pdf;

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::model::{ChronologyProjectionEntry, Citation, ClaimEdge, Event, Gap, SourceDocument};
use crate::qa::ScorerResult;

use manifest::RenderManifest;

/// Everything the renderer needs, gathered after every upstream stage
/// (extraction through claim-edge construction and QA scoring) has run.
pub struct RenderInput<'a> {
    pub matter_title: &'a str,
    pub projection: &'a [ChronologyProjectionEntry],
    pub claim_edges: &'a [ClaimEdge],
    pub gaps: &'a [Gap],
    pub events: &'a [Event],
    pub citations: &'a [Citation],
    pub source_documents: &'a [SourceDocument],
    pub page_text_by_number: &'a HashMap<u32, String>,
    pub narrative_synthesis: Option<&'a str>,
    pub care_window: Option<(NaiveDate, NaiveDate)>,
}

/// The QA verdicts that decide whether a fail-cover page is prepended.
pub struct RenderQa<'a> {
    pub luqa: &'a ScorerResult,
    pub attorney_readiness: &'a ScorerResult,
    pub legal_usability: &'a ScorerResult,
    pub checklist: &'a ScorerResult,
}

/// All rendered artifact bytes plus the shared manifest, keyed by the
/// exact output-contract filenames (minus the JSON debug/report files,
/// which the orchestrator serializes directly from the structs it already
/// holds).
pub struct RenderedArtifacts {
    pub pdf: Vec<u8>,
    pub csv: Vec<u8>,
    pub docx: Vec<u8>,
    pub markdown: Vec<u8>,
    pub manifest: RenderManifest,
    pub report_text: String,
}

/// Renders every byte-bearing artifact (`chronology.pdf/csv/docx/md`) from
/// a single shared report text, and returns the manifest built alongside
/// it. The fail-cover page, if any, is applied by the caller via
/// [`fail_cover::apply`] once all four QA verdicts are known — rendering
/// happens exactly once regardless of pass/fail.
pub fn render_all(input: &RenderInput) -> RenderedArtifacts {
    let mut render_manifest = RenderManifest::default();
    let report_text = markdown::build_report_text(input, &mut render_manifest);

    let pdf_bytes = pdf::render_pdf(&report_text);
    let csv_bytes = csv::generate_csv_from_projection(input.projection);
    let docx_bytes = docx::render_docx(&report_text);
    let markdown_bytes = report_text.clone().into_bytes();

    RenderedArtifacts {
        pdf: pdf_bytes,
        csv: csv_bytes,
        docx: docx_bytes,
        markdown: markdown_bytes,
        manifest: render_manifest,
        report_text,
    }
}

/// Applies the fail-cover page to the PDF and Markdown artifacts in place
/// when any QA verdict failed. CSV and DOCX are left untouched: the
/// fail-cover is a narrative-report convention, not a tabular one.
pub fn apply_fail_cover(artifacts: &mut RenderedArtifacts, qa: &RenderQa) {
    if let Some(cover_text) = fail_cover::build_cover_text(qa) {
        artifacts.markdown = fail_cover::prepend_markdown(&cover_text, &artifacts.markdown);
        artifacts.pdf = pdf::render_pdf(&fail_cover::prepend_report_text(&cover_text, &artifacts.report_text));
    }
}
