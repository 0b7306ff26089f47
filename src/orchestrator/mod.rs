//! The pipeline driver (component Q): runs every stage in sequence over a
//! single run's source documents and writes the fourteen-file output
//! contract.
//!
//! A run is single-threaded control flow end to end; the only stage that
//! fans out is OCR inside [`processing::acquire_pages`], bounded by
//! `EnvConfig::ocr_workers`. Every stage after extraction re-sorts or
//! re-derives deterministically from its input, so re-running the same
//! `run_id` against the same bytes and config reproduces the same
//! evidence graph.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::citations;
use crate::claim_edges;
use crate::claim_guard;
use crate::classify;
use crate::confidence;
use crate::config::{EnvConfig, RunConfig};
use crate::db::{Database, RunGraph};
use crate::dedup;
use crate::enrichment;
use crate::error::CoreError;
use crate::extractors;
use crate::gaps;
use crate::model::{ChronologyProjectionEntry, ClaimEdge, Document, Event, Gap, Page, Run, RunStatus, SourceDocument};
use crate::processing::{self, ocr::OcrEngine};
use crate::projection_builder;
use crate::provider_detect;
use crate::qa::{self, ScorerContext};
use crate::render::{self, RenderInput, RenderQa};
use crate::schema;
use crate::segment;
use crate::storage::{Storage, StorageError};
use crate::warning::{Warning, WarningCode};

const PIPELINE_VERSION: &str = "pi-chronology-mvp-1.0";
const EXPORT_FORMAT_VERSION: &str = "1.0";

/// One uploaded file plus the bytes behind it. `SourceDocument` itself only
/// carries a byte *count* (it's an input-contract record that may be
/// round-tripped through JSON on its own); the orchestrator needs the
/// actual content to run text acquisition against.
pub struct SourceDocumentInput {
    pub document: SourceDocument,
    pub data: Vec<u8>,
}

pub struct PipelineInputs {
    pub source_documents: Vec<SourceDocumentInput>,
    pub config: RunConfig,
}

/// A rendered artifact's location and content hash, per the output
/// contract's `{uri, sha256, bytes}` shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub uri: String,
    pub sha256: String,
    pub bytes: u64,
}

impl ArtifactRef {
    fn empty() -> Self {
        Self { uri: String::new(), sha256: String::new(), bytes: 0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exports {
    pub pdf: ArtifactRef,
    pub csv: ArtifactRef,
    pub docx: ArtifactRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<ArtifactRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChronologyOutput {
    pub export_format_version: String,
    pub events_exported: usize,
    pub exports: Exports,
}

pub struct PipelineOutputs {
    pub run: Run,
    pub evidence_graph: Value,
    pub chronology: ChronologyOutput,
}

const REQUIRED_ARTIFACT_NAMES: [&str; 14] = [
    "chronology.pdf",
    "chronology.csv",
    "chronology.docx",
    "chronology.md",
    "evidence_graph.json",
    "missing_records.json",
    "selection_debug.json",
    "claim_guard_report.json",
    "render_manifest.json",
    "luqa_report.json",
    "attorney_readiness_report.json",
    "legal_usability_report.json",
    "semqa_debug.json",
    "qa_litigation_checklist.json",
];

/// Wires the fourteen-file output contract together: storage, the optional
/// SQLite mirror, and the OCR engine boundary every text-acquisition call
/// needs.
pub struct Orchestrator {
    storage: Storage,
    db: Option<Database>,
    ocr_engine: Arc<dyn OcrEngine>,
}

impl Orchestrator {
    pub fn new(storage: Storage, db: Option<Database>, ocr_engine: Arc<dyn OcrEngine>) -> Self {
        Self { storage, db, ocr_engine }
    }

    /// Runs the full pipeline once: text acquisition through QA scoring
    /// through artifact export. Short of a hard stop, failures anywhere in
    /// a stage become warnings on the run rather than aborting it. A
    /// cancelled token ends the run early with `status = failed` and
    /// `error_message = "Cancelled by user"`.
    pub async fn run(&self, inputs: PipelineInputs, cancel: CancellationToken) -> PipelineOutputs {
        let env = EnvConfig::from_env();
        let run_id = Uuid::new_v4().to_string();
        self.storage.clear_run(&run_id).ok();

        let mut run = Run::new(run_id.clone(), inputs.config.clone(), Utc::now());

        for input in &inputs.source_documents {
            if !input.document.has_valid_sha256() {
                run.warnings.push(Warning::new(WarningCode::InvalidSha256, "source document sha256 is malformed").with_document(input.document.document_id.clone()));
            } else if !input.document.is_supported_mime_type() {
                run.warnings.push(Warning::new(WarningCode::InvalidMimeType, format!("unsupported mime type: {}", input.document.mime_type)).with_document(input.document.document_id.clone()));
            } else if input.document.is_empty() {
                run.warnings.push(Warning::new(WarningCode::EmptyDocument, "source document has zero bytes").with_document(input.document.document_id.clone()));
            }
        }

        let valid_inputs: Vec<&SourceDocumentInput> = inputs
            .source_documents
            .iter()
            .filter(|input| input.document.has_valid_sha256() && input.document.is_supported_mime_type() && !input.document.is_empty())
            .collect();

        if valid_inputs.is_empty() {
            run.transition_to(RunStatus::Failed);
            run.error_message = Some(CoreError::Unrecoverable("no valid source documents provided".to_string()).truncated_message());
            run.finished_at = Some(Utc::now());
            return failure_outputs(run);
        }

        run.transition_to(RunStatus::Running);
        let source_documents: Vec<SourceDocument> = valid_inputs.iter().map(|i| i.document.clone()).collect();

        // --- A: text acquisition, classification -----------------------

        let mut pages: Vec<Page> = Vec::new();
        for input in &valid_inputs {
            if cancel.is_cancelled() {
                return self.cancel_run(run).await;
            }
            let offset = pages.len() as u32;
            let (mut doc_pages, warnings) =
                processing::acquire_pages(&input.document.document_id, &input.data, offset, &env, &self.ocr_engine, &cancel).await;
            run.warnings.extend(warnings);
            for page in doc_pages.iter_mut() {
                let (page_type, _confidence) = classify::classify_page(&page.text);
                page.page_type = page_type;
            }
            pages.extend(doc_pages);
            if pages.len() as u32 >= inputs.config.max_pages {
                pages.truncate(inputs.config.max_pages as usize);
                break;
            }
        }

        if cancel.is_cancelled() {
            return self.cancel_run(run).await;
        }

        // --- B/C/D: segmentation, provider detection --------------------

        let documents: Vec<Document> = segment::segment_documents(&pages);
        let (providers, page_provider_map, provider_warnings) = provider_detect::detect_providers(&pages);
        run.warnings.extend(provider_warnings);

        // --- F/G: extraction, citation finalization -----------------------

        let (events, raw_citations, extraction_warnings) = extractors::extract_all_events(&pages, &page_provider_map, &inputs.config);
        run.warnings.extend(extraction_warnings);
        let (citations, citation_warnings) = citations::finalize_citations(raw_citations);
        run.warnings.extend(citation_warnings);

        // --- H/I/J: dedup, confidence, gaps --------------------------------

        let mut events = dedup::dedup_events(events);
        confidence::score_events(&mut events, &inputs.config);

        let exportable_events: Vec<Event> = events
            .iter()
            .filter(|e| match inputs.config.low_confidence_event_behavior {
                crate::config::LowConfidenceEventBehavior::ExcludeFromExport => !e.flags.contains("LOW_CONFIDENCE"),
                crate::config::LowConfidenceEventBehavior::IncludeWithFlag => true,
            })
            .filter(|e| inputs.config.include_billing_events_in_timeline || e.event_type != crate::model::EventType::BillingEvent)
            .cloned()
            .collect();

        let gap_list: Vec<Gap> = gaps::detect_gaps(&exportable_events, &inputs.config);

        // --- K/L: projection, required-bucket synthesis --------------------

        let mut projection = projection_builder::build_projection(&exportable_events, &citations, &providers, &source_documents);
        let today = Utc::now().date_naive();
        let synthesized = enrichment::synthesize_missing_buckets(&pages, &projection, today);
        let missing_records: Vec<Value> = synthesized
            .iter()
            .map(|e| json!({"bucket": e.event_type_display, "synthesized_event_id": e.event_id, "note": "present in source text but not produced by any extractor"}))
            .collect();
        projection.extend(synthesized);

        // --- M: claim-edge construction, claim-guard redaction --------------

        let claim_edge_list = claim_edges::build_claim_edges(&projection);
        let narrative = build_narrative_synthesis(&claim_edge_list);
        let page_texts: Vec<String> = pages.iter().map(|p| p.text.clone()).collect();
        let (scrubbed_narrative, claim_audit) = claim_guard::apply_claim_guard(&narrative, &page_texts);

        let page_text_by_number: HashMap<u32, String> = pages.iter().map(|p| (p.page_number, p.text.clone())).collect();
        let care_window = care_window_from_projection(&projection);

        // --- P: rendering ---------------------------------------------------

        let render_input = RenderInput {
            matter_title: "Medical Chronology",
            projection: &projection,
            claim_edges: &claim_edge_list,
            gaps: &gap_list,
            events: &exportable_events,
            citations: &citations,
            source_documents: &source_documents,
            page_text_by_number: &page_text_by_number,
            narrative_synthesis: Some(scrubbed_narrative.as_str()),
            care_window,
        };
        let mut rendered = render::render_all(&render_input);

        // --- N/O: QA scoring, litigation checklist --------------------------

        let ctx = ScorerContext { projection_entries: &projection, page_text_by_number: &page_text_by_number };
        let luqa_result = qa::luqa::score(&rendered.report_text, &ctx);
        let attorney_result = qa::attorney_readiness::score(&rendered.report_text, &ctx);
        let legal_result = qa::legal_usability::score(&rendered.report_text, &ctx, &luqa_result, &attorney_result);

        let artifact_names: Vec<String> = REQUIRED_ARTIFACT_NAMES.iter().map(|s| s.to_string()).collect();
        let checklist_input = qa::checklist::ChecklistInput {
            report_text: &rendered.report_text,
            ctx: &ctx,
            luqa: &luqa_result,
            attorney: &attorney_result,
            legal: &legal_result,
            claim_audit: &claim_audit,
            claim_edges: &claim_edge_list,
            gaps: &gap_list,
            rendered_artifact_names: &artifact_names,
        };
        let checklist_result = qa::checklist::evaluate(&checklist_input);
        if !checklist_result.pass_ {
            run.warnings.push(Warning::new(WarningCode::LitigationReviewFail, format!("litigation checklist scored {}", checklist_result.score_0_100)));
        }

        let render_qa = RenderQa { luqa: &luqa_result, attorney_readiness: &attorney_result, legal_usability: &legal_result, checklist: &checklist_result };
        render::apply_fail_cover(&mut rendered, &render_qa);

        let semqa_debug = json!({
            "failures": checklist_result.failures.iter().filter(|f| f.code.starts_with("Q_SEM_")).cloned().collect::<Vec<_>>(),
            "vitals_ratio": checklist_result.metrics.get("vitals_ratio"),
            "admin_ratio": checklist_result.metrics.get("admin_ratio"),
        });

        let mut ranked_edges: Vec<&ClaimEdge> = claim_edge_list.iter().collect();
        ranked_edges.sort_by_key(|e| std::cmp::Reverse(e.selection_score()));
        let selection_debug = json!({
            "total_claim_edges": claim_edge_list.len(),
            "top_10": ranked_edges.iter().take(10).map(|e| json!({
                "id": e.id,
                "claim_type": e.claim_type,
                "support_score": e.support_score,
                "materiality_weight": e.materiality_weight,
                "selection_score": e.selection_score(),
            })).collect::<Vec<_>>(),
        });

        let evidence_graph = json!({
            "source_documents": source_documents,
            "pages": pages,
            "documents": documents,
            "providers": providers,
            "citations": citations,
            "events": events,
            "gaps": gap_list,
            "claim_edges": claim_edge_list,
            "projection": projection,
        });

        // --- Artifact export -------------------------------------------------

        let pdf_ref = self.write(&run_id, "chronology.pdf", &rendered.pdf);
        let csv_ref = self.write(&run_id, "chronology.csv", &rendered.csv);
        let docx_ref = self.write(&run_id, "chronology.docx", &rendered.docx);
        self.write(&run_id, "chronology.md", &rendered.markdown);
        self.write(&run_id, "evidence_graph.json", &to_json_bytes(&evidence_graph));
        self.write(&run_id, "missing_records.json", &to_json_bytes(&json!({"missing_count": missing_records.len(), "entries": missing_records})));
        self.write(&run_id, "selection_debug.json", &to_json_bytes(&selection_debug));
        self.write(&run_id, "claim_guard_report.json", &to_json_bytes(&claim_audit));
        self.write(&run_id, "render_manifest.json", &to_json_bytes(&rendered.manifest));
        self.write(&run_id, "luqa_report.json", &to_json_bytes(&luqa_result));
        self.write(&run_id, "attorney_readiness_report.json", &to_json_bytes(&attorney_result));
        self.write(&run_id, "legal_usability_report.json", &to_json_bytes(&legal_result));
        self.write(&run_id, "semqa_debug.json", &to_json_bytes(&semqa_debug));
        let checklist_ref = self.write(&run_id, "qa_litigation_checklist.json", &to_json_bytes(&checklist_result));

        if env.debug_artifacts {
            self.write(&run_id, "claim_ledger_lite.json", &to_json_bytes(&claim_edge_list));
            self.write(
                &run_id,
                "case_collapse.json",
                &to_json_bytes(&json!({"gaps": gap_list, "synthesized_buckets": missing_records})),
            );
        }

        let (pdf_ref, csv_ref, docx_ref) = match (pdf_ref, csv_ref, docx_ref) {
            (Some(p), Some(c), Some(d)) => (p, c, d),
            _ => {
                run.transition_to(RunStatus::Failed);
                run.error_message = Some(CoreError::Storage("failed to write one or more core artifacts".to_string()).truncated_message());
                run.finished_at = Some(Utc::now());
                return PipelineOutputs {
                    run,
                    evidence_graph,
                    chronology: ChronologyOutput { export_format_version: EXPORT_FORMAT_VERSION.to_string(), events_exported: exportable_events.len(), exports: empty_exports() },
                };
            }
        };

        // --- Output-contract validation --------------------------------------

        let chronology = ChronologyOutput {
            export_format_version: EXPORT_FORMAT_VERSION.to_string(),
            events_exported: exportable_events.len(),
            exports: Exports { pdf: pdf_ref, csv: csv_ref, docx: docx_ref, json: checklist_ref },
        };

        let instance = json!({
            "run": {"run_id": run.run_id, "status": "success"},
            "evidence_graph": &evidence_graph,
            "chronology": &chronology,
        });
        let schema_warnings = schema::validate_output(&instance);
        let schema_ok = schema_warnings.is_empty();
        run.warnings.extend(schema_warnings);

        if cancel.is_cancelled() {
            return self.cancel_run(run).await;
        }

        run.provenance.pipeline_version = PIPELINE_VERSION.to_string();
        run.provenance.ocr_engine = "configured-ocr-engine".to_string();
        run.metrics.insert("events_extracted".into(), events.len().into());
        run.metrics.insert("events_exported".into(), exportable_events.len().into());
        run.metrics.insert("gaps_detected".into(), gap_list.len().into());
        run.metrics.insert("claim_edges".into(), claim_edge_list.len().into());
        run.metrics.insert("checklist_score".into(), checklist_result.score_0_100.into());
        run.metrics.insert("checklist_pass".into(), checklist_result.pass_.into());

        let status = if schema_ok { RunStatus::Success } else { RunStatus::Partial };
        run.transition_to(status);
        run.finished_at = Some(Utc::now());

        if let Some(db) = &self.db {
            let graph = RunGraph {
                run: &run,
                source_documents: &source_documents,
                pages: &pages,
                documents: &documents,
                providers: &providers,
                citations: &citations,
                events: &events,
                gaps: &gap_list,
                claim_edges: &claim_edge_list,
            };
            if let Err(e) = db.persist_run(&graph).await {
                log::warn!("failed to persist run {}: {e}", run.run_id);
            }
        }

        PipelineOutputs { run, evidence_graph, chronology }
    }

    fn write(&self, run_id: &str, name: &str, data: &[u8]) -> Option<ArtifactRef> {
        match self.storage.write_artifact(run_id, name, data) {
            Ok(r) => Some(ArtifactRef { uri: format!("runs/{run_id}/{}", r.name), sha256: r.sha256, bytes: r.bytes }),
            Err(e) => {
                log_storage_error(run_id, name, &e);
                None
            }
        }
    }

    async fn cancel_run(&self, mut run: Run) -> PipelineOutputs {
        run.transition_to(RunStatus::Failed);
        run.error_message = Some("Cancelled by user".to_string());
        run.finished_at = Some(Utc::now());
        failure_outputs(run)
    }
}

fn empty_exports() -> Exports {
    Exports { pdf: ArtifactRef::empty(), csv: ArtifactRef::empty(), docx: ArtifactRef::empty(), json: None }
}

fn failure_outputs(run: Run) -> PipelineOutputs {
    PipelineOutputs {
        run,
        evidence_graph: json!({}),
        chronology: ChronologyOutput { export_format_version: EXPORT_FORMAT_VERSION.to_string(), events_exported: 0, exports: empty_exports() },
    }
}

fn to_json_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec_pretty(value).unwrap_or_default()
}

fn log_storage_error(run_id: &str, name: &str, err: &StorageError) {
    log::error!("failed to write artifact {name} for run {run_id}: {err}");
}

/// Builds the narrative synthesis claim-guard redacts: `Primary Injuries`
/// drawn from injury-diagnosis claim edges, `Major Complications` from
/// procedure edges carrying any flag (laterality conflict, degenerative
/// language, etc.). A field with no candidates is omitted rather than
/// rendered empty, so claim-guard never has to scrub a placeholder.
fn build_narrative_synthesis(claim_edges: &[ClaimEdge]) -> String {
    let mut lines = Vec::new();

    let injuries: Vec<&str> = claim_edges.iter().filter(|e| e.claim_type == crate::model::ClaimType::InjuryDx).map(|e| e.assertion.as_str()).collect();
    if !injuries.is_empty() {
        lines.push(format!("Primary Injuries: {}", injuries.join(", ")));
    }

    let complications: Vec<&str> = claim_edges
        .iter()
        .filter(|e| e.claim_type == crate::model::ClaimType::Procedure && !e.flags.is_empty())
        .map(|e| e.assertion.as_str())
        .collect();
    if !complications.is_empty() {
        lines.push(format!("Major Complications: {}", complications.join(", ")));
    }

    lines.join("\n")
}

fn care_window_from_projection(projection: &[ChronologyProjectionEntry]) -> Option<(NaiveDate, NaiveDate)> {
    let dates: Vec<NaiveDate> = projection
        .iter()
        .filter_map(|e| e.date_display.split_whitespace().next())
        .filter_map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .collect();
    let min = dates.iter().min().copied()?;
    let max = dates.iter().max().copied()?;
    Some((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ClaimType;
    use std::collections::BTreeSet;

    fn edge(claim_type: ClaimType, assertion: &str, flags: BTreeSet<String>) -> ClaimEdge {
        ClaimEdge {
            id: "edge-1".into(),
            event_id: "e1".into(),
            patient_label: "Patient A".into(),
            claim_type,
            date: None,
            body_region: None,
            provider: None,
            assertion: assertion.to_string(),
            citations: vec![],
            support_score: 5,
            flags,
            materiality_weight: 5,
            extras: Default::default(),
        }
    }

    #[test]
    fn test_narrative_synthesis_includes_injuries_only_when_present() {
        let edges = vec![edge(ClaimType::InjuryDx, "cervical strain", Default::default())];
        let narrative = build_narrative_synthesis(&edges);
        assert!(narrative.contains("Primary Injuries: cervical strain"));
        assert!(!narrative.contains("Major Complications"));
    }

    #[test]
    fn test_narrative_synthesis_omits_both_fields_when_no_candidates() {
        let edges: Vec<ClaimEdge> = vec![];
        assert_eq!(build_narrative_synthesis(&edges), "");
    }

    #[test]
    fn test_care_window_from_projection_picks_min_and_max() {
        let entry = |date: &str| ChronologyProjectionEntry {
            event_id: format!("e-{date}"),
            date_display: format!("{date} (time not documented)"),
            provider_display: "Dr. Smith".into(),
            event_type_display: "Office Visit".into(),
            patient_label: "Patient A".into(),
            facts: vec![],
            citation_display: String::new(),
            confidence: 80,
            extras: Default::default(),
        };
        let entries = vec![entry("2024-01-05"), entry("2024-02-10")];
        let (start, end) = care_window_from_projection(&entries).unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());
    }
}
