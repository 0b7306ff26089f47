use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    Embedded,
    Ocr,
    OcrCache,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    ClinicalNote,
    OperativeReport,
    ImagingReport,
    PtNote,
    Billing,
    Administrative,
    Lab,
    DischargeSummary,
    Other,
}

impl PageType {
    /// Tiebreak priority when two classes score equally, lowest index wins.
    pub fn tiebreak_order() -> [PageType; 9] {
        [
            PageType::Billing,
            PageType::ImagingReport,
            PageType::OperativeReport,
            PageType::PtNote,
            PageType::Lab,
            PageType::DischargeSummary,
            PageType::ClinicalNote,
            PageType::Administrative,
            PageType::Other,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::ClinicalNote => "clinical_note",
            PageType::OperativeReport => "operative_report",
            PageType::ImagingReport => "imaging_report",
            PageType::PtNote => "pt_note",
            PageType::Billing => "billing",
            PageType::Administrative => "administrative",
            PageType::Lab => "lab",
            PageType::DischargeSummary => "discharge_summary",
            PageType::Other => "other",
        }
    }
}

/// An optional bounding-box layout hint; zero means "whole page" / unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub page_id: String,
    pub source_document_id: String,
    /// 1-indexed, globally unique across all documents in the run.
    pub page_number: u32,
    pub text: String,
    pub text_source: TextSource,
    pub page_type: PageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_type_as_str() {
        assert_eq!(PageType::ImagingReport.as_str(), "imaging_report");
    }

    #[test]
    fn test_tiebreak_order_starts_with_billing() {
        assert_eq!(PageType::tiebreak_order()[0], PageType::Billing);
    }
}
