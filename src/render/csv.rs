//! CSV rendering (component P, `chronology.csv`): one row per projection
//! entry. Ported from `csv_render.py::generate_csv_from_projection` —
//! behavior preserved, including the exact column order.

use csv::Writer;

use crate::model::ChronologyProjectionEntry;

/// Renders `chronology.csv`: `event_id,date,provider,type,facts,source`.
pub fn generate_csv_from_projection(entries: &[ChronologyProjectionEntry]) -> Vec<u8> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(["event_id", "date", "provider", "type", "facts", "source"]).ok();
    for entry in entries {
        writer
            .write_record([
                entry.event_id.as_str(),
                entry.date_display.as_str(),
                entry.provider_display.as_str(),
                entry.event_type_display.as_str(),
                entry.facts.join("; ").as_str(),
                entry.citation_display.as_str(),
            ])
            .ok();
    }
    writer.into_inner().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> ChronologyProjectionEntry {
        ChronologyProjectionEntry {
            event_id: "e1".into(),
            date_display: "2024-01-01 (time not documented)".into(),
            provider_display: "St. Mary Hospital".into(),
            event_type_display: "Office Visit".into(),
            patient_label: "Patient A".into(),
            facts: vec!["Assessment: back pain".into()],
            citation_display: "[packet.pdf p. 3]".into(),
            confidence: 80,
            extras: Default::default(),
        }
    }

    #[test]
    fn test_csv_has_header_and_one_row_per_entry() {
        let bytes = generate_csv_from_projection(&[entry()]);
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "event_id,date,provider,type,facts,source");
        assert!(lines.next().unwrap().contains("e1"));
    }

    #[test]
    fn test_empty_projection_produces_header_only() {
        let bytes = generate_csv_from_projection(&[]);
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
