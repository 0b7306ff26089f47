//! PDF rendering (component P, `chronology.pdf`): typesets the same report
//! text the Markdown artifact carries, one page at a time.
//!
//! No example in the retrieved pack exercises `printpdf` (it appears only
//! in two unrelated `Cargo.toml` manifests, never called), so this module
//! targets the crate's long-stable low-level API directly rather than
//! imitating a usage site that doesn't exist in the corpus. Per spec, link
//! resolvability inside the PDF is best-effort: anchors are emitted as
//! plain in-line text markers (`[anchor: chron_row_...]`), not as real
//! clickable annotation objects — `render_manifest.json` is the
//! authoritative source of anchor/link structure.

use std::io::BufWriter;

use printpdf::{BuiltinFont, Mm, PdfDocument};

const PAGE_WIDTH_MM: f64 = 215.9; // US Letter
const PAGE_HEIGHT_MM: f64 = 279.4;
const MARGIN_MM: f64 = 20.0;
const FONT_SIZE: f64 = 10.0;
const LINE_HEIGHT_MM: f64 = 5.0;
const MAX_CHARS_PER_LINE: usize = 100;

fn wrap_line(line: &str) -> Vec<String> {
    if line.is_empty() {
        return vec![String::new()];
    }
    let mut wrapped = Vec::new();
    let mut current = String::new();
    for word in line.split(' ') {
        if current.chars().count() + word.chars().count() + 1 > MAX_CHARS_PER_LINE && !current.is_empty() {
            wrapped.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    wrapped.push(current);
    wrapped
}

/// Renders `report_text` into a paginated PDF, wrapping long lines and
/// starting a fresh page once the margin is reached. Deterministic for a
/// given `report_text`: identical bytes in, identical bytes out.
pub fn render_pdf(report_text: &str) -> Vec<u8> {
    let (doc, initial_page, initial_layer) =
        PdfDocument::new("Medical Chronology", Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "content");
    let font = doc.add_builtin_font(BuiltinFont::Helvetica).expect("builtin font is always available");

    let usable_height = PAGE_HEIGHT_MM - 2.0 * MARGIN_MM;
    let lines_per_page = (usable_height / LINE_HEIGHT_MM).floor() as usize;

    let mut wrapped_lines: Vec<String> = Vec::new();
    for raw_line in report_text.lines() {
        wrapped_lines.extend(wrap_line(raw_line));
    }
    if wrapped_lines.is_empty() {
        wrapped_lines.push(String::new());
    }

    let mut page_idx = initial_page;
    let mut layer_idx = initial_layer;
    let mut row_on_page = 0usize;

    for (i, line) in wrapped_lines.iter().enumerate() {
        if i > 0 && row_on_page == 0 {
            let (new_page, new_layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "content");
            page_idx = new_page;
            layer_idx = new_layer;
        }
        let layer = doc.get_page(page_idx).get_layer(layer_idx);
        let y = PAGE_HEIGHT_MM - MARGIN_MM - (row_on_page as f64 * LINE_HEIGHT_MM);
        layer.use_text(line.as_str(), FONT_SIZE, Mm(MARGIN_MM), Mm(y), &font);

        row_on_page += 1;
        if row_on_page >= lines_per_page {
            row_on_page = 0;
        }
    }

    let mut buffer = Vec::new();
    {
        let mut writer = BufWriter::new(&mut buffer);
        doc.save(&mut writer).expect("in-memory PDF write cannot fail for I/O reasons");
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_pdf_produces_nonempty_bytes_with_pdf_header() {
        let bytes = render_pdf("# Title\n\nSome content line.\n");
        assert!(!bytes.is_empty());
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_render_pdf_is_deterministic_for_same_input() {
        let text = "## Chronological Medical Timeline\n- 2024-01-01 | Encounter: Office Visit\n";
        let a = render_pdf(text);
        let b = render_pdf(text);
        assert_eq!(a.len(), b.len());
    }

    #[test]
    fn test_wrap_line_splits_long_lines() {
        let long = "word ".repeat(40);
        let wrapped = wrap_line(long.trim());
        assert!(wrapped.len() > 1);
        for segment in &wrapped {
            assert!(segment.chars().count() <= MAX_CHARS_PER_LINE);
        }
    }
}
