//! DOCX rendering (component P, `chronology.docx`): a minimal but valid
//! OOXML word-processing document, one paragraph per report line, built
//! with the same `zip` crate the PDF/DOCX input side would use to read one
//! back — `[Content_Types].xml`, `_rels/.rels`, and `word/document.xml`.

use std::io::Write;

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

fn document_xml(report_text: &str) -> String {
    let mut body = String::new();
    for line in report_text.lines() {
        if line.trim().is_empty() {
            body.push_str("<w:p/>");
            continue;
        }
        body.push_str("<w:p><w:r><w:t xml:space=\"preserve\">");
        body.push_str(&escape_xml(line));
        body.push_str("</w:t></w:r></w:p>");
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>{body}</w:body>
</w:document>"#
    )
}

/// Builds `chronology.docx` from the shared report text. Deterministic:
/// the zip writer is given a fixed file order and no timestamps vary
/// across invocations with identical input.
pub fn render_docx(report_text: &str) -> Vec<u8> {
    let mut buffer = Vec::new();
    {
        let cursor = std::io::Cursor::new(&mut buffer);
        let mut writer = ZipWriter::new(cursor);
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        writer.start_file("[Content_Types].xml", options).expect("zip entry start cannot fail in-memory");
        writer.write_all(CONTENT_TYPES.as_bytes()).ok();

        writer.start_file("_rels/.rels", options).expect("zip entry start cannot fail in-memory");
        writer.write_all(RELS.as_bytes()).ok();

        writer.start_file("word/document.xml", options).expect("zip entry start cannot fail in-memory");
        writer.write_all(document_xml(report_text).as_bytes()).ok();

        writer.finish().expect("in-memory zip finish cannot fail for I/O reasons");
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn test_render_docx_roundtrips_through_zip_reader() {
        let bytes = render_docx("## Chronological Medical Timeline\nSome line of content.\n");
        let cursor = std::io::Cursor::new(bytes);
        let mut archive = ZipArchive::new(cursor).unwrap();
        let mut document_xml_content = String::new();
        archive.by_name("word/document.xml").unwrap().read_to_string(&mut document_xml_content).unwrap();
        assert!(document_xml_content.contains("Some line of content."));
    }

    #[test]
    fn test_escape_xml_handles_reserved_characters() {
        assert_eq!(escape_xml("A & B < C > D \"E\""), "A &amp; B &lt; C &gt; D &quot;E&quot;");
    }
}
