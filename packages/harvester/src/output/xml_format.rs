//! Namespace-free XML output.
//!
//! Same field vocabulary as the CSV output, with one element per value
//! for `type` and `subject` instead of a joined cell.

use std::path::Path;

use quick_xml::escape::escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::write_atomic;
use crate::error::Result;
use crate::types::Record;
use crate::xml::{
    element_children, find_child, find_children, get_raw_text, has_tag, parse_document,
};

/// First line of every generated document.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>"#;

const ROOT_TAG: &str = "ListRecords";
const RECORD_TAG: &str = "record";

/// Generate the XML document for `records`.
///
/// When `stylesheet` is given, an `xml-stylesheet` processing instruction
/// referencing it follows the declaration.
///
/// # Examples
/// ```
/// use oai_harvester::output::generate_xml;
/// use oai_harvester::types::Record;
///
/// let record = Record {
///     identifier: "1".to_string(),
///     subjects: vec!["Art".to_string(), "History".to_string()],
///     ..Record::default()
/// };
/// let xml = generate_xml(&[record], None).unwrap();
/// assert!(xml.contains("<subject>Art</subject>\n    <subject>History</subject>"));
/// ```
pub fn generate_xml(records: &[Record], stylesheet: Option<&str>) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Start(BytesStart::new(ROOT_TAG)))?;
    for record in records {
        write_record(&mut writer, record)?;
    }
    writer.write_event(Event::End(BytesEnd::new(ROOT_TAG)))?;

    let body = String::from_utf8_lossy(&writer.into_inner()).into_owned();

    let mut document = String::with_capacity(body.len() + 128);
    document.push_str(XML_DECLARATION);
    document.push('\n');
    if let Some(href) = stylesheet {
        document.push_str(&format!(
            r#"<?xml-stylesheet type="text/xsl" href="{}"?>"#,
            escape(href)
        ));
        document.push('\n');
    }
    document.push_str(&body);
    document.push('\n');

    Ok(document)
}

/// Save records as a pretty-printed XML file.
pub fn save_xml(records: &[Record], path: &Path, stylesheet: Option<&str>) -> Result<()> {
    let content = generate_xml(records, stylesheet)?;
    write_atomic(path, content.as_bytes())?;

    tracing::info!(path = %path.display(), records = records.len(), "Saved XML");
    Ok(())
}

/// Read records back from a document produced by [`generate_xml`].
pub fn read_xml_records(xml: &str) -> Result<Vec<Record>> {
    let doc = parse_document(xml)?;
    let root = doc.root_element();

    let records = element_children(root)
        .filter(|node| has_tag(*node, RECORD_TAG))
        .map(|node| {
            let text_of = |tag: &str| find_child(node, tag).map(get_raw_text).unwrap_or_default();
            Record {
                identifier: text_of("identifier"),
                title: text_of("title"),
                description: text_of("description"),
                types: find_children(node, "type").map(get_raw_text).collect(),
                subjects: find_children(node, "subject").map(get_raw_text).collect(),
            }
        })
        .collect();

    Ok(records)
}

fn write_record(writer: &mut Writer<Vec<u8>>, record: &Record) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(RECORD_TAG)))?;

    write_field(writer, "identifier", &record.identifier)?;
    write_field(writer, "title", &record.title)?;
    write_field(writer, "description", &record.description)?;
    for value in &record.types {
        write_field(writer, "type", value)?;
    }
    for value in &record.subjects {
        write_field(writer, "subject", value)?;
    }

    writer.write_event(Event::End(BytesEnd::new(RECORD_TAG)))?;
    Ok(())
}

fn write_field(writer: &mut Writer<Vec<u8>>, tag: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new(tag)))?;
        return Ok(());
    }

    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}
