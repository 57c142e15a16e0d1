//! Namespace-stripping serialization.
//!
//! Rewrites every element and attribute name to its local name and drops
//! namespace declarations. Only the output path uses this; extraction
//! must stay namespace-exact.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use roxmltree::Node;

use crate::error::Result;

/// Serialize `node` (or, for the document root, its root element) with
/// namespaces stripped, pretty-printed with two-space indentation.
///
/// Whitespace-only text nodes, comments and processing instructions are
/// dropped.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use oai_harvester::xml::strip_namespaces;
///
/// let xml = r#"<oai:Identify xmlns:oai="http://www.openarchives.org/OAI/2.0/">
///   <oai:repositoryName>Museo</oai:repositoryName>
/// </oai:Identify>"#;
/// let doc = Document::parse(xml).unwrap();
///
/// assert_eq!(
///     strip_namespaces(doc.root()).unwrap(),
///     "<Identify>\n  <repositoryName>Museo</repositoryName>\n</Identify>"
/// );
/// ```
pub fn strip_namespaces(node: Node<'_, '_>) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    if node.is_root() {
        for child in node.children().filter(|c| c.is_element()) {
            write_stripped(&mut writer, child)?;
        }
    } else {
        write_stripped(&mut writer, node)?;
    }

    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

fn write_stripped(writer: &mut Writer<Vec<u8>>, node: Node<'_, '_>) -> Result<()> {
    let name = node.tag_name().name();
    let mut start = BytesStart::new(name);

    let mut seen: Vec<&str> = Vec::new();
    for attr in node.attributes() {
        // Local names can collide once prefixes are gone; first one wins.
        if seen.contains(&attr.name()) {
            continue;
        }
        seen.push(attr.name());
        start.push_attribute((attr.name(), attr.value()));
    }

    let has_content = node.children().any(|c| c.is_element() || is_content_text(c));
    if !has_content {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in node.children() {
        if child.is_element() {
            write_stripped(writer, child)?;
        } else if is_content_text(child) {
            if let Some(text) = child.text() {
                writer.write_event(Event::Text(BytesText::new(text.trim())))?;
            }
        }
    }
    writer.write_event(Event::End(BytesEnd::new(name)))?;

    Ok(())
}

fn is_content_text(node: Node<'_, '_>) -> bool {
    node.is_text() && node.text().is_some_and(|t| !t.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use roxmltree::Document;

    #[test]
    fn test_strip_element_and_attribute_prefixes() {
        let xml = r#"<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/"
            xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
            xsi:schemaLocation="http://www.openarchives.org/OAI/2.0/ schema.xsd">
          <request verb="ListSets">https://example.org/oai</request>
          <ListSets>
            <set><setSpec>museums</setSpec><setName>Musei</setName></set>
          </ListSets>
        </OAI-PMH>"#;
        let doc = Document::parse(xml).unwrap();

        let expected = concat!(
            "<OAI-PMH schemaLocation=\"http://www.openarchives.org/OAI/2.0/ schema.xsd\">\n",
            "  <request verb=\"ListSets\">https://example.org/oai</request>\n",
            "  <ListSets>\n",
            "    <set>\n",
            "      <setSpec>museums</setSpec>\n",
            "      <setName>Musei</setName>\n",
            "    </set>\n",
            "  </ListSets>\n",
            "</OAI-PMH>"
        );
        assert_eq!(strip_namespaces(doc.root()).unwrap(), expected);
    }

    #[test]
    fn test_strip_escapes_text() {
        let xml = r#"<d:title xmlns:d="http://purl.org/dc/elements/1.1/">Arte &amp; Storia</d:title>"#;
        let doc = Document::parse(xml).unwrap();
        assert_eq!(
            strip_namespaces(doc.root_element()).unwrap(),
            "<title>Arte &amp; Storia</title>"
        );
    }

    #[test]
    fn test_strip_empty_element() {
        let xml = r#"<a:resumptionToken xmlns:a="http://www.openarchives.org/OAI/2.0/" cursor="0"/>"#;
        let doc = Document::parse(xml).unwrap();
        assert_eq!(
            strip_namespaces(doc.root_element()).unwrap(),
            "<resumptionToken cursor=\"0\"/>"
        );
    }
}
