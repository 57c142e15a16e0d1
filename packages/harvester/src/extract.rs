//! Record extraction from OAI-PMH responses.
//!
//! Endpoint families wrap the same Dublin Core fields differently. The
//! layout is found by trial lookup on the response itself:
//!
//! 1. flat `pico:record` elements (not inside `oai:metadata`)
//! 2. flat `oai:record` elements carrying `dc:*` children directly
//! 3. nested `oai:record/oai:metadata/pico:record`
//! 4. nested `oai:record/oai:metadata/oai_dc:dc`
//!
//! The first layout that yields any element wins.

use roxmltree::{Document, Node};

use crate::types::Record;
use crate::xml::{element_children, get_raw_text, get_text, Namespaces};

/// OAI-PMH error code meaning "the request matched nothing".
pub const NO_RECORDS_MATCH: &str = "noRecordsMatch";

/// Shape in which a response carries its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLayout {
    /// `pico:record` with direct Dublin Core children.
    FlatPico,

    /// `oai:record` with direct Dublin Core children.
    FlatOai,

    /// `pico:record` wrapped in `oai:record/oai:metadata`.
    NestedPico,

    /// `oai_dc:dc` wrapped in `oai:record/oai:metadata`.
    NestedOaiDc,

    /// No records on this page.
    Empty,
}

/// An `<error>` element returned by the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolError {
    pub code: String,
    pub message: String,
}

impl ProtocolError {
    /// Whether this error only signals an empty result.
    #[must_use]
    pub fn is_no_records_match(&self) -> bool {
        self.code == NO_RECORDS_MATCH
    }
}

/// Detect the record layout of a response.
pub fn detect_layout(doc: &Document<'_>, ns: &Namespaces) -> RecordLayout {
    record_nodes(doc, ns).0
}

/// Extract every record of a `ListRecords` response, in document order.
///
/// Missing fields are left empty; this never fails.
pub fn extract_records(doc: &Document<'_>, ns: &Namespaces) -> Vec<Record> {
    let (layout, nodes) = record_nodes(doc, ns);
    tracing::trace!(?layout, count = nodes.len(), "Resolved record layout");

    nodes
        .into_iter()
        .map(|node| record_from_fields(node, ns))
        .collect()
}

/// Extract one identifier-only record per header of a `ListIdentifiers`
/// response.
pub fn extract_headers(doc: &Document<'_>, ns: &Namespaces) -> Vec<Record> {
    ns.descendants_ns(doc.root_element(), "oai:header")
        .map(|header| {
            let identifier = ns
                .find_child_ns(header, "oai:identifier")
                .map(get_text)
                .unwrap_or_default();
            Record::with_identifier(identifier)
        })
        .collect()
}

/// Continuation token of a list response.
///
/// An absent element and an empty one both mean "last page".
pub fn resumption_token(doc: &Document<'_>, ns: &Namespaces) -> Option<String> {
    ns.descendants_ns(doc.root_element(), "oai:resumptionToken")
        .next()
        .map(get_text)
        .filter(|token| !token.is_empty())
}

/// The protocol error reported by the endpoint, if any.
pub fn protocol_error(doc: &Document<'_>, ns: &Namespaces) -> Option<ProtocolError> {
    let root = doc.root_element();
    ns.find_child_ns(root, "oai:error").map(|error| ProtocolError {
        code: error.attribute("code").unwrap_or_default().to_string(),
        message: get_text(error),
    })
}

fn record_nodes<'a, 'input>(
    doc: &'a Document<'input>,
    ns: &Namespaces,
) -> (RecordLayout, Vec<Node<'a, 'input>>) {
    let root = doc.root_element();

    let flat_pico: Vec<_> = ns
        .descendants_ns(root, "pico:record")
        .filter(|node| !ns.has_ancestor_ns(*node, "oai:metadata"))
        .collect();
    if !flat_pico.is_empty() {
        return (RecordLayout::FlatPico, flat_pico);
    }

    let dc_uri = ns.uri("dc");
    let flat_oai: Vec<_> = ns
        .descendants_ns(root, "oai:record")
        .filter(|node| {
            element_children(*node).any(|child| {
                dc_uri.is_some() && child.tag_name().namespace() == dc_uri
            })
        })
        .collect();
    if !flat_oai.is_empty() {
        return (RecordLayout::FlatOai, flat_oai);
    }

    let nested = |path: &str| -> Vec<Node<'a, 'input>> {
        ns.descendants_ns(root, "oai:record")
            .filter_map(|record| ns.find_path_ns(record, path))
            .collect()
    };

    let nested_pico = nested("oai:metadata/pico:record");
    if !nested_pico.is_empty() {
        return (RecordLayout::NestedPico, nested_pico);
    }

    let nested_dc = nested("oai:metadata/oai_dc:dc");
    if !nested_dc.is_empty() {
        return (RecordLayout::NestedOaiDc, nested_dc);
    }

    (RecordLayout::Empty, Vec::new())
}

fn record_from_fields(node: Node<'_, '_>, ns: &Namespaces) -> Record {
    let first_text = |qname: &str| {
        ns.find_child_ns(node, qname)
            .map(get_raw_text)
            .unwrap_or_default()
    };
    let all_texts = |qname: &str| -> Vec<String> {
        ns.find_children_ns(node, qname).map(get_raw_text).collect()
    };

    Record {
        identifier: first_text("dc:identifier"),
        title: first_text("dc:title"),
        description: first_text("dc:description"),
        types: all_texts("dc:type"),
        subjects: all_texts("dc:subject"),
    }
}
