//! Namespace-qualified element lookup.
//!
//! Endpoints bind the same logical fields to different prefixes, so lookups
//! go through an explicit prefix table and compare namespace URIs, never the
//! prefixes written in the document.

use std::collections::HashMap;

use roxmltree::Node;

/// OAI-PMH protocol namespace.
pub const OAI_NS: &str = "http://www.openarchives.org/OAI/2.0/";

/// Dublin Core elements namespace.
pub const DC_NS: &str = "http://purl.org/dc/elements/1.1/";

/// PICO application profile namespace.
pub const PICO_NS: &str = "http://purl.org/pico/1.0/";

/// Dublin Core terms namespace.
pub const DCTERMS_NS: &str = "http://purl.org/dc/terms/";

/// OAI Dublin Core container namespace.
pub const OAI_DC_NS: &str = "http://www.openarchives.org/OAI/2.0/oai_dc/";

/// Immutable prefix → namespace URI table.
#[derive(Debug, Clone, Default)]
pub struct Namespaces {
    uris: HashMap<String, String>,
}

/// A qualified name resolved against a [`Namespaces`] table.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ResolvedName {
    uri: Option<String>,
    local: String,
}

impl ResolvedName {
    fn matches(&self, node: Node<'_, '_>) -> bool {
        match &self.uri {
            Some(uri) => {
                node.is_element()
                    && node.tag_name().name() == self.local
                    && node.tag_name().namespace() == Some(uri.as_str())
            }
            None => false,
        }
    }
}

impl Namespaces {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The table used for OAI-PMH responses: `oai`, `dc`, `pico`,
    /// `dcterms` and `oai_dc`.
    #[must_use]
    pub fn oai_pmh() -> Self {
        Self::new()
            .with("oai", OAI_NS)
            .with("dc", DC_NS)
            .with("pico", PICO_NS)
            .with("dcterms", DCTERMS_NS)
            .with("oai_dc", OAI_DC_NS)
    }

    /// Add or replace a prefix binding.
    #[must_use]
    pub fn with(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.uris.insert(prefix.into(), uri.into());
        self
    }

    /// Namespace URI bound to `prefix`.
    pub fn uri(&self, prefix: &str) -> Option<&str> {
        self.uris.get(prefix).map(String::as_str)
    }

    /// Split `prefix:local` and resolve the prefix.
    ///
    /// Unknown prefixes and unprefixed names resolve to a name that never
    /// matches.
    fn resolve(&self, qname: &str) -> ResolvedName {
        match qname.split_once(':') {
            Some((prefix, local)) => ResolvedName {
                uri: self.uri(prefix).map(str::to_string),
                local: local.to_string(),
            },
            None => ResolvedName {
                uri: None,
                local: qname.to_string(),
            },
        }
    }

    /// Check if a node is the element `qname` (e.g. `"dc:title"`).
    ///
    /// # Examples
    /// ```
    /// use roxmltree::Document;
    /// use oai_harvester::xml::Namespaces;
    ///
    /// let xml = r#"<x:title xmlns:x="http://purl.org/dc/elements/1.1/">Anfora</x:title>"#;
    /// let doc = Document::parse(xml).unwrap();
    /// let ns = Namespaces::oai_pmh();
    ///
    /// assert!(ns.has_qname(doc.root_element(), "dc:title"));
    /// assert!(!ns.has_qname(doc.root_element(), "pico:title"));
    /// ```
    pub fn has_qname(&self, node: Node<'_, '_>, qname: &str) -> bool {
        self.resolve(qname).matches(node)
    }

    /// First child element named `qname`.
    pub fn find_child_ns<'a, 'input>(
        &self,
        node: Node<'a, 'input>,
        qname: &str,
    ) -> Option<Node<'a, 'input>> {
        let name = self.resolve(qname);
        node.children().find(|child| name.matches(*child))
    }

    /// All child elements named `qname`, in document order.
    pub fn find_children_ns<'a, 'input>(
        &self,
        node: Node<'a, 'input>,
        qname: &str,
    ) -> impl Iterator<Item = Node<'a, 'input>> {
        let name = self.resolve(qname);
        node.children().filter(move |child| name.matches(*child))
    }

    /// All descendant elements named `qname`, in document order.
    ///
    /// Includes `node` itself when it matches.
    pub fn descendants_ns<'a, 'input>(
        &self,
        node: Node<'a, 'input>,
        qname: &str,
    ) -> impl Iterator<Item = Node<'a, 'input>> {
        let name = self.resolve(qname);
        node.descendants().filter(move |n| name.matches(*n))
    }

    /// Follow a slash-separated path of qualified names from `node`,
    /// taking the first matching child at every step.
    ///
    /// # Examples
    /// ```
    /// use roxmltree::Document;
    /// use oai_harvester::xml::Namespaces;
    ///
    /// let xml = r#"<record xmlns="http://www.openarchives.org/OAI/2.0/">
    ///   <metadata><p:record xmlns:p="http://purl.org/pico/1.0/"/></metadata>
    /// </record>"#;
    /// let doc = Document::parse(xml).unwrap();
    /// let ns = Namespaces::oai_pmh();
    ///
    /// assert!(ns.find_path_ns(doc.root_element(), "oai:metadata/pico:record").is_some());
    /// assert!(ns.find_path_ns(doc.root_element(), "oai:header/oai:identifier").is_none());
    /// ```
    pub fn find_path_ns<'a, 'input>(
        &self,
        node: Node<'a, 'input>,
        path: &str,
    ) -> Option<Node<'a, 'input>> {
        path.split('/')
            .try_fold(node, |current, step| self.find_child_ns(current, step))
    }

    /// Check if any ancestor of `node` (excluding itself) is named `qname`.
    pub fn has_ancestor_ns(&self, node: Node<'_, '_>, qname: &str) -> bool {
        let name = self.resolve(qname);
        node.ancestors().skip(1).any(|n| name.matches(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roxmltree::Document;

    const RESPONSE: &str = r#"<OAI-PMH xmlns="http://www.openarchives.org/OAI/2.0/"
        xmlns:dc="http://purl.org/dc/elements/1.1/">
      <ListRecords>
        <record><dc:title>One</dc:title><dc:subject>A</dc:subject><dc:subject>B</dc:subject></record>
        <record><dc:title>Two</dc:title></record>
      </ListRecords>
    </OAI-PMH>"#;

    #[test]
    fn test_oai_pmh_table() {
        let ns = Namespaces::oai_pmh();
        assert_eq!(ns.uri("oai"), Some(OAI_NS));
        assert_eq!(ns.uri("dc"), Some(DC_NS));
        assert_eq!(ns.uri("pico"), Some(PICO_NS));
        assert_eq!(ns.uri("dcterms"), Some(DCTERMS_NS));
        assert_eq!(ns.uri("oai_dc"), Some(OAI_DC_NS));
        assert_eq!(ns.uri("marc"), None);
    }

    #[test]
    fn test_default_namespace_matches_prefix() {
        let doc = Document::parse(RESPONSE).unwrap();
        let ns = Namespaces::oai_pmh();
        assert!(ns.has_qname(doc.root_element(), "oai:OAI-PMH"));
    }

    #[test]
    fn test_unprefixed_and_unknown_names_never_match() {
        let doc = Document::parse(RESPONSE).unwrap();
        let ns = Namespaces::oai_pmh();
        assert!(!ns.has_qname(doc.root_element(), "OAI-PMH"));
        assert!(!ns.has_qname(doc.root_element(), "foo:OAI-PMH"));
    }

    #[test]
    fn test_wrong_namespace_does_not_match() {
        let xml = r#"<title xmlns="http://purl.org/dc/terms/">x</title>"#;
        let doc = Document::parse(xml).unwrap();
        let ns = Namespaces::oai_pmh();
        assert!(!ns.has_qname(doc.root_element(), "dc:title"));
        assert!(ns.has_qname(doc.root_element(), "dcterms:title"));
    }

    #[test]
    fn test_descendants_and_children() {
        let doc = Document::parse(RESPONSE).unwrap();
        let ns = Namespaces::oai_pmh();

        let records: Vec<_> = ns.descendants_ns(doc.root_element(), "oai:record").collect();
        assert_eq!(records.len(), 2);

        let subjects: Vec<_> = ns
            .find_children_ns(records[0], "dc:subject")
            .filter_map(|n| n.text())
            .collect();
        assert_eq!(subjects, vec!["A", "B"]);

        let title = ns.find_child_ns(records[1], "dc:title").unwrap();
        assert_eq!(title.text(), Some("Two"));
        assert!(ns.find_child_ns(records[1], "dc:subject").is_none());
    }

    #[test]
    fn test_has_ancestor_ns() {
        let doc = Document::parse(RESPONSE).unwrap();
        let ns = Namespaces::oai_pmh();
        let record = ns.descendants_ns(doc.root_element(), "oai:record").next().unwrap();

        assert!(ns.has_ancestor_ns(record, "oai:ListRecords"));
        assert!(!ns.has_ancestor_ns(record, "oai:record"));
    }

    #[test]
    fn test_custom_binding() {
        let xml = r#"<m:record xmlns:m="urn:example:museum"/>"#;
        let doc = Document::parse(xml).unwrap();
        let ns = Namespaces::new().with("museum", "urn:example:museum");
        assert!(ns.has_qname(doc.root_element(), "museum:record"));
    }
}
