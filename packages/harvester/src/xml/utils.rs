//! Local-name helpers for navigating namespace-free DOM trees.
//!
//! Used on documents this crate wrote itself. Harvested responses go
//! through [`super::Namespaces`] instead, so that schema variants stay
//! distinguishable.

use roxmltree::Node;

/// Get the tag name without namespace.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use oai_harvester::xml::get_tag_name;
///
/// let xml = r#"<oai:record xmlns:oai="http://www.openarchives.org/OAI/2.0/"/>"#;
/// let doc = Document::parse(xml).unwrap();
/// assert_eq!(get_tag_name(doc.root_element()), "record");
/// ```
pub fn get_tag_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Check if a node is an element with a specific local name.
pub fn has_tag(node: Node<'_, '_>, tag: &str) -> bool {
    node.is_element() && get_tag_name(node) == tag
}

/// Find the first child element with the given local name.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use oai_harvester::xml::find_child;
///
/// let xml = r#"<record><title>Anfora</title></record>"#;
/// let doc = Document::parse(xml).unwrap();
///
/// assert!(find_child(doc.root_element(), "title").is_some());
/// assert!(find_child(doc.root_element(), "subject").is_none());
/// ```
pub fn find_child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| has_tag(*child, tag))
}

/// Find all child elements with the given local name.
pub fn find_children<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |child| has_tag(*child, tag))
}

/// Get all element children of a node.
pub fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|child| child.is_element())
}

/// Get the text content of a node, trimmed.
///
/// Returns an empty string if the node has no text.
pub fn get_text(node: Node<'_, '_>) -> String {
    node.text()
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Get the text content of a node exactly as written.
///
/// Record values keep their surrounding whitespace; only identifiers and
/// protocol values go through [`get_text`].
pub fn get_raw_text(node: Node<'_, '_>) -> String {
    node.text().map(str::to_string).unwrap_or_default()
}
