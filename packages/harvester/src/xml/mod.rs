//! Namespace-tolerant XML reading.
//!
//! - [`parse_document`] turns a response body into a DOM tree.
//! - [`Namespaces`] resolves `prefix:local` lookups by namespace URI.
//! - [`strip_namespaces`] serializes a tree with local names only.
//! - The local-name helpers read documents this crate wrote itself.

mod namespace;
mod strip;
mod utils;

use roxmltree::Document;

pub use namespace::{Namespaces, DCTERMS_NS, DC_NS, OAI_DC_NS, OAI_NS, PICO_NS};
pub use strip::strip_namespaces;
pub use utils::{
    element_children, find_child, find_children, get_raw_text, get_tag_name, get_text, has_tag,
};

/// Parse an XML body into a DOM tree.
///
/// A leading byte order mark is ignored.
///
/// # Examples
/// ```
/// use oai_harvester::xml::parse_document;
///
/// assert!(parse_document("<OAI-PMH/>").is_ok());
/// assert!(parse_document("<OAI-PMH>").is_err());
/// ```
pub fn parse_document(body: &str) -> Result<Document<'_>, roxmltree::Error> {
    Document::parse(body.strip_prefix('\u{feff}').unwrap_or(body))
}
