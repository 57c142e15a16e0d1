//! OAI-PMH Harvester - Collect metadata records from OAI-PMH repositories.
//!
//! This crate issues OAI-PMH requests against a repository endpoint,
//! follows resumption tokens until a list is exhausted, extracts Dublin
//! Core records and writes them out as CSV or namespace-free XML.
//!
//! # Example
//!
//! ```
//! use oai_harvester::{HarvestRequest, Verb};
//!
//! let request = HarvestRequest::new("https://example.org/oai", Verb::ListRecords)
//!     .with_set("museums")
//!     .with_record_limit(20);
//! assert!(request.validate().is_ok());
//!
//! // A list verb without a set is rejected before any request is sent
//! let request = HarvestRequest::new("https://example.org/oai", Verb::ListRecords);
//! assert!(request.validate().is_err());
//! ```
//!
//! # Architecture
//!
//! The harvester is organized into several modules:
//!
//! - [`config`]: Configuration constants and validation
//! - [`types`]: Core data types (Verb, Record, HarvestRequest)
//! - [`error`]: Error types and Result alias
//! - [`http`]: Transport trait and blocking HTTP client
//! - [`decode`]: Response body decoding by declared encoding
//! - [`xml`]: Namespace-aware XML lookup and namespace stripping
//! - [`extract`]: Record, header and resumption token extraction
//! - [`harvester`]: Resumption-token pagination engine
//! - [`output`]: CSV and XML serialization
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod config;
pub mod decode;
pub mod error;
pub mod extract;
pub mod harvester;
pub mod http;
pub mod output;
pub mod types;
pub mod xml;

// Re-export main types
pub use harvester::{Harvester, PageProgress};
pub use http::{HttpTransport, Transport, TransportSettings};

// Re-export commonly used items
pub use config::{resolve_endpoint, validate_endpoint};
pub use error::{ConfigError, HarvesterError, Result};
pub use types::{HarvestOutcome, HarvestRequest, Record, Verb};
