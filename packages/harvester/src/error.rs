//! Error types for the harvester.
//!
//! Uses the dual-error pattern: `HarvesterError` for library consumers
//! with detailed request context, and `ConfigError` for input validation
//! that happens before any request is made.

use std::path::PathBuf;

use thiserror::Error;

use crate::decode::DecodeError;
use crate::types::Verb;

/// Invalid harvest input, detected before contacting the endpoint.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A paginating verb was requested without a set name.
    #[error("The set name is required for the '{verb}' verb")]
    MissingSet { verb: Verb },

    /// Endpoint is not an absolute http(s) URL.
    #[error("Invalid endpoint URL: '{0}'. Expected an absolute http(s) URL")]
    InvalidEndpoint(String),

    /// Endpoint alias not present in the known endpoint table.
    #[error("Unknown endpoint '{0}'. Use a known alias or an absolute URL")]
    UnknownEndpoint(String),

    /// Verb is neither an OAI-PMH verb name nor a menu key.
    #[error("Unknown verb '{0}'. Expected Identify, ListIdentifiers, ListMetadataFormats, ListSets, ListRecords or 1-5")]
    UnknownVerb(String),

    /// A record limit of zero would never fetch anything.
    #[error("Record limit must be at least 1")]
    EmptyRecordLimit,

    /// Record collection was asked for a verb that returns a single document.
    #[error("The '{verb}' verb returns a document, not a record list")]
    NotPaginated { verb: Verb },
}

/// Main error type for the harvester library.
#[derive(Debug, Error)]
pub enum HarvesterError {
    /// Invalid request configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection, timeout or other send failure.
    #[error("Network error for {verb} at {endpoint}: {source}")]
    Network {
        endpoint: String,
        verb: Verb,
        #[source]
        source: reqwest::Error,
    },

    /// Endpoint answered with a non-success status.
    #[error("HTTP {code} for {verb} at {endpoint}: {body}")]
    HttpStatus {
        endpoint: String,
        verb: Verb,
        code: u16,
        body: String,
    },

    /// Response body exceeded the configured size limit.
    #[error("Response from {endpoint} exceeds the maximum size of {limit} bytes")]
    ResponseTooLarge { endpoint: String, limit: u64 },

    /// Response body cannot be decoded in its declared encoding.
    #[error("Decoding failed for {verb} at {endpoint}: {source}")]
    Decode {
        endpoint: String,
        verb: Verb,
        #[source]
        source: DecodeError,
    },

    /// Response body is not well-formed XML.
    #[error("XML parsing failed for {verb} at {endpoint}: {source}")]
    XmlParse {
        endpoint: String,
        verb: Verb,
        #[source]
        source: roxmltree::Error,
    },

    /// A local XML document is not well-formed.
    #[error("XML parsing failed: {0}")]
    XmlDocument(#[from] roxmltree::Error),

    /// The endpoint reported an OAI-PMH protocol error.
    #[error("OAI-PMH error '{code}' for {verb} at {endpoint}: {message}")]
    OaiProtocol {
        endpoint: String,
        verb: Verb,
        code: String,
        message: String,
    },

    /// Reading or writing a file failed.
    #[error("IO error for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// In-memory IO failure while serializing.
    #[error("IO error: {0}")]
    Serialize(#[from] std::io::Error),

    /// CSV encoding or decoding failed.
    #[error("CSV error for {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl HarvesterError {
    /// Wrap an IO error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, HarvesterError>;
