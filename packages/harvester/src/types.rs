//! Core data types for the harvester.
//!
//! These types describe a harvest request and the normalized metadata
//! record extracted from every OAI-PMH response schema.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_METADATA_PREFIX;
use crate::error::ConfigError;

/// OAI-PMH protocol verbs supported by the harvester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verb {
    /// Repository self-description.
    Identify,

    /// Record headers only (paginated).
    ListIdentifiers,

    /// Metadata formats offered by the repository.
    ListMetadataFormats,

    /// Set hierarchy of the repository.
    ListSets,

    /// Full records (paginated).
    ListRecords,
}

impl Verb {
    /// All verbs, in legacy menu order.
    pub const ALL: [Verb; 5] = [
        Verb::Identify,
        Verb::ListIdentifiers,
        Verb::ListMetadataFormats,
        Verb::ListSets,
        Verb::ListRecords,
    ];

    /// Protocol name sent as the `verb` query parameter.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identify => "Identify",
            Self::ListIdentifiers => "ListIdentifiers",
            Self::ListMetadataFormats => "ListMetadataFormats",
            Self::ListSets => "ListSets",
            Self::ListRecords => "ListRecords",
        }
    }

    /// Whether responses to this verb are split by resumption tokens.
    #[must_use]
    pub fn paginates(&self) -> bool {
        matches!(self, Self::ListRecords | Self::ListIdentifiers)
    }

    /// Whether a harvest with this verb needs a set name.
    #[must_use]
    pub fn requires_set(&self) -> bool {
        self.paginates()
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = ConfigError;

    /// Parse a verb from its protocol name (case-insensitive) or from the
    /// numeric menu key `1`..`5`.
    ///
    /// # Examples
    /// ```
    /// use oai_harvester::types::Verb;
    ///
    /// assert_eq!("ListRecords".parse::<Verb>().unwrap(), Verb::ListRecords);
    /// assert_eq!("listsets".parse::<Verb>().unwrap(), Verb::ListSets);
    /// assert_eq!("5".parse::<Verb>().unwrap(), Verb::ListRecords);
    /// assert!("Harvest".parse::<Verb>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(key) = trimmed.parse::<usize>() {
            return key
                .checked_sub(1)
                .and_then(|i| Self::ALL.get(i).copied())
                .ok_or_else(|| ConfigError::UnknownVerb(s.to_string()));
        }

        Self::ALL
            .iter()
            .copied()
            .find(|verb| verb.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ConfigError::UnknownVerb(s.to_string()))
    }
}

/// One harvested metadata item.
///
/// Every field is empty when the source XML lacks it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Record identifier (`dc:identifier`).
    pub identifier: String,

    /// Title (`dc:title`).
    pub title: String,

    /// Free-text description (`dc:description`).
    pub description: String,

    /// Resource types (`dc:type`), in document order.
    #[serde(rename = "type")]
    pub types: Vec<String>,

    /// Subjects (`dc:subject`), in document order.
    #[serde(rename = "subject")]
    pub subjects: Vec<String>,
}

impl Record {
    /// Create a record with just an identifier.
    #[must_use]
    pub fn with_identifier(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Self::default()
        }
    }
}

/// One logical harvest operation against an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestRequest {
    /// Absolute endpoint URL.
    pub endpoint: String,

    /// Protocol verb.
    pub verb: Verb,

    /// Set to harvest (required for paginating verbs).
    pub set_name: Option<String>,

    /// Metadata format requested from the endpoint.
    pub metadata_prefix: String,

    /// Upper bound on records fetched across all pages.
    pub record_limit: Option<usize>,
}

impl HarvestRequest {
    /// Create a request with the default metadata prefix and no set or limit.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, verb: Verb) -> Self {
        Self {
            endpoint: endpoint.into(),
            verb,
            set_name: None,
            metadata_prefix: DEFAULT_METADATA_PREFIX.to_string(),
            record_limit: None,
        }
    }

    /// Set the set name.
    #[must_use]
    pub fn with_set(mut self, set_name: impl Into<String>) -> Self {
        self.set_name = Some(set_name.into());
        self
    }

    /// Set the metadata prefix.
    #[must_use]
    pub fn with_metadata_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.metadata_prefix = prefix.into();
        self
    }

    /// Cap the number of records fetched.
    #[must_use]
    pub fn with_record_limit(mut self, limit: usize) -> Self {
        self.record_limit = Some(limit);
        self
    }

    /// Check the request before any network traffic.
    pub fn validate(&self) -> Result<(), ConfigError> {
        crate::config::validate_endpoint(&self.endpoint)?;

        if self.verb.requires_set() && self.set_name.as_deref().unwrap_or_default().is_empty() {
            return Err(ConfigError::MissingSet { verb: self.verb });
        }

        if self.record_limit == Some(0) {
            return Err(ConfigError::EmptyRecordLimit);
        }

        Ok(())
    }
}

/// Result of a harvest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestOutcome {
    /// Records collected across all pages of a paginating verb.
    Records(Vec<Record>),

    /// Serialized response document of a single-request verb.
    Document(String),
}
