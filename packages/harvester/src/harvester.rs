//! Main harvester service: the resumption-token pagination engine.
//!
//! A harvest walks one list sequence strictly in server order. Request
//! N+1 needs the token found in response N, so pages are never fetched
//! concurrently. Any transport, XML or protocol failure ends the harvest.

use std::collections::HashSet;

use crate::error::{ConfigError, HarvesterError, Result};
use crate::extract::{extract_headers, extract_records, protocol_error, resumption_token};
use crate::http::{HttpTransport, QueryParams, Transport, TransportError, TransportSettings};
use crate::types::{HarvestOutcome, HarvestRequest, Record, Verb};
use crate::xml::{parse_document, strip_namespaces, Namespaces};

/// Progress report emitted after every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageProgress {
    /// 1-based page number.
    pub page: usize,
    /// Records extracted from this page.
    pub records_in_page: usize,
    /// Records accumulated so far (after any limit truncation).
    pub total_records: usize,
    /// Whether another page will be requested.
    pub has_more: bool,
}

/// Cursor of one running harvest.
#[derive(Debug, Default)]
struct HarvestState {
    resumption_token: Option<String>,
    accumulated: Vec<Record>,
    pages: usize,
    seen_tokens: HashSet<String>,
}

/// OAI-PMH harvester over a [`Transport`].
#[derive(Debug)]
pub struct Harvester<T> {
    transport: T,
    namespaces: Namespaces,
}

impl Harvester<HttpTransport> {
    /// Create a harvester that talks HTTP with the given settings.
    pub fn http(settings: TransportSettings) -> Result<Self> {
        Ok(Self::new(HttpTransport::new(settings)?, Namespaces::oai_pmh()))
    }
}

impl<T: Transport> Harvester<T> {
    /// Create a harvester with an explicit transport and namespace table.
    pub fn new(transport: T, namespaces: Namespaces) -> Self {
        Self {
            transport,
            namespaces,
        }
    }

    /// Run a harvest.
    ///
    /// Paginating verbs yield [`HarvestOutcome::Records`]; other verbs issue
    /// exactly one request and yield the namespace-stripped document.
    pub fn harvest(&self, request: &HarvestRequest) -> Result<HarvestOutcome> {
        if request.verb.paginates() {
            self.list_records(request).map(HarvestOutcome::Records)
        } else {
            self.fetch_document(request, true)
                .map(HarvestOutcome::Document)
        }
    }

    /// Collect all records of a paginating verb.
    pub fn list_records(&self, request: &HarvestRequest) -> Result<Vec<Record>> {
        self.harvest_with_progress(request, |_| {})
    }

    /// Collect all records of a paginating verb, reporting every page.
    pub fn harvest_with_progress<F>(&self, request: &HarvestRequest, mut on_page: F) -> Result<Vec<Record>>
    where
        F: FnMut(&PageProgress),
    {
        request.validate()?;
        if !request.verb.paginates() {
            return Err(ConfigError::NotPaginated { verb: request.verb }.into());
        }

        tracing::info!(
            endpoint = %request.endpoint,
            verb = %request.verb,
            set = request.set_name.as_deref().unwrap_or_default(),
            metadata_prefix = %request.metadata_prefix,
            limit = ?request.record_limit,
            "Starting harvest"
        );

        let mut state = HarvestState::default();

        loop {
            let params = match &state.resumption_token {
                None => initial_params(request),
                Some(token) => resumption_params(request.verb, token),
            };

            let body = self.fetch(request, &params)?;
            let doc = parse_document(&body).map_err(|source| HarvesterError::XmlParse {
                endpoint: request.endpoint.clone(),
                verb: request.verb,
                source,
            })?;
            state.pages += 1;

            if let Some(error) = protocol_error(&doc, &self.namespaces) {
                if !error.is_no_records_match() {
                    return Err(HarvesterError::OaiProtocol {
                        endpoint: request.endpoint.clone(),
                        verb: request.verb,
                        code: error.code,
                        message: error.message,
                    });
                }
                tracing::debug!(page = state.pages, "Endpoint reported noRecordsMatch");
            }

            let page_records = match request.verb {
                Verb::ListIdentifiers => extract_headers(&doc, &self.namespaces),
                _ => extract_records(&doc, &self.namespaces),
            };
            let records_in_page = page_records.len();
            state.accumulated.extend(page_records);

            let limit_reached = request
                .record_limit
                .is_some_and(|limit| state.accumulated.len() >= limit);

            let next_token = if limit_reached {
                if let Some(limit) = request.record_limit {
                    state.accumulated.truncate(limit);
                    tracing::warn!(limit, "Record limit reached, stopping");
                }
                None
            } else {
                match resumption_token(&doc, &self.namespaces) {
                    Some(token) if !state.seen_tokens.insert(token.clone()) => {
                        tracing::warn!(%token, "Endpoint repeated a resumption token, stopping");
                        None
                    }
                    other => other,
                }
            };

            tracing::debug!(
                page = state.pages,
                records_in_page,
                total = state.accumulated.len(),
                has_more = next_token.is_some(),
                "Processed page"
            );
            on_page(&PageProgress {
                page: state.pages,
                records_in_page,
                total_records: state.accumulated.len(),
                has_more: next_token.is_some(),
            });

            match next_token {
                Some(token) => state.resumption_token = Some(token),
                None => break,
            }
        }

        tracing::info!(
            records = state.accumulated.len(),
            pages = state.pages,
            "Harvest complete"
        );
        Ok(state.accumulated)
    }

    /// Issue a single request and return the response document.
    ///
    /// With `strip`, the document is re-serialized with local names only;
    /// otherwise the body is returned as received. A protocol error in the
    /// response is returned as [`HarvesterError::OaiProtocol`].
    pub fn fetch_document(&self, request: &HarvestRequest, strip: bool) -> Result<String> {
        request.validate()?;
        tracing::info!(endpoint = %request.endpoint, verb = %request.verb, "Fetching document");

        let body = self.fetch(request, &initial_params(request))?;
        let doc = parse_document(&body).map_err(|source| HarvesterError::XmlParse {
            endpoint: request.endpoint.clone(),
            verb: request.verb,
            source,
        })?;

        if let Some(error) = protocol_error(&doc, &self.namespaces) {
            return Err(HarvesterError::OaiProtocol {
                endpoint: request.endpoint.clone(),
                verb: request.verb,
                code: error.code,
                message: error.message,
            });
        }

        if strip {
            strip_namespaces(doc.root())
        } else {
            Ok(body.clone())
        }
    }

    fn fetch(&self, request: &HarvestRequest, params: &QueryParams) -> Result<String> {
        self.transport
            .fetch(&request.endpoint, params)
            .map_err(|e| with_request_context(request, e))
    }
}

/// Parameters of the first request of a harvest.
///
/// `set` and `metadataPrefix` are only sent for paginating verbs.
pub fn initial_params(request: &HarvestRequest) -> QueryParams {
    let mut params = QueryParams::new();
    params.insert("verb", request.verb.as_str().to_string());

    if request.verb.paginates() {
        if let Some(set) = request.set_name.as_deref().filter(|s| !s.is_empty()) {
            params.insert("set", set.to_string());
        }
        params.insert("metadataPrefix", request.metadata_prefix.clone());
    }

    params
}

/// Parameters of a follow-up request: only `verb` and `resumptionToken`.
pub fn resumption_params(verb: Verb, token: &str) -> QueryParams {
    let mut params = QueryParams::new();
    params.insert("verb", verb.as_str().to_string());
    params.insert("resumptionToken", token.to_string());
    params
}

fn with_request_context(request: &HarvestRequest, error: TransportError) -> HarvesterError {
    let endpoint = request.endpoint.clone();
    let verb = request.verb;

    match error {
        TransportError::InvalidUrl(_) => ConfigError::InvalidEndpoint(endpoint).into(),
        TransportError::Network(source) => HarvesterError::Network {
            endpoint,
            verb,
            source,
        },
        TransportError::HttpStatus { code, body } => HarvesterError::HttpStatus {
            endpoint,
            verb,
            code,
            body,
        },
        TransportError::TooLarge { limit } => HarvesterError::ResponseTooLarge { endpoint, limit },
        TransportError::Decode(source) => HarvesterError::Decode {
            endpoint,
            verb,
            source,
        },
    }
}
