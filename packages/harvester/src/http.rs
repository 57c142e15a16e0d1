//! HTTP transport for issuing OAI-PMH requests.
//!
//! A single GET per call, no retries: the first failure ends the harvest.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use url::Url;

use crate::config::{DEFAULT_MAX_RESPONSE_SIZE, HTTP_TIMEOUT_SECS};
use crate::decode::{decode_body, DecodeError};
use crate::error::{HarvesterError, Result};

/// User agent string identifying this harvester.
const USER_AGENT: &str = concat!("oai-harvester/", env!("CARGO_PKG_VERSION"));

/// Longest error body kept in an `HttpStatus` error.
const MAX_ERROR_BODY_CHARS: usize = 2048;

/// Query parameters of one request, in a stable order.
pub type QueryParams = BTreeMap<&'static str, String>;

/// Failure of a single fetch, before request context is attached.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Endpoint could not be parsed as a URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Connection, timeout or body read failure.
    #[error(transparent)]
    Network(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("HTTP {code}")]
    HttpStatus { code: u16, body: String },

    /// Body larger than the configured limit.
    #[error("response exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    /// Body could not be decoded in its declared encoding.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Issues one GET request and returns the decoded body.
pub trait Transport {
    /// Fetch `endpoint` with `params` appended to its query string.
    fn fetch(
        &self,
        endpoint: &str,
        params: &QueryParams,
    ) -> std::result::Result<String, TransportError>;
}

/// Settings for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub timeout: Duration,
    pub user_agent: String,
    pub max_response_bytes: u64,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(HTTP_TIMEOUT_SECS),
            user_agent: USER_AGENT.to_string(),
            max_response_bytes: DEFAULT_MAX_RESPONSE_SIZE,
        }
    }
}

/// Blocking reqwest transport used against real endpoints.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    max_response_bytes: u64,
}

impl HttpTransport {
    /// Create a transport with a configured HTTP client.
    pub fn new(settings: TransportSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent)
            .build()
            .map_err(HarvesterError::Client)?;

        Ok(Self {
            client,
            max_response_bytes: settings.max_response_bytes,
        })
    }
}

impl Transport for HttpTransport {
    fn fetch(
        &self,
        endpoint: &str,
        params: &QueryParams,
    ) -> std::result::Result<String, TransportError> {
        let url = request_url(endpoint, params)?;
        tracing::debug!(url = %url, "Sending request");

        let response = self.client.get(url).send()?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TransportError::HttpStatus {
                code: status.as_u16(),
                body: truncate_chars(body.trim(), MAX_ERROR_BODY_CHARS),
            });
        }

        if response
            .content_length()
            .is_some_and(|len| len > self.max_response_bytes)
        {
            return Err(TransportError::TooLarge {
                limit: self.max_response_bytes,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes()?;
        if bytes.len() as u64 > self.max_response_bytes {
            return Err(TransportError::TooLarge {
                limit: self.max_response_bytes,
            });
        }

        Ok(decode_body(&bytes, content_type.as_deref())?)
    }
}

/// Build the request URL, keeping any query the endpoint already carries.
///
/// # Examples
/// ```
/// use oai_harvester::http::{request_url, QueryParams};
///
/// let mut params = QueryParams::new();
/// params.insert("verb", "ListRecords".to_string());
/// params.insert("resumptionToken", "a b/c".to_string());
///
/// let url = request_url("https://example.org/oai", &params).unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://example.org/oai?resumptionToken=a+b%2Fc&verb=ListRecords"
/// );
/// ```
pub fn request_url(endpoint: &str, params: &QueryParams) -> std::result::Result<Url, url::ParseError> {
    let mut url = Url::parse(endpoint)?;
    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in params {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
