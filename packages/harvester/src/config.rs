//! Configuration constants and validation functions for the harvester.

use url::Url;

use crate::error::ConfigError;

/// HTTP timeout in seconds.
///
/// List responses from large sets can take a while to be generated server-side.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Default maximum HTTP response size in bytes (100 MB).
///
/// Can be overridden via the CLI `--max-size` flag.
pub const DEFAULT_MAX_RESPONSE_SIZE: u64 = 100 * 1024 * 1024;

/// Metadata prefix of the default endpoint family (PICO application profile).
pub const DEFAULT_METADATA_PREFIX: &str = "pico";

/// Metadata prefix of plain Dublin Core endpoints.
pub const OAI_DC_METADATA_PREFIX: &str = "oai_dc";

/// Record limit applied by the CLI `--test` flag.
pub const TEST_RECORD_LIMIT: usize = 20;

/// Stylesheet referenced by XML output when none is given explicitly.
pub const DEFAULT_STYLESHEET: &str = "xslt/oai2.xsl";

/// Delimiter joining multi-valued fields in CSV cells.
pub const MULTI_VALUE_DELIMITER: &str = "; ";

/// Known endpoint aliases accepted on the command line.
pub const KNOWN_ENDPOINTS: &[(&str, &str)] = &[(
    "a",
    "https://www.culturaitalia.it/oaiProviderCI/OAIHandler",
)];

/// Validate that an endpoint is an absolute http(s) URL.
///
/// # Examples
/// ```
/// use oai_harvester::config::validate_endpoint;
///
/// assert!(validate_endpoint("https://example.org/oai").is_ok());
/// assert!(validate_endpoint("example.org/oai").is_err());
/// assert!(validate_endpoint("ftp://example.org/oai").is_err());
/// ```
pub fn validate_endpoint(endpoint: &str) -> Result<Url, ConfigError> {
    let url =
        Url::parse(endpoint).map_err(|_| ConfigError::InvalidEndpoint(endpoint.to_string()))?;

    match url.scheme() {
        "http" | "https" if url.host().is_some() => Ok(url),
        _ => Err(ConfigError::InvalidEndpoint(endpoint.to_string())),
    }
}

/// Resolve an endpoint alias or URL given on the command line.
///
/// Aliases from [`KNOWN_ENDPOINTS`] map to their URL; anything containing
/// `://` is validated as a URL.
///
/// # Examples
/// ```
/// use oai_harvester::config::resolve_endpoint;
///
/// assert_eq!(
///     resolve_endpoint("a").unwrap(),
///     "https://www.culturaitalia.it/oaiProviderCI/OAIHandler"
/// );
/// assert!(resolve_endpoint("z").is_err());
/// ```
pub fn resolve_endpoint(value: &str) -> Result<String, ConfigError> {
    if value.contains("://") {
        validate_endpoint(value)?;
        return Ok(value.to_string());
    }

    KNOWN_ENDPOINTS
        .iter()
        .find(|(alias, _)| *alias == value)
        .map(|(_, url)| (*url).to_string())
        .ok_or_else(|| ConfigError::UnknownEndpoint(value.to_string()))
}
