//! Shared outbound HTTP client
//!
//! One `reqwest::Client` is built at startup and cloned into both the
//! storage and streaming clients. Request signing is not performed here;
//! when `OCI_AUTH_TOKEN` is configured it is attached as the
//! `Authorization` header of every request.

use crate::config::RelayConfig;
use crate::error::RelayError;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::Url;

/// Build the outbound HTTP client from configuration
pub fn build_client(config: &RelayConfig) -> Result<reqwest::Client, RelayError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("object-relay/", env!("CARGO_PKG_VERSION"))),
    );

    if let Some(ref token) = config.credentials.auth_token {
        let mut value = HeaderValue::from_str(token)
            .map_err(|e| RelayError::Config(format!("OCI_AUTH_TOKEN is not a valid header value: {e}")))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(config.http_timeout)
        .build()
        .map_err(|e| RelayError::Config(format!("failed to build HTTP client: {e}")))
}

/// Parse a service endpoint, rejecting URLs that cannot carry a path
pub fn parse_endpoint(name: &str, raw: &str) -> Result<Url, RelayError> {
    let url = Url::parse(raw).map_err(|e| RelayError::Config(format!("{name} is not a valid URL: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(RelayError::Config(format!("{name} must be an http(s) URL, got '{raw}'")));
    }
    Ok(url)
}

/// Append percent-encoded path segments to a base endpoint
pub fn join_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty();
        path.extend(segments);
    }
    url
}

/// Read a response body for error reporting, truncated to keep logs bounded
pub async fn error_body(response: reqwest::Response) -> String {
    const MAX_ERROR_BODY: usize = 512;

    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}
