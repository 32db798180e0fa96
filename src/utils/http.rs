//! HTTP transport shared by every market source
//!
//! One blocking client per source with:
//! - rustls TLS and a fixed user agent
//! - a connect timeout but no global request timeout
//! - per-request timeouts chosen by the caller
//! - non-2xx statuses turned into `UpstreamStatus` errors with the body kept verbatim

use reqwest::blocking::Client;
use std::time::Duration;

use crate::error::{FetchError, FetchResult};

const USER_AGENT: &str = concat!("intraday-fetcher/", env!("CARGO_PKG_VERSION"));

/// Thin wrapper around a blocking reqwest client
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> FetchResult<Self> {
        // No request timeout at the client level: callers that need a bound
        // pass one per request, the rest wait on the transport.
        let client = Client::builder()
            .timeout(None)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// GET a JSON document.
    ///
    /// `query` is appended as URL parameters, `headers` are sent as-is.
    pub fn get_json(
        &self,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
        timeout: Option<Duration>,
    ) -> FetchResult<serde_json::Value> {
        let mut request = self.client.get(url).query(query);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            return Err(FetchError::upstream(status.as_u16(), body));
        }

        serde_json::from_str(&body)
            .map_err(|e| FetchError::parse_error(format!("JSON parse error: {}", e)))
    }
}

/// Percent-encode a user-supplied identifier for use as a path segment
pub fn path_segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

/// Host portion of a URL, used for log fields
pub fn extract_domain(url: &str) -> String {
    url.trim_start_matches("https://")
        .trim_start_matches("http://")
        .split('/')
        .next()
        .unwrap_or(url)
        .to_string()
}
