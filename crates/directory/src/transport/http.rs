//! HTTP transport over ureq.
//!
//! # Rate Limiting
//!
//! CircleCI throttles API tokens and answers with HTTP 429 plus a
//! `Retry-After` header. This transport only surfaces the header; the client
//! decides whether and when to retry.

use crate::error::{Error, Result};
use crate::transport::Transport;
use crate::types::{ApiRequest, ApiResponse, Method};
use std::time::Duration;
use ureq::Agent;

/// Default CircleCI API v2 base URL.
pub const DEFAULT_API_BASE: &str = "https://circleci.com/api/v2";

const USER_AGENT: &str = concat!("ctxsync/", env!("CARGO_PKG_VERSION"));

/// Blocking HTTP transport authenticated with a CircleCI token.
pub struct HttpTransport {
    /// HTTP agent for requests.
    agent: Agent,
    /// API base URL without a trailing slash.
    api_base: String,
    /// Personal API token sent as `Circle-Token`.
    token: String,
}

impl HttpTransport {
    /// Create a transport against the public CircleCI API.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `token` is empty.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_api_base(token, DEFAULT_API_BASE)
    }

    /// Create a transport with a custom API base (self-hosted server, tests).
    pub fn with_api_base(token: impl Into<String>, api_base: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(Error::InvalidArgument("API token cannot be empty".to_string()));
        }

        // Non-2xx statuses are data here: the body carries the remote message.
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .build();
        let agent: Agent = config.into();

        Ok(Self {
            agent,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Get the current API base URL.
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Headers sent with every request, whatever the method.
    fn headers(&self) -> [(&'static str, &str); 4] {
        [
            ("Circle-Token", self.token.as_str()),
            ("Accept", "application/json"),
            ("Content-Type", "application/json"),
            ("User-Agent", USER_AGENT),
        ]
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = self.url(&request.path);

        let sent = match request.method {
            Method::Get => {
                let mut builder = self.agent.get(&url);
                for (name, value) in self.headers() {
                    builder = builder.header(name, value);
                }
                for (key, value) in &request.query {
                    builder = builder.query(key, value);
                }
                builder.call()
            }
            Method::Post | Method::Put => {
                let mut builder = match request.method {
                    Method::Post => self.agent.post(&url),
                    _ => self.agent.put(&url),
                };
                for (name, value) in self.headers() {
                    builder = builder.header(name, value);
                }
                for (key, value) in &request.query {
                    builder = builder.query(key, value);
                }
                match &request.body {
                    Some(body) => builder.send_json(body),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = sent.map_err(|e| Error::transport(request, e.to_string()))?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| Error::transport(request, e.to_string()))?;

        Ok(ApiResponse {
            status,
            body,
            retry_after,
        })
    }
}
