//! The contexts API client.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::de::DeserializeOwned;
use serde_json::json;

use crate::Directory;
use crate::error::{Error, ErrorCategory, Result};
use crate::retry::{RetryCallback, with_retry_if};
use crate::transport::Transport;
use crate::transport::http::HttpTransport;
use crate::types::{
    ApiRequest, ApiResponse, ContextItem, CreatedContext, Method, Page, RetryConfig, VariableItem,
};

/// Client for the contexts of one organization.
///
/// Every operation issues blocking requests through the transport, follows
/// `next_page_token` until the listing is exhausted, and retries transient
/// failures according to its [`RetryConfig`].
///
/// # Example
///
/// ```no_run
/// use directory::{Directory, DirectoryClient};
///
/// let client = DirectoryClient::new("my-token", "0f1e2d3c-org-id").unwrap();
/// for (name, id) in client.list_groups().unwrap() {
///     println!("{name} -> {id}");
/// }
/// ```
pub struct DirectoryClient<T = HttpTransport> {
    transport: T,
    owner_id: String,
    retry: RetryConfig,
    callback: Option<Box<dyn RetryCallback>>,
}

impl DirectoryClient<HttpTransport> {
    /// Create a client against the public CircleCI API.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the token or organization id is empty.
    pub fn new(token: &str, owner_id: &str) -> Result<Self> {
        Self::with_transport(HttpTransport::new(token)?, owner_id)
    }
}

impl<T: Transport> DirectoryClient<T> {
    /// Create a client over an arbitrary transport.
    pub fn with_transport(transport: T, owner_id: impl Into<String>) -> Result<Self> {
        let owner_id = owner_id.into();
        if owner_id.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "organization id cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            transport,
            owner_id,
            retry: RetryConfig::default(),
            callback: None,
        })
    }

    /// Replace the retry configuration.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Receive a notification before each retry.
    #[must_use]
    pub fn with_retry_callback(mut self, callback: impl RetryCallback + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Send a request, turning non-2xx statuses into errors and retrying.
    ///
    /// POST is not idempotent, so it is retried only when the server
    /// explicitly rate-limited it (the request was not processed).
    fn execute(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let should_retry = |err: &Error| match request.method {
            Method::Post => err.category() == ErrorCategory::RateLimited,
            Method::Get | Method::Put => err.is_retryable(),
        };

        with_retry_if(&self.retry, self.callback.as_deref(), should_retry, || {
            let response = self.transport.send(request)?;
            if response.is_success() {
                Ok(response)
            } else {
                Err(Error::from_response(request, &response))
            }
        })
    }

    /// Fetch every page of a token-paginated listing.
    ///
    /// Fails as a whole if any page fails; partial results are discarded.
    /// A token that comes back after it was already followed is a malformed
    /// response, not another page.
    fn fetch_all<I: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<Vec<I>> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();

        loop {
            let mut request = ApiRequest::get(path);
            for (key, value) in params {
                request = request.query(*key, *value);
            }
            if let Some(token) = &page_token {
                request = request.query("page-token", token.as_str());
            }

            let page: Page<I> = self.execute(&request)?.parse(&request)?;
            items.extend(page.items);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) if !seen_tokens.insert(next.clone()) => {
                    return Err(Error::InvalidResponse {
                        endpoint: request.endpoint(),
                        message: format!("next_page_token '{next}' already visited"),
                    });
                }
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        Ok(items)
    }
}

fn variables_path(group_id: &str) -> String {
    format!(
        "context/{}/environment-variable",
        urlencoding::encode(group_id)
    )
}

impl<T: Transport> Directory for DirectoryClient<T> {
    fn list_groups(&self) -> Result<BTreeMap<String, String>> {
        let items: Vec<ContextItem> =
            self.fetch_all("context", &[("owner-id", self.owner_id.as_str())])?;
        Ok(items.into_iter().map(|c| (c.name, c.id)).collect())
    }

    fn create_group(&self, name: &str) -> Result<String> {
        let request = ApiRequest::post(
            "context",
            json!({
                "name": name,
                "owner": {
                    "id": self.owner_id,
                    "type": "organization",
                },
            }),
        );

        let created: CreatedContext = self.execute(&request)?.parse(&request)?;
        created
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::MissingId {
                name: name.to_string(),
            })
    }

    fn list_variable_names(&self, group_id: &str) -> Result<BTreeSet<String>> {
        let items: Vec<VariableItem> = self.fetch_all(&variables_path(group_id), &[])?;
        Ok(items.into_iter().map(|v| v.variable).collect())
    }

    fn upsert_variable(&self, group_id: &str, name: &str, value: &str) -> Result<()> {
        let path = format!("{}/{}", variables_path(group_id), urlencoding::encode(name));
        let request = ApiRequest::put(path, json!({ "value": value }));
        self.execute(&request)?;
        Ok(())
    }
}
