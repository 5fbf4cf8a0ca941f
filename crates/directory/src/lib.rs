//! # directory
//!
//! Blocking client for the CircleCI contexts API.
//!
//! This crate provides:
//! - The [`Directory`] trait: list/create contexts, list/upsert variables
//! - [`DirectoryClient`], the implementation over a [`transport::Transport`]
//! - Full `next_page_token` pagination for both listings
//! - Categorized errors and retry with exponential backoff
//! - `MockDirectory` and `MockTransport` for network-free tests, behind the
//!   `test-util` feature
//!
//! ## Example
//!
//! ```no_run
//! use directory::{Directory, DirectoryClient};
//!
//! let client = DirectoryClient::new("my-token", "my-org-id").unwrap();
//!
//! let id = match client.list_groups().unwrap().get("deploy") {
//!     Some(id) => id.clone(),
//!     None => client.create_group("deploy").unwrap(),
//! };
//! client.upsert_variable(&id, "AWS_REGION", "eu-west-1").unwrap();
//! ```
//!
//! ## Remote API
//!
//! | Operation             | Method | Path                                   |
//! |-----------------------|--------|----------------------------------------|
//! | list contexts         | GET    | `context?owner-id={org}`               |
//! | create context        | POST   | `context`                              |
//! | list variables        | GET    | `context/{id}/environment-variable`    |
//! | create/update variable| PUT    | `context/{id}/environment-variable/{name}` |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod retry;
pub mod transport;
pub mod types;

use std::collections::{BTreeMap, BTreeSet};

pub use client::DirectoryClient;
pub use error::{Error, ErrorCategory, Result};
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockDirectory;
pub use retry::RetryCallback;
pub use transport::http::{DEFAULT_API_BASE, HttpTransport};
pub use types::{ApiRequest, ApiResponse, Method, RetryConfig};

/// Operations on the contexts of one organization.
///
/// Every method is a complete request/response exchange: it either returns
/// the full payload or an [`Error`]. Listings never return partial results.
pub trait Directory: Send + Sync {
    /// All contexts owned by the organization, name to id.
    fn list_groups(&self) -> Result<BTreeMap<String, String>>;

    /// Create a context and return its id.
    fn create_group(&self, name: &str) -> Result<String>;

    /// Names of the variables currently set in a context.
    fn list_variable_names(&self, group_id: &str) -> Result<BTreeSet<String>>;

    /// Create the variable if absent, overwrite it if present.
    fn upsert_variable(&self, group_id: &str, name: &str, value: &str) -> Result<()>;
}
