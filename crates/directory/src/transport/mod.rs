//! Transport trait and implementations.
//!
//! A [`Transport`] sends one [`ApiRequest`] and returns the raw
//! [`ApiResponse`], whatever its status. Status interpretation, pagination
//! and retries live in [`crate::DirectoryClient`], so they are exercised the
//! same way against [`http::HttpTransport`] and the mock transport.
//!
//! With the `test-util` feature, `MockTransport` scripts responses per
//! endpoint and records every request.

pub mod http;
#[cfg(any(test, feature = "test-util"))]
mod mock;

use crate::error::Result;
use crate::types::{ApiRequest, ApiResponse};

#[cfg(any(test, feature = "test-util"))]
pub use mock::MockTransport;

/// Sends requests to the contexts API.
pub trait Transport: Send + Sync {
    /// Send a request and return the response.
    ///
    /// Non-2xx statuses are returned as `Ok`; only failures to obtain a
    /// response at all are `Err`.
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse>;
}
