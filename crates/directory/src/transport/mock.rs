//! Scripted in-memory transport.

use super::Transport;
use crate::error::{Error, Result};
use crate::types::{ApiRequest, ApiResponse, Method};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// In-memory transport for testing without network access.
///
/// Responses are scripted per `METHOD endpoint` key and consumed in order;
/// the last scripted response for a key is repeated once the queue runs dry.
/// Unscripted requests get a 404. Every request is recorded.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    responses: Arc<Mutex<HashMap<String, VecDeque<Result<ApiResponse>>>>>,
    requests: Arc<Mutex<Vec<ApiRequest>>>,
}

impl MockTransport {
    /// Create a new mock with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `method` + `endpoint` (path and query).
    pub fn respond(&mut self, method: Method, endpoint: &str, response: ApiResponse) {
        self.push(method, endpoint, Ok(response));
    }

    /// Queue a transport failure (no response) for `method` + `endpoint`.
    pub fn fail(&mut self, method: Method, endpoint: &str, message: &str) {
        let request = ApiRequest {
            method,
            path: endpoint.to_string(),
            query: Vec::new(),
            body: None,
        };
        self.push(method, endpoint, Err(Error::transport(&request, message)));
    }

    /// All requests sent so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests sent with the given method.
    #[must_use]
    pub fn count(&self, method: Method) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method)
            .count()
    }

    fn push(&mut self, method: Method, endpoint: &str, response: Result<ApiResponse>) {
        let mut responses = self.responses.lock().unwrap();
        responses
            .entry(key(method, endpoint))
            .or_default()
            .push_back(response);
    }
}

fn key(method: Method, endpoint: &str) -> String {
    format!("{method} {endpoint}")
}

impl Transport for MockTransport {
    fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let mut responses = self.responses.lock().unwrap();
        let Some(queue) = responses.get_mut(&key(request.method, &request.endpoint())) else {
            return Ok(ApiResponse::json(
                404,
                serde_json::json!({"message": "no mock response configured"}),
            ));
        };

        match queue.len() {
            0 => Ok(ApiResponse::json(404, serde_json::json!({"message": "exhausted"}))),
            1 => queue[0].clone(),
            _ => queue
                .pop_front()
                .unwrap_or_else(|| Err(Error::transport(request, "mock queue empty"))),
        }
    }
}
