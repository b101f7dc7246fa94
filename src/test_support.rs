//! Test support utilities shared across unit and integration tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::vsphere::{ApiError, ApiRequest, ApiResponse, Transport, TransportFuture};

/// Scripted transport that returns pre-seeded responses in FIFO order.
///
/// Every request is recorded so tests can assert on the exact sequence of
/// upstream calls without opening sockets. Clones share the same script.
#[derive(Clone, Debug, Default)]
pub struct ScriptedTransport {
    responses: Arc<Mutex<VecDeque<Result<ApiResponse, ApiError>>>>,
    requests: Arc<Mutex<Vec<ApiRequest>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedTransport {
    /// Creates a transport with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all requests recorded so far.
    #[must_use]
    pub fn requests(&self) -> Vec<ApiRequest> {
        lock(&self.requests).clone()
    }

    /// Returns recorded requests as `METHOD path` lines, with the scheme and
    /// host stripped, for compact ordering assertions.
    #[must_use]
    pub fn request_lines(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|request| format!("{} {}", request.method, path_of(&request.url)))
            .collect()
    }

    /// Pushes a response with an explicit status and body.
    pub fn push_status(&self, status: u16, body: impl Into<String>) {
        lock(&self.responses).push_back(Ok(ApiResponse {
            status,
            body: body.into().into_bytes(),
        }));
    }

    /// Pushes an empty `200 OK`.
    pub fn push_ok(&self) {
        self.push_status(200, "");
    }

    /// Pushes a `200 OK` login response carrying `token` as a JSON string.
    pub fn push_login(&self, token: &str) {
        self.push_status(200, format!("\"{token}\""));
    }

    /// Pushes a `200 OK` with `value` serialised as the body.
    pub fn push_json(&self, value: &Value) {
        self.push_status(200, value.to_string());
    }

    /// Pushes a transport-level failure.
    pub fn push_transport_failure(&self, message: &str) {
        lock(&self.responses).push_back(Err(ApiError::Transport {
            message: message.to_owned(),
        }));
    }

    /// Number of scripted responses not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        lock(&self.responses).len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
        lock(&self.requests).push(request);
        let response = lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| {
                Err(ApiError::Transport {
                    message: String::from("no scripted response available"),
                })
            });
        Box::pin(async move { response })
    }
}

/// Strips scheme and authority from `url`, keeping path and query.
#[must_use]
pub fn path_of(url: &str) -> &str {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    without_scheme
        .find('/')
        .map_or("/", |index| without_scheme.get(index..).unwrap_or("/"))
}

/// Produces an inventory listing with the given `(id, name, power_state)`
/// records.
#[must_use]
pub fn inventory(records: &[(&str, &str, &str)]) -> Value {
    Value::Array(
        records
            .iter()
            .map(|(id, name, state)| {
                serde_json::json!({
                    "id": id,
                    "name": name,
                    "power_state": state,
                    "cpu_count": 2,
                    "memory_size_MiB": 4096,
                })
            })
            .collect(),
    )
}
