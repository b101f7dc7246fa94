//! HTTP transport seam between sessions and the network.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Method;

use super::ApiError;

/// A fully resolved upstream request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Header name and value pairs, in insertion order.
    pub headers: Vec<(String, String)>,
    /// Optional request body.
    pub body: Option<Vec<u8>>,
}

impl ApiRequest {
    /// Returns the first value of `name`, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status and body returned by the upstream.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApiResponse {
    /// Numeric HTTP status.
    pub status: u16,
    /// Raw response body.
    pub body: Vec<u8>,
}

/// Future returned by [`Transport::send`].
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<ApiResponse, ApiError>> + Send + 'a>>;

/// Sends a single request and returns whatever the upstream answered.
///
/// Implementations report only failures to obtain a response; interpreting
/// the status code is left to the caller.
pub trait Transport: Send + Sync {
    /// Issues `request`.
    fn send(&self, request: ApiRequest) -> TransportFuture<'_>;
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Builds a transport with a per-request `timeout`. When `insecure` is
    /// set, TLS certificates are not validated.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] when the TLS backend cannot be
    /// initialised.
    pub fn new(insecure: bool, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(insecure)
            .build()
            .map_err(|err| ApiError::Transport {
                message: err.to_string(),
            })?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
        Box::pin(async move {
            let mut builder = self.client.request(request.method, &request.url);
            for (name, value) in request.headers {
                builder = builder.header(name, value);
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|err| ApiError::from_reqwest(&err))?;
            let status = response.status().as_u16();
            let body = response
                .bytes()
                .await
                .map_err(|err| ApiError::from_reqwest(&err))?;

            Ok(ApiResponse {
                status,
                body: body.to_vec(),
            })
        })
    }
}
