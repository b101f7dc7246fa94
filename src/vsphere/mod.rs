//! Authenticated client for the vSphere REST API.
//!
//! [`VsphereClient`] carries the immutable connection parameters and is
//! shared by every inbound request. Tokens never live on the client: each
//! logical operation opens its own [`Session`], which logs in, issues its
//! calls, and logs out again, so concurrent operations cannot observe or
//! invalidate each other's token.

mod error;
mod resolver;
mod session;
mod transport;
mod types;

use std::fmt;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::Method;
use tracing::debug;

use crate::chain::ErrorChain;
use crate::config::BridgeConfig;

pub use error::ApiError;
pub use session::Session;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport, TransportFuture};
pub use types::{ObjectId, PowerKind, PowerState, RemoteObject};

/// Header carrying the session token on authenticated calls.
pub const SESSION_HEADER: &str = "vmware-api-session-id";

/// Path of the login and logout endpoint, relative to `/api/`.
pub const SESSION_PATH: &str = "session";

/// Path of the inventory listing, relative to `/api/`.
pub const INVENTORY_PATH: &str = "object";

/// Credentials resolved once from configuration.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct Credentials {
    authorization: Option<String>,
    basic: Option<(String, String)>,
}

impl Credentials {
    /// Builds credentials from an optional pre-computed `Authorization`
    /// value and an optional username/password pair. Blank values are
    /// ignored; the pair is only kept when both halves are present.
    #[must_use]
    pub fn new(
        authorization: Option<String>,
        username: Option<String>,
        password: Option<String>,
    ) -> Self {
        let non_blank = |value: Option<String>| {
            value
                .map(|raw| raw.trim().to_owned())
                .filter(|trimmed| !trimmed.is_empty())
        };
        Self {
            authorization: non_blank(authorization),
            basic: non_blank(username).zip(non_blank(password)),
        }
    }

    /// Chooses the `Authorization` value for a login. A value supplied by
    /// the caller wins, then the configured header, then basic credentials.
    #[must_use]
    pub fn header(&self, inbound: Option<&str>) -> Option<String> {
        if let Some(value) = inbound.map(str::trim).filter(|value| !value.is_empty()) {
            return Some(value.to_owned());
        }
        if let Some(value) = &self.authorization {
            return Some(value.clone());
        }
        self.basic.as_ref().map(|(username, password)| {
            format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("authorization", &self.authorization.as_ref().map(|_| "<redacted>"))
            .field("username", &self.basic.as_ref().map(|(username, _)| username))
            .finish_non_exhaustive()
    }
}

/// Connection parameters shared by every session.
#[derive(Clone)]
pub struct VsphereClient {
    base_url: String,
    credentials: Credentials,
    transport: Arc<dyn Transport>,
}

impl VsphereClient {
    /// Creates a client for `base_url` (scheme and host, trailing `/`
    /// ignored).
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        credentials: Credentials,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            credentials,
            transport,
        }
    }

    /// Creates a client from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorChain`] when the configured server URL is invalid.
    pub fn from_config(
        config: &BridgeConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ErrorChain> {
        let server = config
            .server_url()
            .map_err(|err| ErrorChain::wrap(err, "invalid server URL"))?;
        Ok(Self::new(server.as_str(), config.credentials(), transport))
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Opens a session for one logical operation. `authorization` is the
    /// `Authorization` header supplied by the inbound caller, if any.
    #[must_use]
    pub fn session(&self, authorization: Option<&str>) -> Session {
        Session::new(self.clone(), authorization.map(str::to_owned))
    }

    pub(crate) const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Issues one call to `{base}/api/{path}` and returns the body. Any
    /// status of 400 or above is a failure carrying the response text.
    pub(crate) async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        token: Option<&str>,
        extra_headers: &[(&str, String)],
    ) -> Result<Vec<u8>, ErrorChain> {
        let path = path.trim_start_matches('/');
        let url = format!("{}/api/{path}", self.base_url);
        let context = format!("{method} /api/{path} failed");

        let mut headers: Vec<(String, String)> = extra_headers
            .iter()
            .map(|(name, value)| ((*name).to_owned(), value.clone()))
            .collect();
        if let Some(token) = token {
            headers.push((SESSION_HEADER.to_owned(), token.to_owned()));
        }
        headers.push((
            reqwest::header::CONTENT_TYPE.as_str().to_owned(),
            String::from("application/json"),
        ));

        debug!(%method, %url, "sending upstream request");
        let response = self
            .transport
            .send(ApiRequest {
                method,
                url,
                headers,
                body,
            })
            .await
            .map_err(|err| ErrorChain::wrap(err, context.clone()))?;

        if response.status >= 400 {
            let rejected = ApiError::UpstreamRejected {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            };
            return Err(ErrorChain::wrap(rejected, context));
        }

        Ok(response.body)
    }
}

impl fmt::Debug for VsphereClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VsphereClient")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
