//! Failure kinds raised while talking to the vSphere API.

use reqwest::StatusCode;
use thiserror::Error;

/// Typed failure at the root of every runtime error chain.
///
/// Callers locate it with [`crate::chain::ErrorChain::find`] to decide how to
/// react without matching on rendered messages.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Neither the caller nor the configuration supplied credentials.
    #[error("one of: vsphere username and password, basic authorization header are required")]
    MissingCredentials,
    /// The request could not be built from the supplied parts.
    #[error("malformed upstream request: {message}")]
    InvalidRequest {
        /// Description reported by the HTTP client.
        message: String,
    },
    /// The request never produced a response (network, DNS, TLS, timeout).
    #[error("error sending http request: {message}")]
    Transport {
        /// Description reported by the HTTP client.
        message: String,
    },
    /// The upstream answered with an HTTP status of 400 or above.
    #[error("unexpected response received from server ({}): {body}", status_line(.status))]
    UpstreamRejected {
        /// Numeric HTTP status.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },
    /// The upstream accepted the login but returned no token.
    #[error("upstream returned an empty session token")]
    EmptyToken,
    /// A response body did not match the expected schema.
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
    /// No inventory record carries the requested display name.
    #[error("virtual machine {name} not found")]
    NotFound {
        /// Display name that was looked up.
        name: String,
    },
}

impl ApiError {
    pub(crate) fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_builder() {
            Self::InvalidRequest {
                message: err.to_string(),
            }
        } else {
            Self::Transport {
                message: err.to_string(),
            }
        }
    }
}

fn status_line(status: &u16) -> String {
    StatusCode::from_u16(*status).map_or_else(|_| status.to_string(), |code| code.to_string())
}
