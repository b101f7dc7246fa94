//! Operation-scoped authentication sessions.

use reqwest::Method;
use reqwest::header::AUTHORIZATION;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::chain::{ErrorChain, ResultExt};
use crate::logging;

use super::{ApiError, SESSION_PATH, VsphereClient};

/// Authentication state for one logical operation.
///
/// A session is created per inbound request and never shared, so the token
/// it holds is only ever attached to calls issued by that operation. A
/// session that performed a login logs out before its operation completes;
/// if the owning future is dropped first, the logout is spawned on the
/// current Tokio runtime instead.
#[derive(Debug)]
pub struct Session {
    client: VsphereClient,
    authorization: Option<String>,
    token: Option<String>,
    owns_token: bool,
    operation: Uuid,
}

impl Session {
    pub(super) fn new(client: VsphereClient, authorization: Option<String>) -> Self {
        Self {
            client,
            authorization,
            token: None,
            owns_token: false,
            operation: Uuid::new_v4(),
        }
    }

    /// Identifier used to correlate this operation's log lines.
    #[must_use]
    pub const fn operation_id(&self) -> Uuid {
        self.operation
    }

    /// Session token currently held, if any.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Adopts a token obtained elsewhere. The session never logs out a token
    /// it did not obtain itself.
    pub fn adopt_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
        self.owns_token = false;
    }

    /// Logs in and stores the returned token.
    ///
    /// The caller's `Authorization` header is used when present; otherwise
    /// one is built from the configured credentials. A token this session
    /// obtained earlier is logged out before the new login.
    ///
    /// # Errors
    ///
    /// Fails with [`ApiError::MissingCredentials`] before any network call
    /// when no credentials are available, and with a wrapped transport or
    /// upstream error when the login call fails.
    pub async fn authenticate(&mut self) -> Result<(), ErrorChain> {
        let Some(credentials) = self
            .client
            .credentials()
            .header(self.authorization.as_deref())
        else {
            return Err(ErrorChain::wrap(
                ApiError::MissingCredentials,
                "no credentials available for login",
            ));
        };

        // A replaced token must not outlive the operation that obtained it.
        if self.owns_token {
            self.logout().await;
        }

        let body = self
            .raw_request(
                Method::POST,
                SESSION_PATH,
                None,
                &[(AUTHORIZATION.as_str(), credentials)],
            )
            .await
            .context("unable to fetch session token")?;

        // The token arrives as a JSON string literal.
        let token = String::from_utf8_lossy(&body)
            .trim()
            .trim_matches('"')
            .to_owned();
        if token.is_empty() {
            return Err(ErrorChain::wrap(
                ApiError::EmptyToken,
                "unable to fetch session token",
            ));
        }

        debug!(operation = %self.operation, "session established");
        self.token = Some(token);
        self.owns_token = true;
        Ok(())
    }

    /// Logs in unless a token is already held.
    ///
    /// Returns `true` when this call performed the login, in which case the
    /// caller must pass the flag to [`Session::finish`].
    ///
    /// # Errors
    ///
    /// Returns the wrapped authentication failure.
    pub async fn begin(&mut self) -> Result<bool, ErrorChain> {
        if self.token.is_some() {
            return Ok(false);
        }
        self.authenticate()
            .await
            .context("unable to authenticate with vsphere api")?;
        Ok(true)
    }

    /// Logs out when `performed_login` reports that the matching
    /// [`Session::begin`] obtained the token.
    pub async fn finish(&mut self, performed_login: bool) {
        if performed_login {
            self.logout().await;
        }
    }

    /// Issues a call with the session token, logging in first and out
    /// afterwards when no token was held on entry.
    ///
    /// The logout runs whether or not the call succeeded. Logout failures
    /// are logged and never replace the call's own result.
    ///
    /// # Errors
    ///
    /// Returns the wrapped authentication failure without issuing the call,
    /// or the wrapped failure of the call itself.
    pub async fn authenticated_request(
        &mut self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, ErrorChain> {
        let performed_login = self.begin().await?;
        let result = self.raw_request(method, path, body, &[]).await;
        self.finish(performed_login).await;
        result
    }

    /// Issues a single call with the current token (if any) and the given
    /// extra headers, without any login or logout.
    ///
    /// # Errors
    ///
    /// Returns a wrapped [`ApiError`] for transport failures and for any
    /// status of 400 or above.
    pub async fn raw_request(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        extra_headers: &[(&str, String)],
    ) -> Result<Vec<u8>, ErrorChain> {
        self.client
            .send(method, path, body, self.token.as_deref(), extra_headers)
            .await
    }

    /// Invalidates the held token, best-effort, and forgets it.
    pub async fn logout(&mut self) {
        if self.token.is_none() {
            return;
        }

        if let Err(err) = self
            .raw_request(Method::DELETE, SESSION_PATH, None, &[])
            .await
        {
            logging::error(&ErrorChain::wrap(err, "unable to logout of session"));
        } else {
            debug!(operation = %self.operation, "session closed");
        }

        self.token = None;
        self.owns_token = false;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.owns_token {
            return;
        }
        let Some(token) = self.token.take() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(operation = %self.operation, "session dropped outside a runtime; token left open");
            return;
        };

        let client = self.client.clone();
        let operation = self.operation;
        debug!(%operation, "operation cancelled; logging out in the background");
        runtime.spawn(async move {
            if let Err(err) = client
                .send(Method::DELETE, SESSION_PATH, None, Some(&token), &[])
                .await
            {
                logging::error(&ErrorChain::wrap(err, "unable to logout of cancelled session"));
            }
        });
    }
}
