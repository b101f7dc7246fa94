//! Display-name resolution against the inventory listing.

use reqwest::Method;

use crate::chain::{ErrorChain, ResultExt};

use super::{ApiError, INVENTORY_PATH, RemoteObject, Session};

impl Session {
    /// Lists the inventory and returns the first record named `name`.
    ///
    /// Names are not unique upstream, so the first exact match wins.
    ///
    /// # Errors
    ///
    /// Returns a chain rooted in [`ApiError::NotFound`] when no record
    /// matches, and a wrapped transport, upstream, or decode error otherwise.
    pub async fn find_by_name(&mut self, name: &str) -> Result<RemoteObject, ErrorChain> {
        let body = self
            .authenticated_request(Method::GET, INVENTORY_PATH, None)
            .await
            .context("unable to fetch list of virtual machines")?;

        let objects: Vec<RemoteObject> = serde_json::from_slice(&body)
            .map_err(ApiError::from)
            .context("unable to decode virtual machine list")?;

        objects
            .into_iter()
            .find(|object| object.name == name)
            .ok_or_else(|| {
                ErrorChain::wrap(
                    ApiError::NotFound {
                        name: name.to_owned(),
                    },
                    "no matching inventory record",
                )
            })
    }
}
