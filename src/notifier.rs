//! Best-effort outbound notifications.
//!
//! Each configured endpoint receives a JSON body `{"text": "..."}`. Delivery
//! failures are logged and otherwise ignored; a notification never changes
//! the outcome of the operation that triggered it.

use std::fmt;
use std::sync::Arc;

use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;

use crate::chain::ErrorChain;
use crate::logging;
use crate::vsphere::{ApiError, ApiRequest, Transport};

#[derive(Serialize)]
struct NotificationBody<'a> {
    text: &'a str,
}

/// Sends plain-text messages to zero or more webhook endpoints.
#[derive(Clone)]
pub struct Notifier {
    urls: Vec<String>,
    transport: Option<Arc<dyn Transport>>,
}

impl Notifier {
    /// Creates a notifier for `urls`. Blank entries are dropped.
    #[must_use]
    pub fn new(urls: impl IntoIterator<Item = String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            urls: urls
                .into_iter()
                .map(|url| url.trim().to_owned())
                .filter(|url| !url.is_empty())
                .collect(),
            transport: Some(transport),
        }
    }

    /// A notifier with no endpoints.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            urls: Vec::new(),
            transport: None,
        }
    }

    /// Endpoints that will receive messages.
    #[must_use]
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Delivers `text` to every endpoint, logging failures.
    pub async fn message(&self, text: &str) {
        let Some(transport) = &self.transport else {
            return;
        };
        let body = match serde_json::to_vec(&NotificationBody { text }) {
            Ok(body) => body,
            Err(err) => {
                logging::warn(&ErrorChain::wrap(err, "unable to encode notification"));
                return;
            }
        };

        for url in &self.urls {
            let request = ApiRequest {
                method: Method::POST,
                url: url.clone(),
                headers: vec![(
                    CONTENT_TYPE.as_str().to_owned(),
                    String::from("application/json"),
                )],
                body: Some(body.clone()),
            };
            let outcome = match transport.send(request).await {
                Ok(response) if response.status >= 400 => Err(ApiError::UpstreamRejected {
                    status: response.status,
                    body: String::from_utf8_lossy(&response.body).into_owned(),
                }),
                Ok(_) => Ok(()),
                Err(err) => Err(err),
            };
            if let Err(err) = outcome {
                logging::warn(&ErrorChain::wrap(err, format!("notify {url}")));
            }
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("urls", &self.urls)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::Notifier;
    use crate::test_support::ScriptedTransport;

    #[tokio::test]
    async fn delivers_to_every_endpoint_and_swallows_failures() {
        let transport = ScriptedTransport::new();
        transport.push_status(500, "down");
        transport.push_status(200, "");
        let notifier = Notifier::new(
            vec![
                String::from("https://hooks.example/a"),
                String::from("   "),
                String::from(" https://hooks.example/b "),
            ],
            Arc::new(transport.clone()),
        );

        notifier.message("vm web powered on").await;

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url, "https://hooks.example/a");
        assert_eq!(requests[1].url, "https://hooks.example/b");
        let body = requests[1].body.clone().unwrap_or_default();
        assert_eq!(
            String::from_utf8_lossy(&body),
            r#"{"text":"vm web powered on"}"#
        );
    }

    #[tokio::test]
    async fn disabled_notifier_sends_nothing() {
        let notifier = Notifier::disabled();
        notifier.message("ignored").await;
        assert!(notifier.urls().is_empty());
    }
}
