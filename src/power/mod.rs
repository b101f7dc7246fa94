//! Power actions against named virtual machines.
//!
//! Every public operation opens its own [`Session`] and resolves the machine
//! by name on each call; nothing is cached between calls, including between
//! the two phases of a power cycle.

use std::fmt;
use std::str::FromStr;

use reqwest::Method;
use thiserror::Error;
use tracing::info;

use crate::chain::{ErrorChain, ResultExt};
use crate::notifier::Notifier;
use crate::vsphere::{ObjectId, PowerState, Session, VsphereClient};

/// Primitive power actions understood by the upstream.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PowerAction {
    /// Power on.
    Start,
    /// Power off.
    Stop,
    /// Hard reset.
    Reset,
    /// Suspend.
    Suspend,
}

impl PowerAction {
    /// Value of the upstream `action` query parameter.
    #[must_use]
    pub const fn as_query(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Reset => "reset",
            Self::Suspend => "suspend",
        }
    }

    const fn failure_context(self) -> &'static str {
        match self {
            Self::Start => "unable to power on virtual machine",
            Self::Stop => "unable to power off virtual machine",
            Self::Reset => "unable to reset virtual machine",
            Self::Suspend => "unable to suspend virtual machine",
        }
    }

    const fn outcome(self) -> &'static str {
        match self {
            Self::Start => "powered on",
            Self::Stop => "powered off",
            Self::Reset => "reset",
            Self::Suspend => "suspended",
        }
    }
}

impl fmt::Display for PowerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query())
    }
}

/// Raised when an action name is not recognised.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unknown power action '{0}'")]
pub struct UnknownAction(pub String);

impl FromStr for PowerAction {
    type Err = UnknownAction;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "on" | "start" => Ok(Self::Start),
            "off" | "stop" => Ok(Self::Stop),
            "reset" => Ok(Self::Reset),
            "suspend" => Ok(Self::Suspend),
            other => Err(UnknownAction(other.to_owned())),
        }
    }
}

enum Target<'a> {
    Named(&'a str),
    Known(&'a ObjectId),
}

/// Executes power operations through per-operation sessions.
#[derive(Clone, Debug)]
pub struct PowerExecutor {
    client: VsphereClient,
    notifier: Notifier,
}

impl PowerExecutor {
    /// Creates an executor.
    #[must_use]
    pub const fn new(client: VsphereClient, notifier: Notifier) -> Self {
        Self { client, notifier }
    }

    /// Returns the current power state of `name`.
    ///
    /// # Errors
    ///
    /// Returns the wrapped resolution failure.
    pub async fn get(
        &self,
        name: &str,
        authorization: Option<&str>,
    ) -> Result<PowerState, ErrorChain> {
        let mut session = self.client.session(authorization);
        let object = session
            .find_by_name(name)
            .await
            .context("unable to get virtual machine")?;
        Ok(object.power_state)
    }

    /// Resolves `name` and applies `action` to it within a single login.
    ///
    /// The upstream treats actions as idempotent; no state check is made
    /// here.
    ///
    /// # Errors
    ///
    /// Returns the wrapped authentication, resolution, or action failure.
    pub async fn set_power(
        &self,
        name: &str,
        action: PowerAction,
        authorization: Option<&str>,
    ) -> Result<(), ErrorChain> {
        self.perform(Target::Named(name), action, authorization)
            .await
            .context(action.failure_context())?;
        self.announce(name, action.outcome());
        Ok(())
    }

    /// Applies `action` to an already known identifier, skipping resolution.
    ///
    /// # Errors
    ///
    /// Returns the wrapped authentication or action failure.
    pub async fn set_power_by_id(
        &self,
        id: &ObjectId,
        action: PowerAction,
        authorization: Option<&str>,
    ) -> Result<(), ErrorChain> {
        self.perform(Target::Known(id), action, authorization)
            .await
            .context(action.failure_context())?;
        self.announce(id, action.outcome());
        Ok(())
    }

    /// Powers `name` off and, only if that succeeded, on again.
    ///
    /// Each phase resolves the machine independently. A failed stop is
    /// reported without attempting the start, which can leave the machine
    /// powered off.
    ///
    /// # Errors
    ///
    /// Returns the wrapped failure of whichever phase failed first.
    pub async fn cycle(&self, name: &str, authorization: Option<&str>) -> Result<(), ErrorChain> {
        self.perform(Target::Named(name), PowerAction::Stop, authorization)
            .await
            .context(PowerAction::Stop.failure_context())?;
        self.perform(Target::Named(name), PowerAction::Start, authorization)
            .await
            .context(PowerAction::Start.failure_context())?;
        self.announce(name, "power cycled");
        Ok(())
    }

    async fn perform(
        &self,
        target: Target<'_>,
        action: PowerAction,
        authorization: Option<&str>,
    ) -> Result<(), ErrorChain> {
        let mut session = self.client.session(authorization);
        let performed_login = session.begin().await?;
        let result = Self::act(&mut session, target, action).await;
        session.finish(performed_login).await;
        result
    }

    async fn act(
        session: &mut Session,
        target: Target<'_>,
        action: PowerAction,
    ) -> Result<(), ErrorChain> {
        let id = match target {
            Target::Known(id) => id.clone(),
            Target::Named(name) => {
                session
                    .find_by_name(name)
                    .await
                    .context("unable to find virtual machine")?
                    .id
            }
        };

        session
            .authenticated_request(
                Method::POST,
                &format!("object/{id}/power?action={}", action.as_query()),
                None,
            )
            .await
            .context("unable to perform virtual machine power action")?;

        info!(operation = %session.operation_id(), %id, %action, "power action applied");
        Ok(())
    }

    /// Hands the notification to a background task so a slow webhook never
    /// delays the caller.
    fn announce(&self, subject: &str, outcome: &str) {
        if self.notifier.urls().is_empty() {
            return;
        }
        let notifier = self.notifier.clone();
        let text = format!("virtual machine {subject} {outcome}");
        tokio::spawn(async move {
            notifier.message(&text).await;
        });
    }
}
