//! Core library for the vSphere power bridge.
//!
//! The bridge exposes a small HTTP API that turns single calls such as
//! `POST /power/on/web-01` into the authenticated multi-step exchange the
//! vSphere REST API expects: log in, resolve the machine's display name to
//! its identifier, issue the power action, and log out again.
//!
//! Failures travel as [`chain::ErrorChain`] values, which keep a short
//! message for API callers and a location-annotated trace for the logs.

pub mod chain;
pub mod config;
pub mod logging;
pub mod notifier;
pub mod power;
pub mod routes;
pub mod test_support;
pub mod vsphere;

pub use chain::{ErrorChain, ResultExt};
pub use config::{BridgeConfig, ConfigError, ConfigOverrides};
pub use logging::{LogLevel, LogSettings, init_tracing};
pub use notifier::Notifier;
pub use power::{PowerAction, PowerExecutor, UnknownAction};
pub use routes::router;
pub use vsphere::{
    ApiError, Credentials, HttpTransport, ObjectId, PowerKind, PowerState, RemoteObject, Session,
    Transport, VsphereClient,
};
