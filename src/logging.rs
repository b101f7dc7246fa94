//! Tracing initialisation and the error logging boundary.
//!
//! Anything logged as an error is classified once into a [`LogPayload`]:
//! chains render with their full trace, foreign errors with their message,
//! and plain values as-is.

use std::error::Error;
use std::fmt;
use std::str::FromStr;

use tracing_subscriber::{EnvFilter, fmt as subscriber_fmt, prelude::*};

use crate::chain::ErrorChain;

/// Verbosity accepted by [`init_tracing`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Warnings and errors.
    Warn,
    /// Informational messages and above.
    #[default]
    Info,
    /// Debug output and above.
    Debug,
    /// Everything.
    Trace,
}

impl LogLevel {
    /// Directive understood by [`EnvFilter`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Raised when a log level name is not recognised.
#[derive(Clone, Debug, thiserror::Error, Eq, PartialEq)]
#[error("unknown log level '{0}' (expected error, warn, info, debug or trace)")]
pub struct UnknownLogLevel(pub String);

impl FromStr for LogLevel {
    type Err = UnknownLogLevel;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(UnknownLogLevel(value.to_owned())),
        }
    }
}

/// Output settings for the process-wide subscriber.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LogSettings {
    /// Minimum level emitted.
    pub level: LogLevel,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

/// Installs the global subscriber. Later calls are ignored.
pub fn init_tracing(settings: LogSettings) {
    let filter = EnvFilter::new(settings.level.as_str());
    let base = subscriber_fmt::layer().with_target(true);
    let layer = if settings.json {
        base.json().boxed()
    } else {
        base.boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .ok();
}

/// Something handed to the logger, classified once.
#[derive(Debug)]
pub enum LogPayload<'a> {
    /// One of our own chains; logged with its full trace.
    Chain(&'a ErrorChain),
    /// Any other error; logged with its message.
    Foreign(&'a (dyn Error + 'static)),
    /// A plain message.
    Plain(String),
}

impl<'a> LogPayload<'a> {
    /// Classifies an arbitrary error.
    #[must_use]
    pub fn classify(err: &'a (dyn Error + 'static)) -> Self {
        match err.downcast_ref::<ErrorChain>() {
            Some(chain) => Self::Chain(chain),
            None => Self::Foreign(err),
        }
    }
}

impl fmt::Display for LogPayload<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chain(chain) => f.write_str(&chain.full_trace()),
            Self::Foreign(err) => write!(f, "{err}"),
            Self::Plain(message) => f.write_str(message),
        }
    }
}

impl<'a> From<&'a ErrorChain> for LogPayload<'a> {
    fn from(value: &'a ErrorChain) -> Self {
        Self::Chain(value)
    }
}

impl From<String> for LogPayload<'_> {
    fn from(value: String) -> Self {
        Self::Plain(value)
    }
}

impl From<&str> for LogPayload<'_> {
    fn from(value: &str) -> Self {
        Self::Plain(value.to_owned())
    }
}

/// Logs `payload` at error level.
pub fn error<'a>(payload: impl Into<LogPayload<'a>>) {
    tracing::error!("{}", payload.into());
}

/// Logs `payload` at warn level.
pub fn warn<'a>(payload: impl Into<LogPayload<'a>>) {
    tracing::warn!("{}", payload.into());
}
