//! Configuration loading via `ortho-config`.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::logging::{LogLevel, LogSettings};
use crate::vsphere::Credentials;

/// Bridge configuration derived from environment variables, configuration
/// files, and CLI flags.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "VSPHERE")]
pub struct BridgeConfig {
    /// Base URL of the vSphere instance including scheme, for example
    /// `https://vsphere.local`. Required.
    #[ortho_config(default = String::new())]
    pub fqdn: String,
    /// Username for an account with API access.
    pub username: Option<String>,
    /// Password for an account with API access.
    pub password: Option<String>,
    /// Pre-computed `Authorization` header value used for every login.
    pub authorization: Option<String>,
    /// Skip TLS certificate validation when talking to vSphere.
    #[ortho_config(default = false)]
    pub insecure: bool,
    /// Port the bridge listens on. Defaults to 8000.
    #[ortho_config(default = 8000)]
    pub port: u16,
    /// Comma separated webhook URLs notified after power changes.
    pub notify_url: Option<String>,
    /// Upper bound, in seconds, for each upstream call. Defaults to 30.
    #[ortho_config(default = 30)]
    pub timeout_secs: u64,
    /// Minimum log level (`error`, `warn`, `info`, `debug`, `trace`).
    #[ortho_config(default = "info".to_owned())]
    pub log_level: String,
    /// Emit logs as JSON lines.
    #[ortho_config(default = false)]
    pub log_json: bool,
}

/// Values supplied on the command line; these win over every other source.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConfigOverrides {
    /// Replacement for [`BridgeConfig::fqdn`].
    pub fqdn: Option<String>,
    /// Forces [`BridgeConfig::insecure`] on when set.
    pub insecure: bool,
    /// Replacement for [`BridgeConfig::port`].
    pub port: Option<u16>,
    /// Replacement for [`BridgeConfig::notify_url`].
    pub notify_url: Option<String>,
    /// Replacement for [`BridgeConfig::log_level`].
    pub log_level: Option<String>,
}

struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    flag: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, flag: &'static str) -> Self {
        Self {
            description,
            env_var,
            flag,
        }
    }
}

const FQDN: FieldMetadata = FieldMetadata::new("vSphere FQDN", "VSPHERE_FQDN", "--fqdn");
const TIMEOUT: FieldMetadata =
    FieldMetadata::new("upstream timeout", "VSPHERE_TIMEOUT_SECS", "the timeout_secs key");
const LOG_LEVEL: FieldMetadata =
    FieldMetadata::new("log level", "VSPHERE_LOG_LEVEL", "--log-level");

impl BridgeConfig {
    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("vsphere-bridge")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Applies command-line overrides on top of the loaded values.
    #[must_use]
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(fqdn) = overrides.fqdn.filter(|value| !value.trim().is_empty()) {
            self.fqdn = fqdn;
        }
        if overrides.insecure {
            self.insecure = true;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(notify_url) = overrides.notify_url.filter(|value| !value.trim().is_empty()) {
            self.notify_url = Some(notify_url);
        }
        if let Some(level) = overrides.log_level.filter(|value| !value.trim().is_empty()) {
            self.log_level = level;
        }
        self
    }

    /// Performs semantic validation. Error messages name the environment
    /// variable or flag that supplies the offending value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when the FQDN is empty and
    /// [`ConfigError::InvalidValue`] when a value cannot be interpreted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server_url()?;
        if self.timeout_secs == 0 {
            return Err(invalid(&TIMEOUT, "must be greater than zero"));
        }
        self.log_settings()?;
        Ok(())
    }

    /// Parses the FQDN into a base URL with any trailing `/` removed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the FQDN is missing, unparsable, or not
    /// an `http`/`https` URL.
    pub fn server_url(&self) -> Result<Url, ConfigError> {
        let raw = self.fqdn.trim().trim_end_matches('/');
        if raw.is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or pass {}",
                FQDN.description, FQDN.env_var, FQDN.flag
            )));
        }
        let url = Url::parse(raw).map_err(|err| invalid(&FQDN, &err.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(invalid(
                &FQDN,
                "expected an http or https URL such as https://vsphere.local",
            ));
        }
        Ok(url)
    }

    /// Credentials resolved from the username, password, and header fields.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(
            self.authorization.clone(),
            self.username.clone(),
            self.password.clone(),
        )
    }

    /// Notification endpoints parsed from the comma separated list.
    #[must_use]
    pub fn notify_urls(&self) -> Vec<String> {
        self.notify_url
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|url| !url.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Per-call upstream timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Logging settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an unknown level name.
    pub fn log_settings(&self) -> Result<LogSettings, ConfigError> {
        let level = self
            .log_level
            .parse::<LogLevel>()
            .map_err(|err| invalid(&LOG_LEVEL, &err.to_string()))?;
        Ok(LogSettings {
            level,
            json: self.log_json,
        })
    }
}

fn invalid(metadata: &FieldMetadata, reason: &str) -> ConfigError {
    ConfigError::InvalidValue(format!(
        "invalid {}: {reason}; check {} or {}",
        metadata.description, metadata.env_var, metadata.flag
    ))
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a configuration value cannot be interpreted.
    #[error("invalid configuration value: {0}")]
    InvalidValue(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
