//! Inventory records returned by the vSphere API.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

macro_rules! newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw value.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrows the raw value.
            #[must_use]
            pub const fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &Self::Target {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

newtype!(
    /// Stable upstream identifier of a virtual machine (for example `vm-42`).
    ObjectId
);

/// Classification of a reported power state.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PowerKind {
    /// The machine is running.
    PoweredOn,
    /// The machine is stopped.
    PoweredOff,
    /// The machine is suspended to memory or disk.
    Suspended,
    /// Any other value reported by the upstream.
    Other,
}

/// Power state exactly as reported by the upstream.
///
/// The upstream vocabulary is not closed and its spelling varies between
/// releases (`poweredOn`, `POWERED_ON`), so the raw value is kept and echoed
/// back unchanged; [`PowerState::kind`] classifies it.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PowerState(String);

impl PowerState {
    /// Raw upstream spelling.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Classifies the raw value, ignoring case and underscores.
    #[must_use]
    pub fn kind(&self) -> PowerKind {
        let normalised: String = self
            .0
            .chars()
            .filter(|ch| *ch != '_')
            .map(|ch| ch.to_ascii_lowercase())
            .collect();
        match normalised.as_str() {
            "poweredon" => PowerKind::PoweredOn,
            "poweredoff" => PowerKind::PoweredOff,
            "suspended" => PowerKind::Suspended,
            _ => PowerKind::Other,
        }
    }
}

impl From<String> for PowerState {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PowerState {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A virtual machine as listed by the inventory endpoint.
///
/// Records are decoded fresh for every lookup and never cached.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RemoteObject {
    /// Upstream identifier; older endpoints name this field `vm`.
    #[serde(alias = "vm")]
    pub id: ObjectId,
    /// Display name used as the external lookup key.
    pub name: String,
    /// Current power state.
    pub power_state: PowerState,
    /// Number of virtual CPUs, when reported.
    #[serde(default)]
    pub cpu_count: Option<u32>,
    /// Memory size in MiB, when reported.
    #[serde(rename = "memory_size_MiB", default)]
    pub memory_mib: Option<u64>,
}
