//! Error kinds for the toggle pipeline and the profile registry.

use std::fmt;
use thiserror::Error;

/// Direction of a VCP exchange, used to label protocol failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcpOp {
    Get,
    Set,
}

impl fmt::Display for VcpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VcpOp::Get => f.write_str("get"),
            VcpOp::Set => f.write_str("set"),
        }
    }
}

/// A failure that aborts one profile's toggle.
#[derive(Debug, Error)]
pub enum ToggleError {
    /// The platform's display enumeration call itself failed.
    #[error("display enumeration failed: {0}")]
    Enumeration(String),

    /// Enumeration succeeded but no display had the profile's height.
    #[error("no display matches profile '{profile}' (height {height})")]
    NoMatchingDisplay { profile: String, height: i32 },

    /// More than one display matched and the match policy forbids guessing.
    #[error("{count} displays match profile '{profile}' (height {height})")]
    AmbiguousDisplay {
        profile: String,
        height: i32,
        count: usize,
    },

    /// Querying the physical monitors behind a matched display failed.
    #[error("physical monitor resolution failed: {0}")]
    Resolution(String),

    /// The matched display is not backed by any addressable physical monitor.
    #[error("display matched for '{0}' has no physical monitor")]
    NoPhysicalMonitor(String),

    /// A get/set exchange failed at the channel level.
    #[error("VCP {op} 0x{code:02X} failed: {message}")]
    Protocol {
        op: VcpOp,
        code: u8,
        message: String,
    },
}

impl ToggleError {
    pub fn protocol(op: VcpOp, code: u8, message: impl Into<String>) -> Self {
        ToggleError::Protocol {
            op,
            code,
            message: message.into(),
        }
    }
}

/// Problems building or querying the profile registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("profile '{0}' is defined more than once")]
    DuplicateProfile(String),

    #[error("profile '{name}' toggles between identical values ({value})")]
    IdenticalSources { name: String, value: u32 },

    #[error("arg \"{name}\" is not a valid monitor (configured: {known})")]
    UnknownProfile { name: String, known: String },
}
