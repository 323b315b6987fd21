//! Server configuration
//!
//! Loadable from a TOML file; every field has a default so a partial
//! file works. The daemon's CLI flags override file values.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Result;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 34403;

/// Why a handshake version tuple was rejected. The display text is the
/// exact wire message sent back in the error frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("Client out of date (expected at least {min_major}.{min_minor})")]
    TooOld { min_major: u8, min_minor: u8 },

    #[error("Client too new (expected at most {max_major}.{max_minor})")]
    TooNew { max_major: u8, max_minor: u8 },

    #[error("Script version mismatch (expected {expected})")]
    ScriptMismatch { expected: u8 },
}

/// Inclusive `(major, minor)` acceptance window plus an exact script
/// version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionWindow {
    pub min_major: u8,
    pub min_minor: u8,
    pub max_major: u8,
    pub max_minor: u8,
    pub script: u8,
}

impl Default for VersionWindow {
    fn default() -> Self {
        Self {
            min_major: 1,
            min_minor: 0,
            max_major: 1,
            max_minor: 9,
            script: 0,
        }
    }
}

impl VersionWindow {
    /// Check a handshake version tuple. The window comparison is
    /// lexicographic, major first; the script byte must match exactly.
    pub fn check(&self, major: u8, minor: u8, script: u8) -> std::result::Result<(), VersionError> {
        if (major, minor) < (self.min_major, self.min_minor) {
            return Err(VersionError::TooOld {
                min_major: self.min_major,
                min_minor: self.min_minor,
            });
        }
        if (major, minor) > (self.max_major, self.max_minor) {
            return Err(VersionError::TooNew {
                max_major: self.max_major,
                max_minor: self.max_minor,
            });
        }
        if script != self.script {
            return Err(VersionError::ScriptMismatch {
                expected: self.script,
            });
        }
        Ok(())
    }
}

/// Relay server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Accepted client version window.
    pub version: VersionWindow,
    /// Seconds without read activity before a session is dropped.
    pub idle_timeout_secs: u64,
    /// Absolute cap on declared stamp / sync payload lengths. The wire's
    /// 3-byte length field allows up to 16 MiB; this bounds memory.
    pub max_stamp_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            version: VersionWindow::default(),
            idle_timeout_secs: 90,
            max_stamp_bytes: 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file. Missing fields fall back to
    /// their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    /// The `host:port` string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
