//! Configuration loading and runtime tunables.
//!
//! The configuration file is read once at startup from `config.json` next to
//! the running executable. A missing or unreadable file is fatal. A present
//! but malformed file logs an error and leaves the process running with the
//! zero-valued configuration, whose auth mode is unsupported, so every
//! invocation fails before any network activity.
//!
//! Runtime tunables resolve with a three-tier priority system:
//!
//! 1. **Parameter** - Explicitly provided function parameter (highest priority)
//! 2. **Environment Variable** - Value from environment variable
//! 3. **Default** - Built-in default value (lowest priority)
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RELAY_CONNECT_TIMEOUT` | 3s | Connect + handshake timeout in seconds |
//! | `RELAY_COMMAND_TIMEOUT` | unbounded | Command execution timeout in seconds (0 disables) |
//! | `RELAY_POLL_TIMEOUT` | 60s | Long-poll wait on the update feed |
//! | `RELAY_HOST_VERIFICATION` | known-hosts | Host-key policy (`known-hosts`, `tofu`, `accept-any`) |
//! | `RELAY_KNOWN_HOSTS` | ~/.ssh/known_hosts | Known-hosts file override |

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs, io};

use serde::Deserialize;
use tracing::error;

use super::error::ConfigError;
use super::session::HostVerification;

/// Configuration file name, resolved relative to the executable.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Default connect timeout in seconds.
pub(crate) const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 3;

/// Default long-poll wait in seconds.
pub(crate) const DEFAULT_POLL_TIMEOUT_SECS: u64 = 60;

/// Environment variable name for the connect timeout
pub(crate) const CONNECT_TIMEOUT_ENV_VAR: &str = "RELAY_CONNECT_TIMEOUT";

/// Environment variable name for the command execution timeout
pub(crate) const COMMAND_TIMEOUT_ENV_VAR: &str = "RELAY_COMMAND_TIMEOUT";

/// Environment variable name for the long-poll wait
pub(crate) const POLL_TIMEOUT_ENV_VAR: &str = "RELAY_POLL_TIMEOUT";

/// Environment variable name for the host-key policy
pub(crate) const HOST_VERIFICATION_ENV_VAR: &str = "RELAY_HOST_VERIFICATION";

/// Environment variable name for the known-hosts file override
pub(crate) const KNOWN_HOSTS_ENV_VAR: &str = "RELAY_KNOWN_HOSTS";

/// Authentication mode selector.
///
/// The configuration file carries the mode as an integer: 1 selects password
/// authentication, 2 selects private-key authentication. Any other value is
/// preserved as-is and rejected at credential resolution time, before any
/// network activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Password,
    PublicKey,
    Unsupported(i64),
}

impl Default for AuthMode {
    fn default() -> Self {
        AuthMode::Unsupported(0)
    }
}

impl From<i64> for AuthMode {
    fn from(raw: i64) -> Self {
        match raw {
            1 => AuthMode::Password,
            2 => AuthMode::PublicKey,
            other => AuthMode::Unsupported(other),
        }
    }
}

impl<'de> Deserialize<'de> for AuthMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        Ok(AuthMode::from(i64::deserialize(deserializer)?))
    }
}

/// Root of the configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ssh: SshConfig,
}

/// Remote target and channel credentials.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SshConfig {
    pub user: String,
    pub host: String,
    pub port: u16,
    /// Password or private-key file path, depending on `mode`.
    pub cert: String,
    /// Messaging-channel access token.
    pub token: String,
    /// Outbound SOCKS5 proxy address; empty for a direct connection.
    pub proxy: String,
    pub mode: AuthMode,
}

impl Config {
    /// Path of the configuration file next to the running executable.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let exe = env::current_exe().map_err(ConfigError::ExeDir)?;
        let dir = exe
            .parent()
            .ok_or_else(|| ConfigError::ExeDir(io::Error::other("executable has no parent")))?;
        Ok(dir.join(CONFIG_FILE_NAME))
    }

    /// Load the configuration from `path`.
    ///
    /// A read failure is returned to the caller and is startup-fatal. A
    /// parse failure is logged and yields the zero-valued default
    /// configuration, keeping the process alive in a degraded state.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        match serde_json::from_str(&raw) {
            Ok(config) => Ok(config),
            Err(err) => {
                error!(
                    "malformed configuration file {}: {}; continuing with defaults",
                    path.display(),
                    err
                );
                Ok(Self::default())
            }
        }
    }
}

/// Runtime tunables resolved from the environment at startup.
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub connect_timeout: Duration,
    /// `None` leaves command execution unbounded.
    pub command_timeout: Option<Duration>,
    pub poll_timeout: Duration,
    pub host_verification: HostVerification,
    pub known_hosts_path: Option<PathBuf>,
}

impl RuntimeSettings {
    pub fn from_env() -> Self {
        Self {
            connect_timeout: Duration::from_secs(resolve_connect_timeout(None)),
            command_timeout: resolve_command_timeout(None).map(Duration::from_secs),
            poll_timeout: Duration::from_secs(resolve_poll_timeout(None)),
            host_verification: resolve_host_verification(None),
            known_hosts_path: resolve_known_hosts_path(None),
        }
    }
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            command_timeout: None,
            poll_timeout: Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS),
            host_verification: HostVerification::default(),
            known_hosts_path: None,
        }
    }
}

/// Resolve the connect timeout with priority: parameter -> env var -> default
pub(crate) fn resolve_connect_timeout(timeout_param: Option<u64>) -> u64 {
    if let Some(timeout) = timeout_param {
        return timeout;
    }

    if let Ok(env_timeout) = env::var(CONNECT_TIMEOUT_ENV_VAR)
        && let Ok(timeout) = env_timeout.parse::<u64>()
    {
        return timeout;
    }

    DEFAULT_CONNECT_TIMEOUT_SECS
}

/// Resolve the command execution timeout. Zero or unset disables the bound,
/// leaving a hung remote command able to block the relay indefinitely.
pub(crate) fn resolve_command_timeout(timeout_param: Option<u64>) -> Option<u64> {
    let raw = if let Some(timeout) = timeout_param {
        timeout
    } else if let Ok(env_timeout) = env::var(COMMAND_TIMEOUT_ENV_VAR)
        && let Ok(timeout) = env_timeout.parse::<u64>()
    {
        timeout
    } else {
        0
    };

    if raw == 0 { None } else { Some(raw) }
}

/// Resolve the long-poll wait with priority: parameter -> env var -> default
pub(crate) fn resolve_poll_timeout(timeout_param: Option<u64>) -> u64 {
    if let Some(timeout) = timeout_param {
        return timeout;
    }

    if let Ok(env_timeout) = env::var(POLL_TIMEOUT_ENV_VAR)
        && let Ok(timeout) = env_timeout.parse::<u64>()
    {
        return timeout;
    }

    DEFAULT_POLL_TIMEOUT_SECS
}

/// Resolve the host-key policy; unrecognized values fall back to the default.
pub(crate) fn resolve_host_verification(
    policy_param: Option<HostVerification>,
) -> HostVerification {
    if let Some(policy) = policy_param {
        return policy;
    }

    if let Ok(raw) = env::var(HOST_VERIFICATION_ENV_VAR)
        && let Some(policy) = HostVerification::parse(&raw)
    {
        return policy;
    }

    HostVerification::default()
}

/// Resolve the known-hosts file override; `None` uses ~/.ssh/known_hosts.
pub(crate) fn resolve_known_hosts_path(path_param: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = path_param {
        return Some(path);
    }

    if let Ok(raw) = env::var(KNOWN_HOSTS_ENV_VAR)
        && !raw.is_empty()
    {
        return Some(PathBuf::from(raw));
    }

    None
}
