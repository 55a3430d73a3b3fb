//! Typed failure taxonomy for the relay.
//!
//! Failures fall into three layers:
//!
//! - [`ConfigError`]: startup-fatal problems reading the configuration file.
//! - [`ExecError`]: per-invocation failures anywhere in the connect/execute/
//!   close cycle. The invocation terminates, the process keeps serving.
//! - [`ChannelError`]: messaging-channel transport and API failures.
//!
//! The executor returns `ExecError` instead of swallowing failures; the
//! channel boundary decides what, if anything, the remote conversation sees.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Startup configuration failures. A read failure aborts the process.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not locate the executable directory: {0}")]
    ExeDir(std::io::Error),
}

/// Per-invocation execution failures.
///
/// Every variant is terminal for its invocation; there is no retry at any
/// transition. The next invocation starts the whole cycle over.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The configured auth mode is neither password nor public key.
    /// Raised before any network activity.
    #[error("unsupported auth mode: {0}")]
    UnsupportedAuthMode(i64),

    #[error("connection to {host}:{port} timed out after {timeout:?}")]
    ConnectTimeout {
        host: String,
        port: u16,
        timeout: Duration,
    },

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("authentication failed for {user}: {reason}")]
    AuthenticationFailed { user: String, reason: String },

    #[error("failed to open session channel: {0}")]
    SessionOpen(String),

    #[error("command execution failed: {0}")]
    Exec(String),

    #[error("command timed out after {0:?}")]
    CommandTimeout(Duration),
}

/// Messaging-channel failures.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("channel API rejected the request: {0}")]
    Api(String),
}
