//! Per-command SSH connection lifecycle.
//!
//! Every invocation walks the full
//! `Idle -> Dialing -> Authenticating -> SessionOpen -> Executing -> Closing`
//! cycle against a brand-new connection: credentials are resolved fresh, the
//! transport is dialed under a bounded connect timeout, one exec channel runs
//! the command, and both the channel and the connection are torn down before
//! [`CommandExecutor::run`] returns, whether the command succeeded or not.
//!
//! Opening a fresh connection per command trades throughput for simplicity.
//! The [`Connector`] seam exists so a pooling strategy can be swapped in
//! without changing `run`'s contract.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::{ChannelMsg, Disconnect, client};
use tokio::time::timeout;
use tracing::{debug, warn};

use super::auth::{self, AuthStrategy};
use super::config::{AuthMode, Config, RuntimeSettings};
use super::error::ExecError;
use super::session::{HostVerification, RelayClientHandler};
use super::types::{CombinedBuffer, Target};

/// One live, authenticated connection to the remote host.
///
/// A connection serves at most one exec session; the executor closes it
/// after that session ends.
#[async_trait]
pub trait Connection: Send {
    /// Open a session channel, run `command`, and capture its combined
    /// stdout/stderr output as text.
    async fn exec(&mut self, command: &str) -> Result<String, ExecError>;

    /// Close the underlying transport. The executor calls this exactly once
    /// per connection, on every path.
    async fn close(&mut self) -> Result<(), ExecError>;
}

/// Connection-establishment strategy.
///
/// The default [`SshConnector`] dials a fresh connection for every command.
/// Alternative implementations (pooling, multiplexing) must still hand the
/// executor a connection it may close after one session.
#[async_trait]
pub trait Connector: Send + Sync {
    type Conn: Connection;

    /// Dial, handshake, and authenticate against `target`.
    async fn connect(
        &self,
        target: &Target,
        auth: Box<dyn AuthStrategy>,
    ) -> Result<Self::Conn, ExecError>;
}

/// Fresh-connection-per-command SSH transport.
pub struct SshConnector {
    verification: HostVerification,
    known_hosts_path: Option<PathBuf>,
}

impl SshConnector {
    pub fn new(verification: HostVerification, known_hosts_path: Option<PathBuf>) -> Self {
        Self {
            verification,
            known_hosts_path,
        }
    }

    fn client_config() -> Arc<client::Config> {
        Arc::new(client::Config {
            keepalive_interval: Some(Duration::from_secs(30)),
            keepalive_max: 3,
            ..Default::default()
        })
    }

    async fn hang_up(handle: &client::Handle<RelayClientHandler>) {
        if let Err(err) = handle.disconnect(Disconnect::ByApplication, "", "en").await {
            warn!("failed to close connection: {}", err);
        }
    }
}

#[async_trait]
impl Connector for SshConnector {
    type Conn = SshConnection;

    async fn connect(
        &self,
        target: &Target,
        auth: Box<dyn AuthStrategy>,
    ) -> Result<SshConnection, ExecError> {
        let handler = RelayClientHandler::new(
            target.host.clone(),
            target.port,
            self.verification,
            self.known_hosts_path.clone(),
        );

        let mut handle = client::connect(
            Self::client_config(),
            (target.host.as_str(), target.port),
            handler,
        )
        .await
        .map_err(|e| ExecError::Connection(e.to_string()))?;

        debug!("authenticating as {} via {}", target.user, auth.name());
        let authenticated = match auth.authenticate(&mut handle, &target.user).await {
            Ok(ok) => ok,
            Err(reason) => {
                Self::hang_up(&handle).await;
                return Err(ExecError::AuthenticationFailed {
                    user: target.user.clone(),
                    reason,
                });
            }
        };

        if !authenticated {
            Self::hang_up(&handle).await;
            return Err(ExecError::AuthenticationFailed {
                user: target.user.clone(),
                reason: "credentials rejected".to_string(),
            });
        }

        Ok(SshConnection { handle })
    }
}

/// An authenticated russh connection carrying one exec session.
pub struct SshConnection {
    handle: client::Handle<RelayClientHandler>,
}

#[async_trait]
impl Connection for SshConnection {
    async fn exec(&mut self, command: &str) -> Result<String, ExecError> {
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| ExecError::SessionOpen(e.to_string()))?;

        channel
            .exec(true, command)
            .await
            .map_err(|e| ExecError::Exec(format!("failed to start command: {}", e)))?;

        let mut output = CombinedBuffer::new();
        let mut exit_code: Option<u32> = None;

        loop {
            match channel.wait().await {
                Some(ChannelMsg::Data { data }) => {
                    output.push(&data);
                }
                Some(ChannelMsg::ExtendedData { data, ext }) => {
                    // ext == 1 is stderr in the SSH protocol; it lands in the
                    // same buffer so the result keeps emission order.
                    if ext == 1 {
                        output.push(&data);
                    }
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    exit_code = Some(exit_status);
                }
                Some(ChannelMsg::Eof) => {
                    if exit_code.is_some() {
                        break;
                    }
                }
                Some(ChannelMsg::Close) => {
                    break;
                }
                Some(_) => {
                    // Ignore other message types
                }
                None => {
                    // Channel closed
                    break;
                }
            }
        }

        // A non-zero exit status is not an execution failure; the captured
        // text is the result either way.
        if let Some(code) = exit_code
            && code != 0
        {
            warn!("remote command exited with status {}", code);
        }

        if let Err(err) = channel.close().await {
            warn!("failed to close session channel: {}", err);
        }

        Ok(output.into_text())
    }

    async fn close(&mut self) -> Result<(), ExecError> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(|e| ExecError::Connection(e.to_string()))
    }
}

/// Executes one command at a time against the configured remote target.
pub struct CommandExecutor<C: Connector = SshConnector> {
    target: Target,
    mode: AuthMode,
    credential: String,
    connect_timeout: Duration,
    command_timeout: Option<Duration>,
    connector: C,
}

impl CommandExecutor<SshConnector> {
    /// Build the default fresh-connection executor from the loaded
    /// configuration and runtime settings.
    pub fn from_config(config: &Config, settings: &RuntimeSettings) -> Self {
        let connector = SshConnector::new(
            settings.host_verification,
            settings.known_hosts_path.clone(),
        );
        Self::new(
            Target {
                host: config.ssh.host.clone(),
                port: config.ssh.port,
                user: config.ssh.user.clone(),
            },
            config.ssh.mode,
            config.ssh.cert.clone(),
            settings.connect_timeout,
            settings.command_timeout,
            connector,
        )
    }
}

impl<C: Connector> CommandExecutor<C> {
    pub fn new(
        target: Target,
        mode: AuthMode,
        credential: String,
        connect_timeout: Duration,
        command_timeout: Option<Duration>,
        connector: C,
    ) -> Self {
        Self {
            target,
            mode,
            credential,
            connect_timeout,
            command_timeout,
            connector,
        }
    }

    /// Run one command on the remote target and return its combined output.
    ///
    /// Credentials are resolved fresh, a new connection is dialed, one
    /// session channel executes the command, and the connection is closed
    /// before this returns, on every path. A close failure is logged and
    /// never alters the returned result.
    pub async fn run(&self, command: &str) -> Result<String, ExecError> {
        let auth = auth::resolve(self.mode, &self.credential)?;

        let mut connection = match timeout(
            self.connect_timeout,
            self.connector.connect(&self.target, auth),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(ExecError::ConnectTimeout {
                    host: self.target.host.clone(),
                    port: self.target.port,
                    timeout: self.connect_timeout,
                });
            }
        };

        let result = match self.command_timeout {
            Some(limit) => match timeout(limit, connection.exec(command)).await {
                Ok(result) => result,
                Err(_) => Err(ExecError::CommandTimeout(limit)),
            },
            None => connection.exec(command).await,
        };

        if let Err(err) = connection.close().await {
            warn!(
                "failed to close connection to {}: {}",
                self.target.address(),
                err
            );
        }

        result
    }
}
