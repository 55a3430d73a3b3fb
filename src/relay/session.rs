//! Host-key verification for the SSH transport.
//!
//! The handler enforces one of three policies. `KnownHosts` (the default)
//! requires the server key to match the known-hosts file. `TrustOnFirstUse`
//! records unknown hosts and rejects changed keys. `AcceptAny` accepts every
//! server key, similar to `StrictHostKeyChecking=no` in OpenSSH; it exists
//! for compatibility and is vulnerable to on-path impersonation, so every
//! acceptance under it is logged as a warning.

use std::path::PathBuf;

use russh::keys::known_hosts::{learn_known_hosts, learn_known_hosts_path};
use russh::keys::{check_known_hosts, check_known_hosts_path};
use russh::{client, keys};
use tracing::warn;

/// Host-key verification policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostVerification {
    /// Require the server key to be present in known_hosts.
    #[default]
    KnownHosts,
    /// Accept and record unknown hosts; reject changed keys.
    TrustOnFirstUse,
    /// Accept every server key without verification.
    AcceptAny,
}

impl HostVerification {
    /// Parse a policy name, returning `None` for unrecognized input.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "known-hosts" | "known_hosts" | "strict" => Some(Self::KnownHosts),
            "tofu" | "trust-on-first-use" => Some(Self::TrustOnFirstUse),
            "accept-any" | "accept-all" | "none" => Some(Self::AcceptAny),
            _ => None,
        }
    }
}

/// Client handler for russh enforcing the configured host-key policy.
pub struct RelayClientHandler {
    host: String,
    port: u16,
    policy: HostVerification,
    /// Override for the known-hosts file; `None` uses ~/.ssh/known_hosts.
    known_hosts_path: Option<PathBuf>,
}

impl RelayClientHandler {
    pub fn new(
        host: String,
        port: u16,
        policy: HostVerification,
        known_hosts_path: Option<PathBuf>,
    ) -> Self {
        Self {
            host,
            port,
            policy,
            known_hosts_path,
        }
    }

    fn check(&self, key: &keys::PublicKey) -> Result<bool, keys::Error> {
        match &self.known_hosts_path {
            Some(path) => check_known_hosts_path(&self.host, self.port, key, path),
            None => check_known_hosts(&self.host, self.port, key),
        }
    }

    fn learn(&self, key: &keys::PublicKey) -> Result<(), keys::Error> {
        match &self.known_hosts_path {
            Some(path) => learn_known_hosts_path(&self.host, self.port, key, path),
            None => learn_known_hosts(&self.host, self.port, key),
        }
    }
}

impl client::Handler for RelayClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &keys::PublicKey,
    ) -> Result<bool, Self::Error> {
        match self.policy {
            HostVerification::AcceptAny => {
                warn!(
                    "accepting unverified host key for {}:{}",
                    self.host, self.port
                );
                Ok(true)
            }
            HostVerification::KnownHosts => match self.check(server_public_key) {
                Ok(known) => Ok(known),
                Err(keys::Error::KeyChanged { .. }) => Ok(false),
                Err(err) => {
                    warn!(
                        "host key lookup failed for {}:{}: {}",
                        self.host, self.port, err
                    );
                    Ok(false)
                }
            },
            HostVerification::TrustOnFirstUse => match self.check(server_public_key) {
                Ok(true) => Ok(true),
                Ok(false) => {
                    warn!(
                        "trust-on-first-use: recording host key for {}:{}",
                        self.host, self.port
                    );
                    if let Err(err) = self.learn(server_public_key) {
                        warn!("failed to record host key: {}", err);
                    }
                    Ok(true)
                }
                Err(keys::Error::KeyChanged { .. }) => Ok(false),
                Err(err) => {
                    warn!(
                        "host key lookup failed for {}:{}: {}",
                        self.host, self.port, err
                    );
                    Ok(true)
                }
            },
        }
    }
}
