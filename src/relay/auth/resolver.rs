//! Credential resolution: configured mode and credential string to strategy.

use tracing::error;

use crate::relay::config::AuthMode;
use crate::relay::error::ExecError;

use super::{AuthStrategy, KeyAuth, PasswordAuth};

/// Resolve the configured auth mode and credential string into an
/// authentication strategy.
///
/// For `PublicKey` the credential is a private-key file path that is not
/// touched here; loading happens inside the strategy at authentication time,
/// so bad key material fails at the connection boundary like any other
/// authentication failure.
///
/// An unsupported mode is rejected here, before any network activity.
pub fn resolve(mode: AuthMode, credential: &str) -> Result<Box<dyn AuthStrategy>, ExecError> {
    match mode {
        AuthMode::Password => Ok(Box::new(PasswordAuth::new(credential))),
        AuthMode::PublicKey => Ok(Box::new(KeyAuth::new(credential))),
        AuthMode::Unsupported(raw) => {
            error!("does not support auth mode: {}", raw);
            Err(ExecError::UnsupportedAuthMode(raw))
        }
    }
}
