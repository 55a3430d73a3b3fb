//! Authentication strategy trait definition.

use async_trait::async_trait;
use russh::client;

use crate::relay::session::RelayClientHandler;

/// Trait for SSH authentication strategies.
///
/// Implementations must be thread-safe (`Send + Sync`). Each strategy
/// represents one authentication mode.
#[async_trait]
pub trait AuthStrategy: Send + Sync + std::fmt::Debug {
    /// Attempt to authenticate with the SSH server.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Authentication succeeded
    /// * `Ok(false)` - Authentication failed (credentials rejected)
    /// * `Err(message)` - Error during the authentication attempt
    async fn authenticate(
        &self,
        handle: &mut client::Handle<RelayClientHandler>,
        username: &str,
    ) -> Result<bool, String>;

    /// Name of this strategy, for logging.
    fn name(&self) -> &'static str;
}
