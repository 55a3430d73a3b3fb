//! Password-based SSH authentication.

use async_trait::async_trait;
use russh::client;

use crate::relay::session::RelayClientHandler;

use super::traits::AuthStrategy;

/// Password authentication strategy.
///
/// The configured credential string is used byte-for-byte as the login
/// password; no validation is applied to its contents.
#[derive(Debug)]
pub struct PasswordAuth {
    password: String,
}

impl PasswordAuth {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }
}

#[async_trait]
impl AuthStrategy for PasswordAuth {
    async fn authenticate(
        &self,
        handle: &mut client::Handle<RelayClientHandler>,
        username: &str,
    ) -> Result<bool, String> {
        let result = handle
            .authenticate_password(username, &self.password)
            .await
            .map_err(|e| format!("password authentication failed: {}", e))?;

        Ok(result.success())
    }

    fn name(&self) -> &'static str {
        "password"
    }
}
