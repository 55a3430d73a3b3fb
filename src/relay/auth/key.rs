//! Private key file SSH authentication.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use russh::{client, keys};
use tracing::debug;

use crate::relay::session::RelayClientHandler;

use super::traits::AuthStrategy;

/// Private-key file authentication strategy.
///
/// The key file is read and parsed only when `authenticate` runs, so a bad
/// path or unparsable key surfaces as an authentication failure at the
/// connection boundary rather than as an earlier resolution error. Supports
/// passphrase-less keys.
#[derive(Debug)]
pub struct KeyAuth {
    key_path: PathBuf,
}

impl KeyAuth {
    pub fn new(key_path: impl Into<PathBuf>) -> Self {
        Self {
            key_path: key_path.into(),
        }
    }

    fn load_key(&self) -> Result<keys::PrivateKey, String> {
        keys::load_secret_key(&self.key_path, None)
            .map_err(|e| format!("failed to load private key from {:?}: {}", self.key_path, e))
    }
}

#[async_trait]
impl AuthStrategy for KeyAuth {
    async fn authenticate(
        &self,
        handle: &mut client::Handle<RelayClientHandler>,
        username: &str,
    ) -> Result<bool, String> {
        let key_pair = self.load_key()?;

        // For RSA keys, use the best supported hash algorithm
        let hash_alg = handle
            .best_supported_rsa_hash()
            .await
            .ok()
            .flatten()
            .flatten();
        debug!("using RSA hash algorithm for key auth: {:?}", hash_alg);

        let key_with_hash = keys::PrivateKeyWithHashAlg::new(Arc::new(key_pair), hash_alg);

        let result = handle
            .authenticate_publickey(username, key_with_hash)
            .await
            .map_err(|e| format!("key authentication failed: {}", e))?;

        Ok(result.success())
    }

    fn name(&self) -> &'static str {
        "key"
    }
}
