//! Remote command relay over SSH.
//!
//! This module is organized into the following submodules:
//!
//! - `config`: configuration file loading and runtime tunables
//! - `error`: typed failure taxonomy
//! - `types`: remote target address and combined output buffer
//! - `session`: host-key verification policy and client handler
//! - `auth`: credential resolution strategies
//! - `executor`: per-command connection lifecycle
//! - `channel`: messaging-channel boundary and Telegram adapter

pub mod auth;
pub mod channel;
pub mod config;
pub mod error;
pub mod executor;
pub mod session;
pub mod types;

pub use channel::{MessageChannel, TelegramChannel, serve};
pub use config::{AuthMode, Config, RuntimeSettings};
pub use executor::{CommandExecutor, SshConnector};
