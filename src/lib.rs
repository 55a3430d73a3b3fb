//! Telegram-driven remote command relay over SSH.
//!
//! Receives text commands from a messaging channel and executes them on a
//! single configured remote host, returning the combined stdout/stderr back
//! to the originating conversation. Every command runs over a brand-new SSH
//! connection that is torn down before the next message is processed.

pub mod relay;
