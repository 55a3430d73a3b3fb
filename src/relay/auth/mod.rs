//! Authentication strategies for the SSH connection.
//!
//! A trait-based strategy system with one implementation per supported
//! authentication mode:
//!
//! - [`PasswordAuth`]: the credential string is the login password
//! - [`KeyAuth`]: the credential string is a private-key file path
//!
//! [`resolve`] turns the configured mode and credential string into a
//! strategy. Unsupported modes are rejected there, before any network
//! activity. Resolution runs fresh on every command; nothing is cached.

mod key;
mod password;
mod resolver;
mod traits;

pub use key::KeyAuth;
pub use password::PasswordAuth;
pub use resolver::resolve;
pub use traits::AuthStrategy;
