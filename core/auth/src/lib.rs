//! Credential resolution for arcadio.
//!
//! This module provides:
//! - A time-limited in-memory password cache
//! - Durable secret storage backed by the OS keyring
//! - The resolver that ties cache, secret store and prompt together
//!
//! # Security Guarantees
//! - Cached passwords live in memory only and are zeroized on eviction
//! - Passwords are never logged
//! - No secret store is required: an arc stays reachable by prompt alone

pub mod cache;
pub mod keystore;
pub mod prompt;
pub mod resolver;

pub use cache::{Clock, ManualClock, SessionCache, SystemClock, DEFAULT_SESSION_TTL};
pub use keystore::{KeyringStore, MemorySecretStore, SecretStore, DEFAULT_SERVICE};
pub use prompt::Prompter;
pub use resolver::CredentialResolver;
