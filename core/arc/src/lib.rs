//! Arc engine for arcadio.
//!
//! This module provides:
//! - Arc creation, unlocking, metadata persistence and deletion
//! - Encrypted document storage with integrity verification
//! - Tagging and filename search
//!
//! # Architecture
//! [`ArcManager`] owns the on-disk layout of every arc and is the only
//! writer of arc metadata. [`DocumentStore`] works on an [`ArcSession`]
//! (a decrypted arc plus its key) and routes every mutation back through
//! [`ArcManager::update`].
//!
//! There is no cross-process locking: two processes that unlock and
//! mutate the same arc race, and the later `update` wins.

pub mod config;
pub mod documents;
pub mod manager;
pub mod model;
pub mod session;

pub use config::{SecurityConfig, ENCRYPTION_VERSION};
pub use documents::DocumentStore;
pub use manager::ArcManager;
pub use model::{Arc, ArcStats, Document};
pub use session::ArcSession;
