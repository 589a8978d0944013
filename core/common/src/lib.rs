//! Common utilities and types shared across arcadio modules.
//!
//! This module provides the error taxonomy used by every crate in the
//! workspace and the logical storage path type.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::StoragePath;
