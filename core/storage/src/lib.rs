//! Storage layer for arcadio.
//!
//! This module provides a trait-based interface over the place arc files
//! live (local filesystem, or memory for tests) and the arc registry, the
//! durable index of which arcs exist.
//!
//! # Design Principles
//! - Synchronous, blocking I/O: every call runs to completion
//! - Owner-only permissions for everything written to disk
//! - Whole-file replacement via temp file + rename

pub mod fs;
pub mod local;
pub mod memory;
pub mod provider;
pub mod registry;

pub use local::LocalProvider;
pub use memory::MemoryProvider;
pub use provider::StorageProvider;
pub use registry::{ArcEntry, Registry, REGISTRY_FILENAME};
