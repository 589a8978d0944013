//! Unlocked arc handle.
//!
//! A session pairs the decrypted [`Arc`] with the key derived from its
//! password. The key is zeroized when the session is dropped.

use crate::model::Arc;
use arcadio_crypto::ArcKey;

/// Decrypted arc plus its key.
///
/// Obtained from [`ArcManager::create`](crate::ArcManager::create) or
/// [`ArcManager::unlock`](crate::ArcManager::unlock). Mutations go through
/// [`DocumentStore`](crate::DocumentStore) so that every change is persisted
/// with the same key.
#[derive(Debug)]
pub struct ArcSession {
    arc: Arc,
    key: ArcKey,
}

impl ArcSession {
    pub(crate) fn new(arc: Arc, key: ArcKey) -> Self {
        Self { arc, key }
    }

    /// Arc id.
    pub fn id(&self) -> &str {
        &self.arc.id
    }

    /// Arc name.
    pub fn name(&self) -> &str {
        &self.arc.name
    }

    /// Decrypted arc metadata.
    pub fn arc(&self) -> &Arc {
        &self.arc
    }

    pub(crate) fn arc_mut(&mut self) -> &mut Arc {
        &mut self.arc
    }

    /// Key for this arc.
    ///
    /// # Security
    /// Use immediately; do not copy the bytes elsewhere.
    pub fn key(&self) -> &ArcKey {
        &self.key
    }
}
