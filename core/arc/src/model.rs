//! Arc and document records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

use crate::config::ENCRYPTION_VERSION;
use arcadio_common::{Error, Result};

/// Decrypted arc metadata.
///
/// Invariant: every key of `tags` is also a key of `documents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    /// Document id -> document.
    #[serde(default)]
    pub documents: HashMap<String, Document>,
    /// Document id -> tag set.
    #[serde(default)]
    pub tags: HashMap<String, BTreeSet<String>>,
    pub encryption_version: String,
}

/// One encrypted document. Its payload lives at the storage address
/// derived from its id, not inside this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub added_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub size: u64,
    /// Lowercase hex SHA-256 of the plaintext.
    pub content_hash: String,
    /// Reserved; always false.
    #[serde(default)]
    pub compressed: bool,
}

/// Summary figures for an arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArcStats {
    pub documents: usize,
    pub unique_tags: usize,
    pub total_size: u64,
}

impl Arc {
    /// New empty arc with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            created_at: now,
            modified_at: now,
            documents: HashMap::new(),
            tags: HashMap::new(),
            encryption_version: ENCRYPTION_VERSION.to_string(),
        }
    }

    /// Look up a document by id.
    pub fn document(&self, doc_id: &str) -> Result<&Document> {
        self.documents
            .get(doc_id)
            .ok_or_else(|| Error::DocumentNotFound(doc_id.to_string()))
    }

    /// Tags of a document; empty if it has none.
    pub fn tags_for(&self, doc_id: &str) -> Vec<&str> {
        self.tags
            .get(doc_id)
            .map(|tags| tags.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Document count, distinct tags across documents, and plaintext bytes.
    pub fn stats(&self) -> ArcStats {
        let unique: BTreeSet<&String> = self.tags.values().flatten().collect();
        ArcStats {
            documents: self.documents.len(),
            unique_tags: unique.len(),
            total_size: self.documents.values().map(|d| d.size).sum(),
        }
    }

    /// Check the tag/document invariant.
    pub fn validate(&self) -> Result<()> {
        if let Some(orphan) = self
            .tags
            .keys()
            .find(|doc_id| !self.documents.contains_key(*doc_id))
        {
            return Err(Error::CorruptArc(format!(
                "tags reference unknown document {}",
                orphan
            )));
        }
        Ok(())
    }
}
