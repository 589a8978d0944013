//! Document operations on an unlocked arc.
//!
//! Every mutation is applied to the session's in-memory arc and then made
//! durable through [`ArcManager::update`]. When the update fails the
//! in-memory change is undone, so the caller never sees a state that was
//! not persisted.

use chrono::Utc;
use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::manager::{document_path, ArcManager};
use crate::model::Document;
use crate::session::ArcSession;
use arcadio_common::{Error, Result};
use arcadio_crypto::{content_digest, decrypt, digests_match, encrypt};

/// Document operations bound to an arc manager.
pub struct DocumentStore<'a> {
    manager: &'a ArcManager,
}

impl<'a> DocumentStore<'a> {
    /// Create document operations over `manager`.
    pub fn new(manager: &'a ArcManager) -> Self {
        Self { manager }
    }

    /// Encrypt `content` and add it to the arc.
    ///
    /// Blank tags are dropped and the rest are trimmed.
    ///
    /// # Errors
    /// - `Error::InvalidInput` if `filename` is empty
    /// - I/O failure writing the payload or the metadata. The arc is left
    ///   without the document in either case.
    pub fn add_document(
        &self,
        session: &mut ArcSession,
        content: &[u8],
        filename: &str,
        tags: &[String],
    ) -> Result<Document> {
        if filename.is_empty() {
            return Err(Error::InvalidInput("filename must not be empty".to_string()));
        }

        let now = Utc::now();
        let document = Document {
            id: Uuid::new_v4().to_string(),
            filename: filename.to_string(),
            added_at: now,
            modified_at: now,
            size: content.len() as u64,
            content_hash: content_digest(content),
            compressed: false,
        };

        let path = document_path(session.id(), &document.id)?;
        let ciphertext = encrypt(session.key().as_bytes(), content)?;
        self.manager.provider().write(&path, &ciphertext)?;

        let tags = normalize_tags(tags);
        let arc = session.arc_mut();
        arc.documents.insert(document.id.clone(), document.clone());
        if !tags.is_empty() {
            arc.tags.insert(document.id.clone(), tags);
        }

        if let Err(err) = self.manager.update(session) {
            let arc = session.arc_mut();
            arc.documents.remove(&document.id);
            arc.tags.remove(&document.id);
            if let Err(cleanup) = self.manager.provider().delete(&path) {
                warn!(doc_id = %document.id, error = %cleanup, "Failed to remove orphaned payload");
            }
            return Err(err);
        }

        info!(
            arc_id = %session.id(),
            doc_id = %document.id,
            size = document.size,
            "Added document"
        );
        Ok(document)
    }

    /// Read all of `reader` and add it as `filename`.
    pub fn add_document_from_reader<R: Read>(
        &self,
        session: &mut ArcSession,
        mut reader: R,
        filename: &str,
        tags: &[String],
    ) -> Result<Document> {
        let mut content = Zeroizing::new(Vec::new());
        reader.read_to_end(&mut content)?;
        self.add_document(session, &content, filename, tags)
    }

    /// Add the file at `path`, named after its final path component.
    pub fn add_file(
        &self,
        session: &mut ArcSession,
        path: &Path,
        tags: &[String],
    ) -> Result<Document> {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::InvalidInput(format!("no file name in {}", path.display())))?
            .to_string();

        let file = fs::File::open(path)?;
        self.add_document_from_reader(session, file, &filename, tags)
    }

    /// Delete a document's payload and remove it from the arc.
    ///
    /// If the payload cannot be deleted the arc is unchanged. Once the
    /// payload is gone the document stays removed from the session even if
    /// persisting the metadata then fails, since restoring it would point
    /// at a missing payload.
    ///
    /// # Errors
    /// - `Error::DocumentNotFound` if the id is unknown
    pub fn remove_document(&self, session: &mut ArcSession, doc_id: &str) -> Result<Document> {
        session.arc().document(doc_id)?;

        let path = document_path(session.id(), doc_id)?;
        self.manager.provider().delete(&path)?;

        let arc = session.arc_mut();
        arc.tags.remove(doc_id);
        let document = arc
            .documents
            .remove(doc_id)
            .ok_or_else(|| Error::DocumentNotFound(doc_id.to_string()))?;

        self.manager.update(session)?;

        info!(arc_id = %session.id(), doc_id = %doc_id, "Removed document");
        Ok(document)
    }

    /// Decrypt a document and verify it against its stored digest.
    ///
    /// # Errors
    /// - `Error::DocumentNotFound` if the id is unknown
    /// - `Error::Decryption` if the payload fails authentication
    /// - `Error::Integrity` if the plaintext digest does not match
    pub fn get_document(&self, session: &ArcSession, doc_id: &str) -> Result<Vec<u8>> {
        let document = session.arc().document(doc_id)?;
        let path = document_path(session.id(), doc_id)?;

        let ciphertext = self.manager.provider().read(&path)?;
        debug!(doc_id = %doc_id, "Decrypting document");
        let plaintext = decrypt(session.key().as_bytes(), &ciphertext)?;

        let digest = content_digest(&plaintext);
        if !digests_match(digest.as_bytes(), document.content_hash.as_bytes()) {
            return Err(Error::Integrity(doc_id.to_string()));
        }

        Ok(plaintext)
    }

    /// Decrypt a verified document to `destination`.
    ///
    /// Returns the number of bytes written.
    pub fn export_document(
        &self,
        session: &ArcSession,
        doc_id: &str,
        destination: &Path,
    ) -> Result<u64> {
        let plaintext = Zeroizing::new(self.get_document(session, doc_id)?);
        fs::write(destination, plaintext.as_slice())?;

        info!(doc_id = %doc_id, destination = %destination.display(), "Exported document");
        Ok(plaintext.len() as u64)
    }

    /// Add tags to a document. Returns the resulting tag set.
    pub fn add_tags(
        &self,
        session: &mut ArcSession,
        doc_id: &str,
        tags: &[String],
    ) -> Result<BTreeSet<String>> {
        self.edit_tags(session, doc_id, |current| {
            current.extend(normalize_tags(tags));
        })
    }

    /// Remove tags from a document. Returns the resulting tag set.
    pub fn remove_tags(
        &self,
        session: &mut ArcSession,
        doc_id: &str,
        tags: &[String],
    ) -> Result<BTreeSet<String>> {
        self.edit_tags(session, doc_id, |current| {
            for tag in normalize_tags(tags) {
                current.remove(&tag);
            }
        })
    }

    /// All documents, unordered.
    pub fn list_documents<'s>(&self, session: &'s ArcSession) -> Vec<&'s Document> {
        session.arc().documents.values().collect()
    }

    /// Documents whose filename contains `query`, ignoring case.
    ///
    /// An empty query matches everything.
    pub fn search_documents<'s>(&self, session: &'s ArcSession, query: &str) -> Vec<&'s Document> {
        let query = query.to_lowercase();
        session
            .arc()
            .documents
            .values()
            .filter(|doc| doc.filename.to_lowercase().contains(&query))
            .collect()
    }

    fn edit_tags<F>(
        &self,
        session: &mut ArcSession,
        doc_id: &str,
        edit: F,
    ) -> Result<BTreeSet<String>>
    where
        F: FnOnce(&mut BTreeSet<String>),
    {
        session.arc().document(doc_id)?;

        let arc = session.arc_mut();
        let previous = arc.tags.remove(doc_id);
        let mut current = previous.clone().unwrap_or_default();
        edit(&mut current);
        if !current.is_empty() {
            arc.tags.insert(doc_id.to_string(), current.clone());
        }

        if let Err(err) = self.manager.update(session) {
            let arc = session.arc_mut();
            match previous {
                Some(tags) => arc.tags.insert(doc_id.to_string(), tags),
                None => arc.tags.remove(doc_id),
            };
            return Err(err);
        }

        debug!(doc_id = %doc_id, count = current.len(), "Updated tags");
        Ok(current)
    }
}

fn normalize_tags(tags: &[String]) -> BTreeSet<String> {
    tags.iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcadio_crypto::KdfParams;
    use arcadio_storage::{MemoryProvider, Registry, StorageProvider, REGISTRY_FILENAME};
    use proptest::prelude::*;
    use std::sync::Arc as Shared;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        provider: Shared<MemoryProvider>,
        manager: ArcManager,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let provider = Shared::new(MemoryProvider::new());
        let registry = Registry::load(temp.path().join(REGISTRY_FILENAME)).unwrap();
        let manager = ArcManager::with_provider(provider.clone(), registry)
            .with_kdf_params(KdfParams::moderate());
        Fixture {
            _temp: temp,
            provider,
            manager,
        }
    }

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_add_and_get() {
        let mut fx = fixture();
        let mut session = fx.manager.create("Docs", "password", "q", "a").unwrap();
        let store = DocumentStore::new(&fx.manager);

        let doc = store
            .add_document(&mut session, b"hello", "hello.txt", &tags(&["greeting"]))
            .unwrap();

        assert_eq!(doc.size, 5);
        assert_eq!(doc.content_hash, content_digest(b"hello"));
        assert_eq!(store.get_document(&session, &doc.id).unwrap(), b"hello");
        assert_eq!(session.arc().tags_for(&doc.id), vec!["greeting"]);

        let reloaded = fx.manager.unlock("Docs", "password").unwrap();
        assert_eq!(reloaded.arc().documents.len(), 1);
    }

    #[test]
    fn test_failed_add_leaves_arc_unchanged() {
        let mut fx = fixture();
        let mut session = fx.manager.create("Docs", "password", "q", "a").unwrap();
        let store = DocumentStore::new(&fx.manager);

        fx.provider.set_read_only(true);
        assert!(matches!(
            store.add_document(&mut session, b"x", "x.txt", &[]),
            Err(Error::Io(_))
        ));
        assert!(session.arc().documents.is_empty());
    }

    #[test]
    fn test_remove_document() {
        let mut fx = fixture();
        let mut session = fx.manager.create("Docs", "password", "q", "a").unwrap();
        let store = DocumentStore::new(&fx.manager);
        let doc = store
            .add_document(&mut session, b"x", "x.txt", &tags(&["t"]))
            .unwrap();
        let path = document_path(session.id(), &doc.id).unwrap();

        store.remove_document(&mut session, &doc.id).unwrap();

        assert!(!fx.provider.exists(&path).unwrap());
        assert!(session.arc().documents.is_empty());
        assert!(session.arc().tags.is_empty());
        assert!(matches!(
            store.remove_document(&mut session, &doc.id),
            Err(Error::DocumentNotFound(_))
        ));
    }

    #[test]
    fn test_failed_remove_leaves_arc_unchanged() {
        let mut fx = fixture();
        let mut session = fx.manager.create("Docs", "password", "q", "a").unwrap();
        let store = DocumentStore::new(&fx.manager);
        let doc = store.add_document(&mut session, b"x", "x.txt", &[]).unwrap();

        fx.provider.set_read_only(true);
        assert!(store.remove_document(&mut session, &doc.id).is_err());
        assert!(session.arc().documents.contains_key(&doc.id));
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let mut fx = fixture();
        let mut session = fx.manager.create("Docs", "password", "q", "a").unwrap();
        let store = DocumentStore::new(&fx.manager);
        let doc = store.add_document(&mut session, b"data", "d.bin", &[]).unwrap();
        let path = document_path(session.id(), &doc.id).unwrap();

        let mut bytes = fx.provider.read(&path).unwrap();
        bytes[0] ^= 0x01;
        fx.provider.write(&path, &bytes).unwrap();

        assert!(matches!(
            store.get_document(&session, &doc.id),
            Err(Error::Decryption)
        ));
    }

    #[test]
    fn test_digest_mismatch_is_integrity_error() {
        let mut fx = fixture();
        let mut session = fx.manager.create("Docs", "password", "q", "a").unwrap();
        let store = DocumentStore::new(&fx.manager);
        let doc = store.add_document(&mut session, b"data", "d.bin", &[]).unwrap();

        session
            .arc_mut()
            .documents
            .get_mut(&doc.id)
            .unwrap()
            .content_hash = content_digest(b"other");

        assert!(matches!(
            store.get_document(&session, &doc.id),
            Err(Error::Integrity(_))
        ));
    }

    #[test]
    fn test_export_document() {
        let mut fx = fixture();
        let mut session = fx.manager.create("Docs", "password", "q", "a").unwrap();
        let store = DocumentStore::new(&fx.manager);
        let doc = store
            .add_document(&mut session, &[1, 2, 3], "foo.txt", &[])
            .unwrap();

        let out = TempDir::new().unwrap();
        let destination = out.path().join("foo.txt");
        let written = store
            .export_document(&session, &doc.id, &destination)
            .unwrap();

        assert_eq!(written, 3);
        assert_eq!(fs::read(&destination).unwrap(), vec![1, 2, 3]);
        assert!(matches!(
            store.export_document(&session, "missing", &destination),
            Err(Error::DocumentNotFound(_))
        ));
    }

    #[test]
    fn test_add_file_uses_file_name() {
        let mut fx = fixture();
        let mut session = fx.manager.create("Docs", "password", "q", "a").unwrap();
        let store = DocumentStore::new(&fx.manager);

        let dir = TempDir::new().unwrap();
        let source = dir.path().join("scan.pdf");
        fs::write(&source, b"%PDF").unwrap();

        let doc = store
            .add_file(&mut session, &source, &tags(&["scan"]))
            .unwrap();
        assert_eq!(doc.filename, "scan.pdf");
        assert_eq!(session.arc().tags_for(&doc.id), vec!["scan"]);
    }

    #[test]
    fn test_tag_union_and_difference() {
        let mut fx = fixture();
        let mut session = fx.manager.create("Docs", "password", "q", "a").unwrap();
        let store = DocumentStore::new(&fx.manager);
        let doc = store.add_document(&mut session, b"x", "x.txt", &[]).unwrap();

        store
            .add_tags(&mut session, &doc.id, &tags(&["a", "b"]))
            .unwrap();
        let after_add = store
            .add_tags(&mut session, &doc.id, &tags(&["b", "c", "  "]))
            .unwrap();
        assert_eq!(after_add, set(&["a", "b", "c"]));

        let after_remove = store
            .remove_tags(&mut session, &doc.id, &tags(&["b"]))
            .unwrap();
        assert_eq!(after_remove, set(&["a", "c"]));

        store
            .remove_tags(&mut session, &doc.id, &tags(&["a", "c"]))
            .unwrap();
        assert!(!session.arc().tags.contains_key(&doc.id));

        assert!(matches!(
            store.add_tags(&mut session, "missing", &tags(&["a"])),
            Err(Error::DocumentNotFound(_))
        ));
    }

    #[test]
    fn test_failed_tag_update_is_undone() {
        let mut fx = fixture();
        let mut session = fx.manager.create("Docs", "password", "q", "a").unwrap();
        let store = DocumentStore::new(&fx.manager);
        let doc = store
            .add_document(&mut session, b"x", "x.txt", &tags(&["keep"]))
            .unwrap();

        fx.provider.set_read_only(true);
        assert!(store
            .add_tags(&mut session, &doc.id, &tags(&["new"]))
            .is_err());
        assert_eq!(session.arc().tags_for(&doc.id), vec!["keep"]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let mut fx = fixture();
        let mut session = fx.manager.create("Docs", "password", "q", "a").unwrap();
        let store = DocumentStore::new(&fx.manager);
        store
            .add_document(&mut session, b"x", "Report.PDF", &[])
            .unwrap();
        store
            .add_document(&mut session, b"y", "notes.txt", &[])
            .unwrap();

        assert_eq!(store.search_documents(&session, "report").len(), 1);
        assert_eq!(store.search_documents(&session, "PORT").len(), 1);
        assert_eq!(store.search_documents(&session, "").len(), 2);
        assert!(store.search_documents(&session, "xyz").is_empty());
        assert_eq!(store.list_documents(&session).len(), 2);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_filename_substrings_match(
            name in "[A-Za-z]{1,12}",
            start in 0usize..12,
            len in 0usize..12,
        ) {
            let start = start.min(name.len());
            let end = (start + len).min(name.len());
            let query = name[start..end].to_uppercase();

            let mut fx = fixture();
            let mut session = fx.manager.create("Docs", "password", "q", "a").unwrap();
            let store = DocumentStore::new(&fx.manager);
            store.add_document(&mut session, b"x", &name, &[]).unwrap();

            prop_assert_eq!(store.search_documents(&session, &query).len(), 1);
        }
    }
}
