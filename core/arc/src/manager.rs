//! Arc manager: lifecycle and on-disk layout of arcs.

use chrono::Utc;
use std::path::Path;
use std::sync::Arc as Shared;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::config::{
    SecurityConfig, DOCUMENTS_DIRNAME, DOCUMENT_EXTENSION, METADATA_FILENAME, SECURITY_FILENAME,
};
use crate::model::Arc;
use crate::session::ArcSession;
use arcadio_common::{Error, Result, StoragePath};
use arcadio_crypto::{
    decrypt, derive_key, digests_match, encrypt, hash_answer, ArcKey, KdfParams, Salt,
};
use arcadio_storage::{ArcEntry, LocalProvider, Registry, StorageProvider, REGISTRY_FILENAME};

/// Creates, unlocks, persists and deletes arcs.
///
/// Owns the registry and the storage every arc lives in. Arc directories
/// are keyed by arc id directly under the provider root.
pub struct ArcManager {
    provider: Shared<dyn StorageProvider>,
    registry: Registry,
    kdf_params: KdfParams,
}

impl ArcManager {
    /// Open the arcs stored under `base_dir` on the local filesystem.
    ///
    /// The registry lives next to `base_dir`, in its parent directory.
    ///
    /// # Errors
    /// - Base directory cannot be created
    /// - Registry file exists but cannot be read or parsed
    pub fn open(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let provider = LocalProvider::new(base_dir)?;
        let registry_dir = base_dir.parent().unwrap_or(base_dir);
        let registry = Registry::load(registry_dir.join(REGISTRY_FILENAME))?;

        debug!(base_dir = %base_dir.display(), "Opened arc storage");
        Ok(Self::with_provider(Shared::new(provider), registry))
    }

    /// Create a manager over an explicit provider and registry.
    pub fn with_provider(provider: Shared<dyn StorageProvider>, registry: Registry) -> Self {
        Self {
            provider,
            registry,
            kdf_params: KdfParams::default(),
        }
    }

    /// Use `params` for arcs created from now on.
    ///
    /// Existing arcs keep the parameters recorded at their creation. Only
    /// the presets accepted by [`KdfParams::is_supported`] can create arcs.
    pub fn with_kdf_params(mut self, params: KdfParams) -> Self {
        self.kdf_params = params;
        self
    }

    pub(crate) fn provider(&self) -> &dyn StorageProvider {
        self.provider.as_ref()
    }

    /// Create a new arc and return it unlocked.
    ///
    /// # Postconditions
    /// - `<id>/arc.sec`, `<id>/arc.meta` and `<id>/documents/` exist
    /// - The arc is registered
    ///
    /// # Errors
    /// - `Error::InvalidInput` if any argument is empty or the configured
    ///   key derivation parameters are not a supported preset
    /// - I/O failure. The registry is only updated once every file is
    ///   written, so a failure may leave an unregistered directory behind
    ///   (see [`find_orphans`](Self::find_orphans)).
    pub fn create(
        &mut self,
        name: &str,
        password: &str,
        security_question: &str,
        answer: &str,
    ) -> Result<ArcSession> {
        for (field, value) in [
            ("name", name),
            ("password", password),
            ("security question", security_question),
            ("security answer", answer),
        ] {
            if value.is_empty() {
                return Err(Error::InvalidInput(format!("{} must not be empty", field)));
            }
        }
        if !self.kdf_params.is_supported() {
            return Err(Error::InvalidInput(
                "unsupported key derivation parameters".to_string(),
            ));
        }

        let salt = Salt::generate()?;
        debug!("Deriving key for new arc");
        let key = derive_key(password.as_bytes(), &salt, &self.kdf_params)?;
        let config =
            SecurityConfig::new(salt, password, security_question, answer, self.kdf_params);

        let arc = Arc::new(name);
        let arc_dir = arc_dir(&arc.id)?;

        self.provider.create_dir(&arc_dir.join(DOCUMENTS_DIRNAME)?)?;
        self.provider
            .write(&arc_dir.join(SECURITY_FILENAME)?, &config.to_bytes()?)?;
        self.save_metadata(&arc, &key)?;
        self.registry.register(&arc.id, &arc.name, arc.created_at)?;

        info!(arc_id = %arc.id, "Created arc");
        Ok(ArcSession::new(arc, key))
    }

    /// Verify `password` and decrypt the arc's metadata.
    ///
    /// # Errors
    /// - `Error::ArcNotFound` if nothing in the registry matches
    /// - `Error::InvalidPassword` if the password does not match; no
    ///   metadata is decrypted in that case
    /// - `Error::CorruptArc` if the security config is unreadable, or the
    ///   password matched but the metadata cannot be decrypted or parsed
    /// - I/O failure reading the arc files
    pub fn unlock(&self, id_or_name: &str, password: &str) -> Result<ArcSession> {
        let entry = self.registry.find_arc(id_or_name)?;
        let config = self.load_security(&entry.id)?;

        if !digests_match(&hash_answer(password.as_bytes()), &config.password_hash) {
            debug!(arc_id = %entry.id, "Password verification failed");
            return Err(Error::InvalidPassword);
        }

        debug!(arc_id = %entry.id, "Deriving arc key");
        let key = derive_key(password.as_bytes(), &config.salt, &config.kdf_params)?;
        let arc = self.load_metadata(&entry.id, &key)?;

        info!(arc_id = %entry.id, documents = arc.documents.len(), "Unlocked arc");
        Ok(ArcSession::new(arc, key))
    }

    /// Bump the modified time and re-persist the encrypted metadata.
    ///
    /// On failure the session's modified time is restored.
    pub fn update(&self, session: &mut ArcSession) -> Result<()> {
        let previous = session.arc().modified_at;
        session.arc_mut().modified_at = Utc::now();

        if let Err(err) = self.save_metadata(session.arc(), session.key()) {
            session.arc_mut().modified_at = previous;
            return Err(err);
        }

        debug!(arc_id = %session.id(), "Persisted arc metadata");
        Ok(())
    }

    /// Remove an arc's storage, then its registry entry.
    ///
    /// If removing the storage fails the arc stays registered.
    pub fn delete(&mut self, id_or_name: &str) -> Result<ArcEntry> {
        let entry = self.registry.find_arc(id_or_name)?;

        self.provider.delete_dir_all(&arc_dir(&entry.id)?)?;
        self.registry.unregister(&entry.id)?;

        info!(arc_id = %entry.id, "Deleted arc");
        Ok(entry)
    }

    /// Resolve an arc by id, name, or id prefix.
    pub fn find_arc(&self, id_or_name: &str) -> Result<ArcEntry> {
        self.registry.find_arc(id_or_name)
    }

    /// All registered arcs, unordered.
    pub fn list_arcs(&self) -> Vec<ArcEntry> {
        self.registry.list_all()
    }

    /// Storage address of a document's ciphertext.
    ///
    /// # Errors
    /// - `Error::InvalidInput` if either id is not a valid path component
    pub fn get_document_path(&self, arc_id: &str, doc_id: &str) -> Result<StoragePath> {
        document_path(arc_id, doc_id)
    }

    /// The security question stored for an arc.
    pub fn security_question(&self, id_or_name: &str) -> Result<String> {
        let entry = self.registry.find_arc(id_or_name)?;
        Ok(self.load_security(&entry.id)?.security_question)
    }

    /// Check a security answer.
    ///
    /// # Errors
    /// - `Error::InvalidPassword` on mismatch
    pub fn verify_answer(&self, id_or_name: &str, answer: &str) -> Result<()> {
        let entry = self.registry.find_arc(id_or_name)?;
        let config = self.load_security(&entry.id)?;

        if digests_match(&hash_answer(answer.as_bytes()), &config.answer_hash) {
            Ok(())
        } else {
            Err(Error::InvalidPassword)
        }
    }

    /// Arc directories in storage that have no registry entry.
    ///
    /// Reports only; nothing is removed.
    pub fn find_orphans(&self) -> Result<Vec<String>> {
        let mut orphans: Vec<String> = self
            .provider
            .list_dirs(&StoragePath::root())?
            .into_iter()
            .filter(|dir| !self.registry.contains(dir))
            .collect();
        orphans.sort();

        if !orphans.is_empty() {
            warn!(count = orphans.len(), "Found unregistered arc directories");
        }
        Ok(orphans)
    }

    fn load_security(&self, arc_id: &str) -> Result<SecurityConfig> {
        let bytes = self.provider.read(&arc_dir(arc_id)?.join(SECURITY_FILENAME)?)?;
        SecurityConfig::from_bytes(&bytes)
    }

    fn save_metadata(&self, arc: &Arc, key: &ArcKey) -> Result<()> {
        let plaintext = Zeroizing::new(serde_json::to_vec(arc)?);
        let ciphertext = encrypt(key.as_bytes(), &plaintext)?;
        self.provider
            .write(&arc_dir(&arc.id)?.join(METADATA_FILENAME)?, &ciphertext)
    }

    fn load_metadata(&self, arc_id: &str, key: &ArcKey) -> Result<Arc> {
        let ciphertext = self.provider.read(&arc_dir(arc_id)?.join(METADATA_FILENAME)?)?;

        debug!(arc_id = %arc_id, "Decrypting arc metadata");
        let plaintext = Zeroizing::new(decrypt(key.as_bytes(), &ciphertext).map_err(|_| {
            Error::CorruptArc(format!("metadata of {} failed to decrypt", arc_id))
        })?);

        let arc: Arc = serde_json::from_slice(&plaintext)
            .map_err(|e| Error::CorruptArc(format!("metadata of {} is malformed: {}", arc_id, e)))?;
        arc.validate()?;
        Ok(arc)
    }
}

fn arc_dir(arc_id: &str) -> Result<StoragePath> {
    StoragePath::root().join(arc_id)
}

pub(crate) fn document_path(arc_id: &str, doc_id: &str) -> Result<StoragePath> {
    arc_dir(arc_id)?
        .join(DOCUMENTS_DIRNAME)?
        .join(&format!("{}.{}", doc_id, DOCUMENT_EXTENSION))
}
