//! Password resolution: session cache, then secret store, then prompt.

use std::sync::Arc;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::cache::SessionCache;
use crate::keystore::SecretStore;
use crate::prompt::Prompter;
use arcadio_common::{Error, Result};

/// Resolves arc passwords with as few prompts as possible.
///
/// The secret store is optional; without one, passwords come from the
/// cache or the prompt only.
pub struct CredentialResolver {
    cache: SessionCache,
    store: Option<Arc<dyn SecretStore>>,
    prompter: Box<dyn Prompter>,
}

impl CredentialResolver {
    pub fn new(
        cache: SessionCache,
        store: Option<Arc<dyn SecretStore>>,
        prompter: Box<dyn Prompter>,
    ) -> Self {
        Self {
            cache,
            store,
            prompter,
        }
    }

    /// Whether a durable secret store is configured.
    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// Resolve the password for an arc.
    ///
    /// Tries the session cache, then the secret store, then (if allowed)
    /// the prompter. A prompted password may be saved to the secret store
    /// after confirmation. Whatever is found is cached.
    ///
    /// A failing secret store is logged and treated as a miss.
    ///
    /// # Errors
    /// - `Error::PasswordUnavailable` if nothing is cached or stored and
    ///   prompting is not allowed
    /// - Prompt failures
    pub fn get_password(
        &mut self,
        arc_id: &str,
        arc_name: &str,
        allow_prompt: bool,
    ) -> Result<Zeroizing<String>> {
        if let Some(password) = self.cache.get(arc_id) {
            debug!(arc_id = %arc_id, "Password found in session cache");
            return Ok(password);
        }

        if let Some(store) = &self.store {
            match store.get(arc_id) {
                Ok(Some(password)) => {
                    debug!(arc_id = %arc_id, "Password found in secret store");
                    let password = Zeroizing::new(password);
                    self.cache.set(arc_id, &password);
                    return Ok(password);
                }
                Ok(None) => {}
                Err(err) => warn!(arc_id = %arc_id, error = %err, "Secret store lookup failed"),
            }
        }

        if !allow_prompt {
            return Err(Error::PasswordUnavailable(arc_name.to_string()));
        }

        let password = Zeroizing::new(
            self.prompter
                .prompt_secret(&format!("Password for arc '{}': ", arc_name))?,
        );

        if let Some(store) = &self.store {
            if self.prompter.confirm("Save password to system keyring?")? {
                match store.set(arc_id, &password) {
                    Ok(()) => info!(arc_id = %arc_id, "Saved password to secret store"),
                    Err(err) => warn!(arc_id = %arc_id, error = %err, "Failed to save password"),
                }
            }
        }

        self.cache.set(arc_id, &password);
        Ok(password)
    }

    /// Store a password durably and cache it.
    ///
    /// # Errors
    /// - `Error::SecretStore` if no store is configured or the write fails
    pub fn save_password(&mut self, arc_id: &str, password: &str) -> Result<()> {
        self.require_store()?.set(arc_id, password)?;
        self.cache.set(arc_id, password);
        Ok(())
    }

    /// Forget an arc's password in both the cache and the secret store.
    pub fn delete_password(&mut self, arc_id: &str) -> Result<()> {
        self.cache.clear(arc_id);
        if let Some(store) = &self.store {
            store.delete(arc_id)?;
        }
        Ok(())
    }

    /// Forget a password the arc refused.
    ///
    /// Clears the cached copy and deletes the stored one, so the next
    /// lookup falls through to the prompt. Returns whether a stored
    /// password was removed.
    ///
    /// # Errors
    /// - `Error::SecretStore` if the stored entry cannot be deleted
    pub fn reject_password(&mut self, arc_id: &str) -> Result<bool> {
        self.cache.clear(arc_id);

        let Some(store) = &self.store else {
            return Ok(false);
        };
        let stored = match store.get(arc_id) {
            Ok(stored) => stored.is_some(),
            Err(err) => {
                warn!(arc_id = %arc_id, error = %err, "Secret store lookup failed");
                false
            }
        };
        if stored {
            store.delete(arc_id)?;
            info!(arc_id = %arc_id, "Removed rejected password from secret store");
        }
        Ok(stored)
    }

    /// Whether the secret store holds a password for the arc.
    pub fn has_stored_password(&self, arc_id: &str) -> Result<bool> {
        match &self.store {
            Some(store) => Ok(store.get(arc_id)?.is_some()),
            None => Ok(false),
        }
    }

    /// Drop every cached password.
    pub fn clear_session(&mut self) {
        self.cache.clear_all();
    }

    fn require_store(&self) -> Result<&Arc<dyn SecretStore>> {
        self.store
            .as_ref()
            .ok_or_else(|| Error::SecretStore("no secret store configured".to_string()))
    }
}
