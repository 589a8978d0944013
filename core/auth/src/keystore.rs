//! Durable secret storage for arc passwords.

use std::collections::HashMap;
use std::sync::Mutex;

use arcadio_common::{Error, Result};

/// Keyring service name under which arc passwords are stored.
pub const DEFAULT_SERVICE: &str = "arcadio";

/// Durable store of passwords keyed by arc id.
pub trait SecretStore: Send + Sync {
    /// Stored password, or `None` if there is none.
    fn get(&self, arc_id: &str) -> Result<Option<String>>;

    /// Store or replace a password.
    fn set(&self, arc_id: &str, password: &str) -> Result<()>;

    /// Remove a password. Removing a missing entry succeeds.
    fn delete(&self, arc_id: &str) -> Result<()>;
}

/// Secret store backed by the platform keyring.
///
/// Each arc is one entry: the service name plus the arc id as account.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, arc_id: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, arc_id)
            .map_err(|e| Error::SecretStore(format!("keyring entry failed: {}", e)))
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE)
    }
}

impl SecretStore for KeyringStore {
    fn get(&self, arc_id: &str) -> Result<Option<String>> {
        match self.entry(arc_id)?.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(Error::SecretStore(format!("keyring read failed: {}", err))),
        }
    }

    fn set(&self, arc_id: &str, password: &str) -> Result<()> {
        self.entry(arc_id)?
            .set_password(password)
            .map_err(|e| Error::SecretStore(format!("keyring write failed: {}", e)))
    }

    fn delete(&self, arc_id: &str) -> Result<()> {
        match self.entry(arc_id)?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(Error::SecretStore(format!("keyring delete failed: {}", err))),
        }
    }
}

/// In-memory secret store for tests.
///
/// Can be switched to fail every call, like an unreachable keyring.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: Mutex<HashMap<String, String>>,
    unavailable: Mutex<bool>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with `Error::SecretStore`.
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap_or_else(|e| e.into_inner()) = unavailable;
    }

    fn check(&self) -> Result<()> {
        if *self.unavailable.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(Error::SecretStore("secret store unavailable".to_string()));
        }
        Ok(())
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, arc_id: &str) -> Result<Option<String>> {
        self.check()?;
        let secrets = self.secrets.lock().unwrap_or_else(|e| e.into_inner());
        Ok(secrets.get(arc_id).cloned())
    }

    fn set(&self, arc_id: &str, password: &str) -> Result<()> {
        self.check()?;
        self.secrets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(arc_id.to_string(), password.to_string());
        Ok(())
    }

    fn delete(&self, arc_id: &str) -> Result<()> {
        self.check()?;
        self.secrets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(arc_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store = MemorySecretStore::new();
        assert_eq!(store.get("arc").unwrap(), None);

        store.set("arc", "pw").unwrap();
        assert_eq!(store.get("arc").unwrap().as_deref(), Some("pw"));

        store.delete("arc").unwrap();
        store.delete("arc").unwrap();
        assert_eq!(store.get("arc").unwrap(), None);
    }

    #[test]
    fn test_memory_store_unavailable() {
        let store = MemorySecretStore::new();
        store.set_unavailable(true);

        assert!(matches!(store.get("arc"), Err(Error::SecretStore(_))));
        assert!(matches!(store.set("arc", "pw"), Err(Error::SecretStore(_))));
    }

    #[test]
    fn test_keyring_service_name() {
        assert_eq!(KeyringStore::default().service(), "arcadio");
    }
}
