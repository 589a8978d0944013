//! In-memory storage provider for testing.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::provider::StorageProvider;
use arcadio_common::{Error, Result, StoragePath};

/// In-memory storage entry.
#[derive(Debug, Clone)]
enum Entry {
    File(Vec<u8>),
    Directory,
}

/// In-memory storage provider.
///
/// Useful for testing. All data is stored in memory and lost on drop.
/// Switching it to read-only makes every mutating call fail, which lets
/// tests exercise partial-failure paths.
pub struct MemoryProvider {
    storage: RwLock<HashMap<String, Entry>>,
    read_only: AtomicBool,
}

impl MemoryProvider {
    /// Create a new empty memory provider.
    pub fn new() -> Self {
        let mut storage = HashMap::new();
        storage.insert(StoragePath::root().to_string_path(), Entry::Directory);

        Self {
            storage: RwLock::new(storage),
            read_only: AtomicBool::new(false),
        }
    }

    /// Make subsequent writes, deletes and directory changes fail.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    fn key(path: &StoragePath) -> String {
        path.to_string_path()
    }

    fn check_writable(&self) -> Result<()> {
        if self.read_only.load(Ordering::SeqCst) {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "storage is read-only",
            )));
        }
        Ok(())
    }

    fn entries(&self) -> RwLockReadGuard<'_, HashMap<String, Entry>> {
        self.storage.read().unwrap_or_else(|e| e.into_inner())
    }

    fn entries_mut(&self) -> RwLockWriteGuard<'_, HashMap<String, Entry>> {
        self.storage.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(path: &StoragePath) -> Error {
    Error::Io(io::Error::new(
        io::ErrorKind::NotFound,
        format!("Not found: {}", path),
    ))
}

impl StorageProvider for MemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    fn write(&self, path: &StoragePath, data: &[u8]) -> Result<()> {
        self.check_writable()?;

        let mut storage = self.entries_mut();
        if let Some(parent) = path.parent() {
            match storage.get(&Self::key(&parent)) {
                Some(Entry::Directory) => {}
                Some(Entry::File(_)) => {
                    return Err(Error::InvalidInput("Parent is a file".to_string()));
                }
                None => return Err(not_found(&parent)),
            }
        }

        storage.insert(Self::key(path), Entry::File(data.to_vec()));
        Ok(())
    }

    fn read(&self, path: &StoragePath) -> Result<Vec<u8>> {
        match self.entries().get(&Self::key(path)) {
            Some(Entry::File(data)) => Ok(data.clone()),
            Some(Entry::Directory) => Err(Error::InvalidInput(format!(
                "Cannot read directory: {}",
                path
            ))),
            None => Err(not_found(path)),
        }
    }

    fn exists(&self, path: &StoragePath) -> Result<bool> {
        Ok(self.entries().contains_key(&Self::key(path)))
    }

    fn delete(&self, path: &StoragePath) -> Result<()> {
        self.check_writable()?;

        let mut storage = self.entries_mut();
        match storage.get(&Self::key(path)) {
            Some(Entry::File(_)) => {
                storage.remove(&Self::key(path));
                Ok(())
            }
            Some(Entry::Directory) => Err(Error::InvalidInput(
                "Use delete_dir_all for directories".to_string(),
            )),
            None => Err(not_found(path)),
        }
    }

    fn create_dir(&self, path: &StoragePath) -> Result<()> {
        self.check_writable()?;

        let mut storage = self.entries_mut();
        let mut current = StoragePath::root();
        for component in path.components() {
            current = current.join(component)?;
            match storage.get(&Self::key(&current)) {
                Some(Entry::Directory) => {}
                Some(Entry::File(_)) => {
                    return Err(Error::InvalidInput(format!(
                        "Path exists as a file: {}",
                        current
                    )));
                }
                None => {
                    storage.insert(Self::key(&current), Entry::Directory);
                }
            }
        }
        Ok(())
    }

    fn delete_dir_all(&self, path: &StoragePath) -> Result<()> {
        self.check_writable()?;
        if path.is_root() {
            return Err(Error::InvalidInput(
                "Refusing to delete the storage root".to_string(),
            ));
        }

        let key = Self::key(path);
        let prefix = format!("{}/", key);
        self.entries_mut()
            .retain(|k, _| k != &key && !k.starts_with(&prefix));
        Ok(())
    }

    fn list_dirs(&self, path: &StoragePath) -> Result<Vec<String>> {
        let storage = self.entries();
        match storage.get(&Self::key(path)) {
            Some(Entry::Directory) => {}
            Some(Entry::File(_)) => {
                return Err(Error::InvalidInput("Not a directory".to_string()));
            }
            None => return Err(not_found(path)),
        }

        let prefix = if path.is_root() {
            "/".to_string()
        } else {
            format!("{}/", Self::key(path))
        };

        Ok(storage
            .iter()
            .filter(|(_, entry)| matches!(entry, Entry::Directory))
            .filter_map(|(key, _)| key.strip_prefix(&prefix))
            .filter(|rest| !rest.is_empty() && !rest.contains('/'))
            .map(String::from)
            .collect())
    }
}
