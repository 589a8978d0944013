//! Local filesystem storage provider.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::fs::{create_dir_owner_only, write_atomic};
use crate::provider::StorageProvider;
use arcadio_common::{Error, Result, StoragePath};

/// Local filesystem storage provider.
///
/// Stores arc data under a root directory, one subdirectory per arc.
pub struct LocalProvider {
    root: PathBuf,
}

impl LocalProvider {
    /// Create a new local provider with the given root directory.
    ///
    /// # Postconditions
    /// - Root directory exists with owner-only permissions
    ///
    /// # Errors
    /// - Permission denied
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        if !root.exists() {
            create_dir_owner_only(&root)?;
        }

        Ok(Self { root })
    }

    /// Convert a StoragePath to a filesystem path.
    pub fn to_fs_path(&self, path: &StoragePath) -> PathBuf {
        let mut fs_path = self.root.clone();
        for component in path.components() {
            fs_path.push(component);
        }
        fs_path
    }
}

impl StorageProvider for LocalProvider {
    fn name(&self) -> &str {
        "local"
    }

    fn write(&self, path: &StoragePath, data: &[u8]) -> Result<()> {
        let fs_path = self.to_fs_path(path);

        if let Some(parent) = fs_path.parent() {
            if !parent.is_dir() {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("Parent directory not found for {}", path),
                )));
            }
        }

        write_atomic(&fs_path, data)?;
        Ok(())
    }

    fn read(&self, path: &StoragePath) -> Result<Vec<u8>> {
        let fs_path = self.to_fs_path(path);

        if fs_path.is_dir() {
            return Err(Error::InvalidInput(format!("Cannot read directory: {}", path)));
        }

        Ok(fs::read(&fs_path)?)
    }

    fn exists(&self, path: &StoragePath) -> Result<bool> {
        Ok(self.to_fs_path(path).exists())
    }

    fn delete(&self, path: &StoragePath) -> Result<()> {
        let fs_path = self.to_fs_path(path);

        if fs_path.is_dir() {
            return Err(Error::InvalidInput(
                "Use delete_dir_all for directories".to_string(),
            ));
        }

        fs::remove_file(&fs_path)?;
        Ok(())
    }

    fn create_dir(&self, path: &StoragePath) -> Result<()> {
        create_dir_owner_only(&self.to_fs_path(path))?;
        Ok(())
    }

    fn delete_dir_all(&self, path: &StoragePath) -> Result<()> {
        if path.is_root() {
            return Err(Error::InvalidInput(
                "Refusing to delete the storage root".to_string(),
            ));
        }

        match fs::remove_dir_all(self.to_fs_path(path)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn list_dirs(&self, path: &StoragePath) -> Result<Vec<String>> {
        let fs_path = self.to_fs_path(path);

        let mut results = Vec::new();
        for entry in fs::read_dir(&fs_path)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    results.push(name.to_string());
                }
            }
        }

        Ok(results)
    }
}
