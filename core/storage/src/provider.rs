//! Storage provider trait definition.

use arcadio_common::{Result, StoragePath};

/// Storage provider trait for different backends.
///
/// Paths are relative to the provider's root. All operations block until
/// they complete; there is no locking between processes.
pub trait StorageProvider: Send + Sync {
    /// Get the provider name (e.g., "local", "memory").
    fn name(&self) -> &str;

    /// Write data, replacing any existing file.
    ///
    /// # Preconditions
    /// - Parent directory must exist
    ///
    /// # Errors
    /// - Parent directory not found
    /// - I/O errors
    fn write(&self, path: &StoragePath, data: &[u8]) -> Result<()>;

    /// Read a whole file.
    ///
    /// # Errors
    /// - File not found
    /// - I/O errors
    fn read(&self, path: &StoragePath) -> Result<Vec<u8>>;

    /// Check if a path exists.
    fn exists(&self, path: &StoragePath) -> Result<bool>;

    /// Delete a file.
    ///
    /// # Errors
    /// - File not found
    /// - Path is a directory
    fn delete(&self, path: &StoragePath) -> Result<()>;

    /// Create a directory, including missing parents.
    fn create_dir(&self, path: &StoragePath) -> Result<()>;

    /// Remove a directory and everything under it.
    ///
    /// Removing a path that does not exist succeeds.
    fn delete_dir_all(&self, path: &StoragePath) -> Result<()>;

    /// List the names of the direct subdirectories of a directory.
    fn list_dirs(&self, path: &StoragePath) -> Result<Vec<String>>;
}
