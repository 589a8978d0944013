//! Arc registry: the durable index of which arcs exist.
//!
//! The registry is one JSON document mapping arc id to [`ArcEntry`],
//! rewritten whole on every mutation. It is independent of each arc's own
//! storage: an arc is "known" only if it is registered here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::fs::{create_dir_owner_only, write_atomic};
use arcadio_common::{Error, Result};

/// Registry file name, stored next to (not inside) the arcs directory.
pub const REGISTRY_FILENAME: &str = "registry.json";

/// Minimum probe length for id-prefix lookups.
pub const MIN_PREFIX_LEN: usize = 8;

/// Lightweight discovery record for one arc.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcEntry {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Registry of arcs keyed by id.
///
/// Names are not unique. Lookups that can match several entries return
/// the first match in map iteration order, which is unspecified.
#[derive(Debug)]
pub struct Registry {
    path: PathBuf,
    arcs: HashMap<String, ArcEntry>,
}

impl Registry {
    /// Load the registry at `path`, starting empty if the file does not exist.
    ///
    /// # Errors
    /// - I/O errors other than not-found
    /// - `Error::Serialization` if the file is not a valid registry
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let arcs = match fs::read(&path) {
            Ok(data) => serde_json::from_slice(&data)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(err.into()),
        };

        debug!(path = %path.display(), count = arcs.len(), "Loaded arc registry");
        Ok(Self { path, arcs })
    }

    /// Insert or overwrite an entry and persist.
    pub fn register(&mut self, id: &str, name: &str, created_at: DateTime<Utc>) -> Result<()> {
        let previous = self.arcs.insert(
            id.to_string(),
            ArcEntry {
                id: id.to_string(),
                name: name.to_string(),
                created_at,
            },
        );

        if let Err(err) = self.save() {
            match previous {
                Some(entry) => self.arcs.insert(id.to_string(), entry),
                None => self.arcs.remove(id),
            };
            return Err(err);
        }
        Ok(())
    }

    /// Remove an entry and persist.
    pub fn unregister(&mut self, id: &str) -> Result<()> {
        let previous = self.arcs.remove(id);

        if let Err(err) = self.save() {
            if let Some(entry) = previous {
                self.arcs.insert(id.to_string(), entry);
            }
            return Err(err);
        }
        Ok(())
    }

    /// Get an entry by exact id.
    pub fn get_by_id(&self, id: &str) -> Option<&ArcEntry> {
        self.arcs.get(id)
    }

    /// Get the first entry with an exact name match.
    pub fn get_by_name(&self, name: &str) -> Option<&ArcEntry> {
        self.arcs.values().find(|entry| entry.name == name)
    }

    /// Resolve by exact id, then exact name, then id prefix.
    ///
    /// Prefix matching is only attempted for probes of at least
    /// [`MIN_PREFIX_LEN`] characters.
    ///
    /// # Errors
    /// - `Error::ArcNotFound` if nothing matches
    pub fn find_arc(&self, id_or_name: &str) -> Result<ArcEntry> {
        if let Some(entry) = self.get_by_id(id_or_name) {
            return Ok(entry.clone());
        }

        if let Some(entry) = self.get_by_name(id_or_name) {
            return Ok(entry.clone());
        }

        if id_or_name.len() >= MIN_PREFIX_LEN {
            if let Some(entry) = self
                .arcs
                .values()
                .find(|entry| entry.id.starts_with(id_or_name))
            {
                return Ok(entry.clone());
            }
        }

        Err(Error::ArcNotFound(id_or_name.to_string()))
    }

    /// All entries, unordered.
    pub fn list_all(&self) -> Vec<ArcEntry> {
        self.arcs.values().cloned().collect()
    }

    /// Check whether an id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.arcs.contains_key(id)
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_owner_only(parent)?;
            }
        }

        let data = serde_json::to_vec_pretty(&self.arcs)?;
        write_atomic(&self.path, &data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn registry_in(temp: &TempDir) -> Registry {
        Registry::load(temp.path().join(REGISTRY_FILENAME)).unwrap()
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let temp = TempDir::new().unwrap();
        let registry = registry_in(&temp);
        assert!(registry.list_all().is_empty());
    }

    #[test]
    fn test_register_persists() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry_in(&temp);
        let now = Utc::now();

        registry
            .register("0f6c2a9e-1111-2222-3333-444455556666", "Invoices", now)
            .unwrap();

        let reloaded = registry_in(&temp);
        let entry = reloaded
            .get_by_id("0f6c2a9e-1111-2222-3333-444455556666")
            .unwrap();
        assert_eq!(entry.name, "Invoices");
        assert_eq!(entry.created_at, now);
    }

    #[test]
    fn test_find_arc_order() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry_in(&temp);
        registry
            .register("abcdef01-0000-0000-0000-000000000000", "Taxes", Utc::now())
            .unwrap();

        let by_id = registry
            .find_arc("abcdef01-0000-0000-0000-000000000000")
            .unwrap();
        let by_name = registry.find_arc("Taxes").unwrap();
        let by_prefix = registry.find_arc("abcdef01").unwrap();

        assert_eq!(by_id, by_name);
        assert_eq!(by_id, by_prefix);
    }

    #[test]
    fn test_short_prefix_not_matched() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry_in(&temp);
        registry
            .register("abcdef01-0000-0000-0000-000000000000", "Taxes", Utc::now())
            .unwrap();

        assert!(matches!(
            registry.find_arc("abcdef0"),
            Err(Error::ArcNotFound(_))
        ));
    }

    #[test]
    fn test_name_takes_precedence_over_prefix() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry_in(&temp);
        registry
            .register("12345678-aaaa-0000-0000-000000000000", "first", Utc::now())
            .unwrap();
        registry
            .register("ffffffff-bbbb-0000-0000-000000000000", "12345678", Utc::now())
            .unwrap();

        let entry = registry.find_arc("12345678").unwrap();
        assert_eq!(entry.id, "ffffffff-bbbb-0000-0000-000000000000");
    }

    #[test]
    fn test_duplicate_names_allowed() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry_in(&temp);
        registry.register("id-one-00000", "Same", Utc::now()).unwrap();
        registry.register("id-two-00000", "Same", Utc::now()).unwrap();

        assert_eq!(registry.list_all().len(), 2);
        // Either entry may be returned.
        let found = registry.find_arc("Same").unwrap();
        assert!(found.id == "id-one-00000" || found.id == "id-two-00000");
    }

    #[test]
    fn test_unregister() {
        let temp = TempDir::new().unwrap();
        let mut registry = registry_in(&temp);
        registry.register("id-one-00000", "One", Utc::now()).unwrap();

        registry.unregister("id-one-00000").unwrap();

        assert!(matches!(
            registry_in(&temp).find_arc("One"),
            Err(Error::ArcNotFound(_))
        ));
    }

    #[test]
    fn test_corrupt_registry_fails_to_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(REGISTRY_FILENAME);
        fs::write(&path, b"not json").unwrap();

        assert!(matches!(
            Registry::load(&path),
            Err(Error::Serialization(_))
        ));
    }
}
