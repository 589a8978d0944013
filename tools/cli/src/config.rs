//! Runtime settings for the `arc` binary.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Where arcs live and which secret store to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory holding one subdirectory per arc.
    pub base_dir: PathBuf,
    /// Use the OS keyring as the durable secret store.
    pub use_keyring: bool,
}

impl Settings {
    /// Resolve settings from command-line values, falling back to
    /// `~/.arcadio/arcs`.
    pub fn resolve(base_dir: Option<PathBuf>, no_keyring: bool) -> Result<Self> {
        let base_dir = match base_dir {
            Some(dir) => dir,
            None => default_base_dir()?,
        };

        Ok(Self {
            base_dir,
            use_keyring: !no_keyring,
        })
    }
}

/// Default arc directory under the user's home.
pub fn default_base_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".arcadio").join("arcs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_base_dir() {
        let settings = Settings::resolve(Some(PathBuf::from("/tmp/arcs")), true).unwrap();
        assert_eq!(settings.base_dir, PathBuf::from("/tmp/arcs"));
        assert!(!settings.use_keyring);
    }

    #[test]
    fn test_default_base_dir_layout() {
        if let Ok(dir) = default_base_dir() {
            assert!(dir.ends_with(".arcadio/arcs"));
        }
    }
}
