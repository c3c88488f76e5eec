//! Manifest document store abstraction.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;

use crate::error::{Error, Result};
use crate::manifest::Manifest;

/// Read/write access to manifest documents, keyed by workspace-relative path.
///
/// The engine never touches the filesystem directly; every manifest read and
/// write goes through this trait.
pub trait ManifestStore: Send {
    fn exists(&self, path: &Path) -> bool;

    /// # Errors
    ///
    /// Returns an error if the manifest is missing or cannot be parsed.
    fn read(&self, path: &Path) -> Result<Manifest>;

    /// # Errors
    ///
    /// Returns an error if the manifest cannot be staged.
    fn write(&mut self, path: &Path, manifest: &Manifest) -> Result<()>;

    /// Paths written so far, in first-write order.
    fn changed_paths(&self) -> Vec<PathBuf>;
}

/// In-memory manifest store.
#[derive(Debug, Default, Clone)]
pub struct MemoryManifestStore {
    manifests: HashMap<PathBuf, Manifest>,
    written: IndexSet<PathBuf>,
}

impl MemoryManifestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a manifest without marking it as changed.
    ///
    /// # Errors
    ///
    /// Returns an error if `content` is not valid TOML.
    pub fn insert(&mut self, path: impl Into<PathBuf>, content: &str) -> Result<()> {
        let path = path.into();
        let manifest = Manifest::parse(content).map_err(|e| Error::Manifest {
            path: path.clone(),
            message: e.to_string(),
        })?;
        self.manifests.insert(path, manifest);
        Ok(())
    }

    pub fn get(&self, path: &Path) -> Option<&Manifest> {
        self.manifests.get(path)
    }
}

impl ManifestStore for MemoryManifestStore {
    fn exists(&self, path: &Path) -> bool {
        self.manifests.contains_key(path)
    }

    fn read(&self, path: &Path) -> Result<Manifest> {
        self.manifests.get(path).cloned().ok_or_else(|| Error::Manifest {
            path: path.to_path_buf(),
            message: "file does not exist".to_string(),
        })
    }

    fn write(&mut self, path: &Path, manifest: &Manifest) -> Result<()> {
        self.manifests.insert(path.to_path_buf(), manifest.clone());
        self.written.insert(path.to_path_buf());
        Ok(())
    }

    fn changed_paths(&self) -> Vec<PathBuf> {
        self.written.iter().cloned().collect()
    }
}
