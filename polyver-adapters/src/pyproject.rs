//! Filesystem-backed store for `pyproject.toml` manifests.
//!
//! Reads go to disk; writes are staged in memory and only reach disk on
//! [`PyprojectStore::commit`], so a dry run never touches the workspace.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use polyver_core::error::{Error, Result};
use polyver_core::manifest::Manifest;
use polyver_core::store::ManifestStore;
use tracing::debug;

/// Manifest store rooted at a workspace directory.
pub struct PyprojectStore {
    workspace_root: PathBuf,
    staged: HashMap<PathBuf, Manifest>,
    written: IndexSet<PathBuf>,
}

impl PyprojectStore {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            staged: HashMap::new(),
            written: IndexSet::new(),
        }
    }

    #[inline]
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Writes every staged manifest to disk, returning the paths written.
    ///
    /// # Errors
    ///
    /// Returns an error if a manifest cannot be serialized or written.
    pub fn commit(&mut self) -> Result<Vec<PathBuf>> {
        let mut committed = Vec::with_capacity(self.written.len());
        for path in &self.written {
            let Some(manifest) = self.staged.get(path) else {
                continue;
            };
            let absolute = self.workspace_root.join(path);
            let content = manifest.to_toml_string().map_err(|e| Error::Manifest {
                path: absolute.clone(),
                message: format!("Failed to serialize pyproject.toml: {}", e),
            })?;
            fs::write(&absolute, content).map_err(|e| Error::Manifest {
                path: absolute.clone(),
                message: format!("Failed to write pyproject.toml: {}", e),
            })?;
            debug!("Wrote {}", absolute.display());
            committed.push(path.clone());
        }
        Ok(committed)
    }
}

impl ManifestStore for PyprojectStore {
    fn exists(&self, path: &Path) -> bool {
        self.staged.contains_key(path) || self.workspace_root.join(path).is_file()
    }

    fn read(&self, path: &Path) -> Result<Manifest> {
        if let Some(manifest) = self.staged.get(path) {
            return Ok(manifest.clone());
        }

        let absolute = self.workspace_root.join(path);
        let content = fs::read_to_string(&absolute).map_err(|e| Error::Manifest {
            path: absolute.clone(),
            message: format!("Failed to read pyproject.toml: {}", e),
        })?;
        Manifest::parse(&content).map_err(|e| Error::Manifest {
            path: absolute,
            message: format!("Failed to parse pyproject.toml: {}. File may be malformed.", e),
        })
    }

    fn write(&mut self, path: &Path, manifest: &Manifest) -> Result<()> {
        self.staged.insert(path.to_path_buf(), manifest.clone());
        self.written.insert(path.to_path_buf());
        Ok(())
    }

    fn changed_paths(&self) -> Vec<PathBuf> {
        self.written.iter().cloned().collect()
    }
}
