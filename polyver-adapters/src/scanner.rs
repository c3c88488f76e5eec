//! Workspace scanner for discovering Poetry projects.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use polyver_core::error::Result;
use polyver_core::manifest::Manifest;
use polyver_core::project::{ProjectGraph, ProjectNode, MANIFEST_FILE};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

const SKIPPED_DIRS: [&str; 5] = ["node_modules", "venv", "__pycache__", "dist", "build"];

/// Scans a workspace for `pyproject.toml` files below its root.
///
/// Every named manifest becomes a project; local path dependencies that
/// resolve to another project's directory become graph edges. The root
/// `pyproject.toml` itself is not treated as a project.
pub struct Scanner {
    workspace_root: PathBuf,
}

impl Scanner {
    pub fn new(workspace_root: impl AsRef<Path>) -> Self {
        Self {
            workspace_root: workspace_root.as_ref().to_path_buf(),
        }
    }

    /// # Errors
    ///
    /// Returns an error if a manifest cannot be read or two projects share a
    /// name.
    pub fn scan(&self) -> Result<ProjectGraph> {
        let manifests: Vec<PathBuf> = WalkDir::new(&self.workspace_root)
            .min_depth(2)
            .into_iter()
            .filter_entry(|e| !is_skipped(e))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && e.file_name() == MANIFEST_FILE)
            .map(|e| e.path().to_path_buf())
            .collect();

        let mut found: Vec<(String, PathBuf, Manifest)> = Vec::new();
        for manifest_path in manifests {
            let content = fs::read_to_string(&manifest_path)?;
            let manifest = match Manifest::parse(&content) {
                Ok(manifest) => manifest,
                Err(e) => {
                    debug!("Skipping {}: {}", manifest_path.display(), e);
                    continue;
                }
            };
            let Some(name) = manifest.name().map(str::to_string) else {
                debug!("Skipping unnamed project at {}", manifest_path.display());
                continue;
            };
            let root = manifest_path
                .parent()
                .and_then(|dir| dir.strip_prefix(&self.workspace_root).ok())
                .map(Path::to_path_buf)
                .unwrap_or_default();
            found.push((name, root, manifest));
        }

        let by_root: HashMap<PathBuf, String> = found
            .iter()
            .map(|(name, root, _)| (root.clone(), name.clone()))
            .collect();

        let mut nodes: Vec<ProjectNode> = found
            .iter()
            .map(|(name, root, manifest)| {
                let mut dependencies: Vec<String> = manifest
                    .dependencies()
                    .into_iter()
                    .filter_map(|dep| dep.spec.path().map(|p| normalize(&root.join(p))))
                    .filter_map(|target| by_root.get(&target).cloned())
                    .filter(|target| target != name)
                    .collect();
                dependencies.sort();
                dependencies.dedup();
                ProjectNode::new(name.clone(), root.clone(), dependencies)
            })
            .collect();
        nodes.sort_by(|a, b| a.name.cmp(&b.name));

        ProjectGraph::new(self.workspace_root.clone(), nodes)
    }
}

fn is_skipped(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref())
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
