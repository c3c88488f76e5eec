//! Project graph data models.

use std::path::{Component, Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Name of the manifest file every versionable project carries.
pub const MANIFEST_FILE: &str = "pyproject.toml";

/// A named, independently versionable project in the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectNode {
    pub name: String,
    /// Project root, relative to the workspace root.
    pub root: PathBuf,
    /// Names of projects this project depends on, as reported by the graph provider.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl ProjectNode {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>, dependencies: Vec<String>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            dependencies,
        }
    }
}

/// Read-only graph of the workspace's projects.
#[derive(Debug, Clone)]
pub struct ProjectGraph {
    workspace_root: PathBuf,
    nodes: IndexMap<String, ProjectNode>,
}

impl ProjectGraph {
    /// Creates a project graph from a list of nodes.
    ///
    /// # Errors
    ///
    /// Returns an error if two nodes share a name or a node depends on a project
    /// that is not part of the graph.
    pub fn new(workspace_root: impl Into<PathBuf>, projects: Vec<ProjectNode>) -> Result<Self> {
        let mut nodes = IndexMap::new();
        for project in projects {
            if nodes.contains_key(&project.name) {
                return Err(Error::DuplicateProject(project.name));
            }
            nodes.insert(project.name.clone(), project);
        }

        let graph = Self {
            workspace_root: workspace_root.into(),
            nodes,
        };

        for node in graph.nodes.values() {
            for dep in &node.dependencies {
                if !graph.nodes.contains_key(dep) {
                    return Err(graph.not_found(dep));
                }
            }
        }

        Ok(graph)
    }

    #[inline]
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&ProjectNode> {
        self.nodes.get(name)
    }

    /// Looks up a project, failing with the list of known projects.
    pub fn require(&self, name: &str) -> Result<&ProjectNode> {
        self.nodes.get(name).ok_or_else(|| self.not_found(name))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &ProjectNode> {
        self.nodes.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolves the package root of every project in the graph.
    pub fn package_roots(&self, template: Option<&str>) -> PackageRoots {
        PackageRoots(
            self.nodes
                .values()
                .map(|node| (node.name.clone(), resolve_package_root(node, template)))
                .collect(),
        )
    }

    fn not_found(&self, name: &str) -> Error {
        Error::ProjectNotFound {
            name: name.to_string(),
            available: self.nodes.keys().cloned().collect::<Vec<_>>().join(", "),
        }
    }
}

/// Package root of each project, keyed by project name.
#[derive(Debug, Clone, Default)]
pub struct PackageRoots(IndexMap<String, PathBuf>);

impl PackageRoots {
    pub fn get(&self, project: &str) -> Option<&Path> {
        self.0.get(project).map(PathBuf::as_path)
    }

    pub fn require(&self, project: &str) -> Result<&Path> {
        self.get(project)
            .ok_or_else(|| Error::MissingPackageRoot(project.to_string()))
    }

    /// Workspace-relative path of the project's manifest.
    pub fn manifest_path(&self, project: &str) -> Result<PathBuf> {
        Ok(self.require(project)?.join(MANIFEST_FILE))
    }
}

/// Resolves where a project's manifest lives.
///
/// `template` may reference `{projectRoot}` and `{projectName}`. Without a
/// template the package root is the project root.
pub fn resolve_package_root(project: &ProjectNode, template: Option<&str>) -> PathBuf {
    let Some(template) = template else {
        return normalize(&project.root);
    };

    let root = project.root.to_string_lossy();
    let interpolated = template
        .replace("{projectRoot}", &root)
        .replace("{projectName}", &project.name);
    normalize(Path::new(&interpolated))
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
