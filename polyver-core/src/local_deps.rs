//! Local package dependency resolution.
//!
//! A local package dependency exists when a project's manifest declares a
//! path dependency on the package published by another workspace project.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::manifest::{normalize_package_name, DependencyCollection, Manifest};
use crate::project::{PackageRoots, ProjectGraph};
use crate::store::ManifestStore;

/// `source` declares a path dependency on `target`'s package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalPackageDependency {
    pub source: String,
    pub target: String,
    pub dependency_collection: DependencyCollection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_key: Option<String>,
}

/// Local dependency edges indexed by both endpoints.
#[derive(Debug, Clone, Default)]
pub struct LocalDependencies {
    edges: Vec<LocalPackageDependency>,
    by_source: HashMap<String, Vec<usize>>,
    by_target: HashMap<String, Vec<usize>>,
}

impl LocalDependencies {
    pub fn from_edges(edges: Vec<LocalPackageDependency>) -> Self {
        let mut by_source: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_target: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, edge) in edges.iter().enumerate() {
            by_source.entry(edge.source.clone()).or_default().push(idx);
            by_target.entry(edge.target.clone()).or_default().push(idx);
        }
        Self {
            edges,
            by_source,
            by_target,
        }
    }

    /// Builds the local dependency edges for `projects`.
    ///
    /// With `include_all`, dependents outside `projects` are resolved too so
    /// they can be notified of bumps. Candidate targets come from the project
    /// graph; an edge is kept only when the source manifest declares a path
    /// dependency on the target's package.
    ///
    /// # Errors
    ///
    /// Returns an error if a selected project has no readable manifest.
    pub fn resolve(
        graph: &ProjectGraph,
        store: &dyn ManifestStore,
        projects: &[String],
        package_roots: &PackageRoots,
        include_all: bool,
    ) -> Result<Self> {
        let selected: HashSet<&str> = projects.iter().map(String::as_str).collect();

        let mut manifests: HashMap<&str, Manifest> = HashMap::new();
        for node in graph.nodes() {
            let path = package_roots.manifest_path(&node.name)?;
            if !store.exists(&path) {
                if selected.contains(node.name.as_str()) {
                    return Err(Error::MissingManifest {
                        project: node.name.clone(),
                        path,
                    });
                }
                continue;
            }
            match store.read(&path) {
                Ok(manifest) => {
                    manifests.insert(node.name.as_str(), manifest);
                }
                Err(e) if selected.contains(node.name.as_str()) => return Err(e),
                Err(e) => debug!("Skipping unreadable manifest {}: {}", path.display(), e),
            }
        }

        let package_names: HashMap<&str, String> = manifests
            .iter()
            .filter_map(|(project, manifest)| {
                manifest
                    .name()
                    .map(|name| (*project, normalize_package_name(name)))
            })
            .collect();

        let mut edges = Vec::new();
        for node in graph.nodes() {
            if !include_all && !selected.contains(node.name.as_str()) {
                continue;
            }
            let Some(manifest) = manifests.get(node.name.as_str()) else {
                continue;
            };

            let declared: Vec<_> = manifest
                .dependencies()
                .into_iter()
                .filter(|dep| dep.spec.is_local_path())
                .collect();

            for target in &node.dependencies {
                if target == &node.name {
                    continue;
                }
                let Some(target_package) = package_names.get(target.as_str()) else {
                    debug!(
                        "Skipping dependency {} -> {}: no resolvable manifest",
                        node.name, target
                    );
                    continue;
                };

                if let Some(dep) = declared
                    .iter()
                    .find(|dep| &normalize_package_name(&dep.name) == target_package)
                {
                    edges.push(LocalPackageDependency {
                        source: node.name.clone(),
                        target: target.clone(),
                        dependency_collection: dep.collection,
                        group_key: dep.group_key.clone(),
                    });
                }
            }
        }

        Ok(Self::from_edges(edges))
    }

    pub fn edges(&self) -> &[LocalPackageDependency] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Edges whose target is `project` ("who depends on me").
    pub fn dependents_of(&self, project: &str) -> Vec<&LocalPackageDependency> {
        self.lookup(&self.by_target, project)
    }

    /// Edges whose source is `project`.
    pub fn dependencies_of(&self, project: &str) -> Vec<&LocalPackageDependency> {
        self.lookup(&self.by_source, project)
    }

    pub fn depends_on(&self, source: &str, target: &str) -> bool {
        self.dependencies_of(source)
            .iter()
            .any(|edge| edge.target == target)
    }

    fn lookup<'a>(
        &'a self,
        index: &HashMap<String, Vec<usize>>,
        project: &str,
    ) -> Vec<&'a LocalPackageDependency> {
        index
            .get(project)
            .map(|indices| indices.iter().map(|&idx| &self.edges[idx]).collect())
            .unwrap_or_default()
    }
}
