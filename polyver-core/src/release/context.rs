//! State carried across the per-project loop of a versioning run.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use indexmap::{IndexMap, IndexSet};

use crate::current_version::CurrentVersionCache;
use crate::specifier::Specifier;
use crate::version_plan::VersionPlan;

/// Pairs of projects that depend on each other.
///
/// Both directions are stored so either order can be looked up directly.
#[derive(Debug, Clone, Default)]
pub struct CircularDependencies(HashSet<String>);

impl CircularDependencies {
    pub fn insert(&mut self, a: &str, b: &str) {
        self.0.insert(key(a, b));
        self.0.insert(key(b, a));
    }

    pub fn contains(&self, source: &str, target: &str) -> bool {
        self.0.contains(&key(source, target))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn key(source: &str, target: &str) -> String {
    format!("{}:{}", source, target)
}

/// Upstream projects whose bump touched each dependent.
#[derive(Debug, Clone, Default)]
pub struct ProjectToDependencyBumps(HashMap<String, IndexSet<String>>);

impl ProjectToDependencyBumps {
    pub fn record(&mut self, project: &str, dependency: &str) {
        self.0
            .entry(project.to_string())
            .or_default()
            .insert(dependency.to_string());
    }

    pub fn contains(&self, project: &str) -> bool {
        self.0.contains_key(project)
    }

    pub fn get(&self, project: &str) -> Option<&IndexSet<String>> {
        self.0.get(project)
    }
}

/// Mutable run state, threaded through every step of the loop.
#[derive(Debug, Default)]
pub struct RunContext {
    /// Reused across projects of a fixed group.
    pub current_version: CurrentVersionCache,
    /// Specifier shared by a fixed group once resolved.
    pub group_specifier: Option<Option<Specifier>>,
    pub circular: CircularDependencies,
    pub dependency_bumps: ProjectToDependencyBumps,
    /// Projects whose own version changed in this run.
    pub bumped: HashSet<String>,
    /// Package roots of projects whose manifest was written, in write order.
    pub written_roots: IndexMap<String, PathBuf>,
    pub plans_to_delete: IndexMap<PathBuf, VersionPlan>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_written(&mut self, project: &str, package_root: PathBuf) {
        if !self.written_roots.contains_key(project) {
            self.written_roots.insert(project.to_string(), package_root);
        }
    }

    pub fn schedule_plan_deletion(&mut self, plan: &VersionPlan) {
        if !self.plans_to_delete.contains_key(&plan.absolute_path) {
            self.plans_to_delete
                .insert(plan.absolute_path.clone(), plan.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_pairs_are_symmetric() {
        let mut circular = CircularDependencies::default();
        circular.insert("a", "b");
        assert!(circular.contains("a", "b"));
        assert!(circular.contains("b", "a"));
        assert!(!circular.contains("a", "c"));
    }

    #[test]
    fn test_dependency_bumps_deduplicate() {
        let mut bumps = ProjectToDependencyBumps::default();
        bumps.record("app", "lib");
        bumps.record("app", "lib");
        assert_eq!(bumps.get("app").unwrap().len(), 1);
        assert!(bumps.contains("app"));
        assert!(!bumps.contains("lib"));
    }
}
