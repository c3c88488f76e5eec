//! Aggregated per-project versioning results.

use indexmap::map::Entry;
use indexmap::IndexMap;
use semver::Version;
use serde::Serialize;

use crate::local_deps::LocalPackageDependency;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDataEntry {
    pub current_version: Option<String>,
    pub new_version: Option<String>,
    pub dependent_projects: Vec<LocalPackageDependency>,
}

/// Versioning results keyed by project name, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VersionData(IndexMap<String, VersionDataEntry>);

impl VersionData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, project: &str) -> Option<&VersionDataEntry> {
        self.0.get(project)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &VersionDataEntry)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn new_version(&self, project: &str) -> Option<&str> {
        self.0.get(project).and_then(|e| e.new_version.as_deref())
    }

    /// Merges `entry` into the record for `project`.
    ///
    /// A recorded `new_version` is only replaced by a semver-greater one, and
    /// dependents are accumulated without duplicates.
    pub fn record(&mut self, project: &str, entry: VersionDataEntry) {
        match self.0.entry(project.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                if existing.current_version.is_none() {
                    existing.current_version = entry.current_version;
                }
                if supersedes(entry.new_version.as_deref(), existing.new_version.as_deref()) {
                    existing.new_version = entry.new_version;
                }
                for dependent in entry.dependent_projects {
                    if !existing.dependent_projects.contains(&dependent) {
                        existing.dependent_projects.push(dependent);
                    }
                }
            }
        }
    }
}

fn supersedes(candidate: Option<&str>, existing: Option<&str>) -> bool {
    match (candidate, existing) {
        (None, _) => false,
        (Some(_), None) => true,
        (Some(candidate), Some(existing)) => {
            match (Version::parse(candidate), Version::parse(existing)) {
                (Ok(candidate), Ok(existing)) => candidate > existing,
                _ => false,
            }
        }
    }
}
