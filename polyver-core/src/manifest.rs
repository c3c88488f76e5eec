//! `pyproject.toml` document model.
//!
//! Name and version are read from `[tool.poetry]`, falling back to PEP 621
//! `[project]`. Dependencies are read from Poetry's dependency tables:
//! `[tool.poetry.dependencies]`, the legacy `[tool.poetry.dev-dependencies]`,
//! and every `[tool.poetry.group.<name>.dependencies]`.

use serde::{Deserialize, Serialize};
use toml::{Table, Value};

use crate::error::Result;

/// Which dependency collection of a manifest an entry was declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyCollection {
    Main,
    Dev,
    Optional,
}

impl DependencyCollection {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyCollection::Main => "main",
            DependencyCollection::Dev => "dev",
            DependencyCollection::Optional => "optional",
        }
    }

    fn for_group(group: &str) -> Self {
        if group == "dev" {
            DependencyCollection::Dev
        } else {
            DependencyCollection::Optional
        }
    }
}

/// A single dependency entry as written in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencySpec {
    /// `name = "^1.0.0"`
    Version(String),
    /// `name = { version = "^1.0.0", path = "../lib", develop = true, extras = [...] }`
    Detailed {
        version: Option<String>,
        path: Option<String>,
        develop: Option<bool>,
        extras: Vec<String>,
    },
}

impl DependencySpec {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(version) => Some(DependencySpec::Version(version.clone())),
            Value::Table(table) => Some(DependencySpec::Detailed {
                version: table
                    .get("version")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string()),
                path: table
                    .get("path")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string()),
                develop: table.get("develop").and_then(|v| v.as_bool()),
                extras: table
                    .get("extras")
                    .and_then(|v| v.as_array())
                    .map(|arr| {
                        arr.iter()
                            .filter_map(|v| v.as_str().map(|s| s.to_string()))
                            .collect()
                    })
                    .unwrap_or_default(),
            }),
            _ => None,
        }
    }

    /// Whether the entry references a workspace project by path.
    pub fn is_local_path(&self) -> bool {
        matches!(self, DependencySpec::Detailed { path: Some(_), .. })
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            DependencySpec::Version(_) => None,
            DependencySpec::Detailed { path, .. } => path.as_deref(),
        }
    }

    /// The recorded version requirement, if any.
    pub fn version(&self) -> Option<&str> {
        match self {
            DependencySpec::Version(version) => Some(version),
            DependencySpec::Detailed { version, .. } => version.as_deref(),
        }
    }
}

/// A dependency entry together with where it was declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestDependency {
    pub name: String,
    pub collection: DependencyCollection,
    pub group_key: Option<String>,
    pub spec: DependencySpec,
}

/// A parsed `pyproject.toml`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Manifest {
    document: Table,
}

impl Manifest {
    /// Parses manifest content.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML.
    pub fn parse(content: &str) -> Result<Self> {
        let document: Table = content.parse()?;
        Ok(Self { document })
    }

    pub fn from_table(document: Table) -> Self {
        Self { document }
    }

    pub fn as_table(&self) -> &Table {
        &self.document
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(&self.document)?)
    }

    pub fn name(&self) -> Option<&str> {
        self.poetry()
            .and_then(|p| p.get("name"))
            .and_then(|v| v.as_str())
            .or_else(|| {
                self.project()
                    .and_then(|p| p.get("name"))
                    .and_then(|v| v.as_str())
            })
    }

    pub fn version(&self) -> Option<&str> {
        self.poetry()
            .and_then(|p| p.get("version"))
            .and_then(|v| v.as_str())
            .or_else(|| {
                self.project()
                    .and_then(|p| p.get("version"))
                    .and_then(|v| v.as_str())
            })
    }

    /// Writes `version` into the section [`Manifest::version`] reads from.
    ///
    /// Without any version yet, `[tool.poetry]` is preferred over
    /// `[project]`. Returns `false` when neither section exists.
    pub fn set_version(&mut self, version: &str) -> bool {
        let poetry_has_version = self
            .poetry()
            .map(|p| p.contains_key("version"))
            .unwrap_or(false);
        let project_has_version = self
            .project()
            .map(|p| p.contains_key("version"))
            .unwrap_or(false);
        let has_poetry = self.poetry().is_some();

        let use_project = !poetry_has_version && (project_has_version || !has_poetry);
        let section = if use_project {
            self.document.get_mut("project").and_then(|p| p.as_table_mut())
        } else {
            self.document
                .get_mut("tool")
                .and_then(|t| t.get_mut("poetry"))
                .and_then(|p| p.as_table_mut())
        };

        match section {
            Some(table) => {
                table.insert("version".to_string(), Value::String(version.to_string()));
                true
            }
            None => false,
        }
    }

    /// Returns every dependency entry across all Poetry dependency collections.
    pub fn dependencies(&self) -> Vec<ManifestDependency> {
        let mut result = Vec::new();
        let Some(poetry) = self.poetry() else {
            return result;
        };

        let mut push_table = |table: Option<&Table>,
                              collection: DependencyCollection,
                              group_key: Option<&str>| {
            if let Some(table) = table {
                for (name, value) in table {
                    if let Some(spec) = DependencySpec::from_value(value) {
                        result.push(ManifestDependency {
                            name: name.clone(),
                            collection,
                            group_key: group_key.map(|g| g.to_string()),
                            spec,
                        });
                    }
                }
            }
        };

        push_table(
            poetry.get("dependencies").and_then(|v| v.as_table()),
            DependencyCollection::Main,
            None,
        );
        push_table(
            poetry.get("dev-dependencies").and_then(|v| v.as_table()),
            DependencyCollection::Dev,
            None,
        );
        if let Some(groups) = poetry.get("group").and_then(|v| v.as_table()) {
            for (group, group_table) in groups {
                push_table(
                    group_table.get("dependencies").and_then(|v| v.as_table()),
                    DependencyCollection::for_group(group),
                    Some(group),
                );
            }
        }

        result
    }

    /// Looks up a dependency entry by (normalized) package name.
    pub fn dependency(
        &self,
        collection: DependencyCollection,
        group_key: Option<&str>,
        name: &str,
    ) -> Option<DependencySpec> {
        let table = self.collection_table(collection, group_key)?;
        let wanted = normalize_package_name(name);
        table
            .iter()
            .find(|(key, _)| normalize_package_name(key) == wanted)
            .and_then(|(_, value)| DependencySpec::from_value(value))
    }

    /// Overwrites the recorded version requirement of a dependency.
    ///
    /// Table entries keep their `path`, `develop` and `extras` keys. Returns
    /// `false` if the entry does not exist.
    pub fn set_dependency_version(
        &mut self,
        collection: DependencyCollection,
        group_key: Option<&str>,
        name: &str,
        version: &str,
    ) -> bool {
        let wanted = normalize_package_name(name);
        let Some(table) = self.collection_table_mut(collection, group_key) else {
            return false;
        };
        let Some((_, entry)) = table
            .iter_mut()
            .find(|(key, _)| normalize_package_name(key) == wanted)
        else {
            return false;
        };

        match entry {
            Value::Table(detail) => {
                detail.insert("version".to_string(), Value::String(version.to_string()));
            }
            other => *other = Value::String(version.to_string()),
        }
        true
    }

    fn poetry(&self) -> Option<&Table> {
        self.document
            .get("tool")
            .and_then(|t| t.get("poetry"))
            .and_then(|p| p.as_table())
    }

    fn project(&self) -> Option<&Table> {
        self.document.get("project").and_then(|p| p.as_table())
    }

    fn collection_table(
        &self,
        collection: DependencyCollection,
        group_key: Option<&str>,
    ) -> Option<&Table> {
        let poetry = self.poetry()?;
        match (collection, group_key) {
            (_, Some(group)) => poetry
                .get("group")
                .and_then(|g| g.get(group))
                .and_then(|g| g.get("dependencies"))
                .and_then(|d| d.as_table()),
            (DependencyCollection::Main, None) => {
                poetry.get("dependencies").and_then(|d| d.as_table())
            }
            (_, None) => poetry.get("dev-dependencies").and_then(|d| d.as_table()),
        }
    }

    fn collection_table_mut(
        &mut self,
        collection: DependencyCollection,
        group_key: Option<&str>,
    ) -> Option<&mut Table> {
        let poetry = self
            .document
            .get_mut("tool")
            .and_then(|t| t.get_mut("poetry"))
            .and_then(|p| p.as_table_mut())?;
        match (collection, group_key) {
            (_, Some(group)) => poetry
                .get_mut("group")
                .and_then(|g| g.get_mut(group))
                .and_then(|g| g.get_mut("dependencies"))
                .and_then(|d| d.as_table_mut()),
            (DependencyCollection::Main, None) => poetry
                .get_mut("dependencies")
                .and_then(|d| d.as_table_mut()),
            (_, None) => poetry
                .get_mut("dev-dependencies")
                .and_then(|d| d.as_table_mut()),
        }
    }
}

/// Normalizes a Python package name (PEP 503): lowercase, with runs of
/// `-`, `_` and `.` collapsed into a single `-`.
pub fn normalize_package_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut last_was_separator = false;
    for ch in name.chars() {
        if matches!(ch, '-' | '_' | '.') {
            if !last_was_separator {
                normalized.push('-');
            }
            last_was_separator = true;
        } else {
            normalized.extend(ch.to_lowercase());
            last_was_separator = false;
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    const POETRY_MANIFEST: &str = r#"
[tool.poetry]
name = "app-b"
version = "2.0.0"

[tool.poetry.dependencies]
python = "^3.11"
lib-a = { version = "^1.0.0", path = "../lib-a", develop = true, extras = ["fast"] }

[tool.poetry.group.dev.dependencies]
lib_tools = { path = "../lib-tools" }

[tool.poetry.group.docs.dependencies]
lib-docs = { path = "../lib-docs" }
"#;

    #[test]
    fn test_read_name_and_version_poetry() {
        let manifest = Manifest::parse(POETRY_MANIFEST).unwrap();
        assert_eq!(manifest.name(), Some("app-b"));
        assert_eq!(manifest.version(), Some("2.0.0"));
    }

    #[test]
    fn test_read_name_and_version_pep621() {
        let manifest = Manifest::parse("[project]\nname = \"lib\"\nversion = \"0.3.0\"\n").unwrap();
        assert_eq!(manifest.name(), Some("lib"));
        assert_eq!(manifest.version(), Some("0.3.0"));
    }

    #[test]
    fn test_set_version_prefers_project_with_version() {
        let mut manifest = Manifest::parse(
            "[project]\nname = \"lib\"\nversion = \"0.3.0\"\n\n[tool.poetry]\nname = \"lib\"\n",
        )
        .unwrap();
        assert!(manifest.set_version("0.4.0"));
        assert_eq!(manifest.version(), Some("0.4.0"));
        assert!(manifest.as_table()["tool"]["poetry"].get("version").is_none());
    }

    #[test]
    fn test_poetry_version_wins_over_project() {
        let mut manifest = Manifest::parse(
            "[project]\nname = \"lib\"\nversion = \"0.0.0\"\n\n[tool.poetry]\nname = \"lib\"\nversion = \"1.4.0\"\n",
        )
        .unwrap();
        assert_eq!(manifest.name(), Some("lib"));
        assert_eq!(manifest.version(), Some("1.4.0"));

        assert!(manifest.set_version("1.5.0"));
        assert_eq!(manifest.version(), Some("1.5.0"));
        assert_eq!(
            manifest.as_table()["tool"]["poetry"]["version"].as_str(),
            Some("1.5.0")
        );
        assert_eq!(manifest.as_table()["project"]["version"].as_str(), Some("0.0.0"));
    }

    #[test]
    fn test_set_version_without_sections() {
        let mut manifest = Manifest::parse("[build-system]\nrequires = []\n").unwrap();
        assert!(!manifest.set_version("1.0.0"));
    }

    #[test]
    fn test_dependencies_classification() {
        let manifest = Manifest::parse(POETRY_MANIFEST).unwrap();
        let deps = manifest.dependencies();

        let lib_a = deps.iter().find(|d| d.name == "lib-a").unwrap();
        assert_eq!(lib_a.collection, DependencyCollection::Main);
        assert!(lib_a.spec.is_local_path());
        assert_eq!(lib_a.spec.version(), Some("^1.0.0"));

        let tools = deps.iter().find(|d| d.name == "lib_tools").unwrap();
        assert_eq!(tools.collection, DependencyCollection::Dev);
        assert_eq!(tools.group_key.as_deref(), Some("dev"));

        let docs = deps.iter().find(|d| d.name == "lib-docs").unwrap();
        assert_eq!(docs.collection, DependencyCollection::Optional);
        assert_eq!(docs.group_key.as_deref(), Some("docs"));

        let python = deps.iter().find(|d| d.name == "python").unwrap();
        assert!(!python.spec.is_local_path());
    }

    #[test]
    fn test_set_dependency_version_keeps_path_keys() {
        let mut manifest = Manifest::parse(POETRY_MANIFEST).unwrap();
        assert!(manifest.set_dependency_version(DependencyCollection::Main, None, "lib-a", "^1.0.1"));

        let spec = manifest
            .dependency(DependencyCollection::Main, None, "lib-a")
            .unwrap();
        assert_eq!(
            spec,
            DependencySpec::Detailed {
                version: Some("^1.0.1".to_string()),
                path: Some("../lib-a".to_string()),
                develop: Some(true),
                extras: vec!["fast".to_string()],
            }
        );
    }

    #[test]
    fn test_set_dependency_version_normalized_name() {
        let mut manifest = Manifest::parse(POETRY_MANIFEST).unwrap();
        assert!(manifest.set_dependency_version(
            DependencyCollection::Dev,
            Some("dev"),
            "Lib-Tools",
            "1.2.0"
        ));
        let spec = manifest
            .dependency(DependencyCollection::Dev, Some("dev"), "lib-tools")
            .unwrap();
        assert_eq!(spec.version(), Some("1.2.0"));
    }

    #[test]
    fn test_normalize_package_name() {
        assert_eq!(normalize_package_name("My__Package.name"), "my-package-name");
    }
}
