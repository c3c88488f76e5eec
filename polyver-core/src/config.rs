//! TOML configuration for release versioning (`polyver.toml`).

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use semver::Prerelease;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::specifier::Specifier;
use crate::tag_pattern::{TagPattern, DEFAULT_FIXED_PATTERN, DEFAULT_INDEPENDENT_PATTERN};

pub const CONFIG_FILE: &str = "polyver.toml";
pub const DEFAULT_GROUP_NAME: &str = "__default__";
pub const DEFAULT_VERSION_PLANS_DIR: &str = ".polyver/version-plans";
pub const DEFAULT_REGISTRY: &str = "https://pypi.org/pypi";

macro_rules! string_enum {
    ($name:ident, $label:literal, [$($variant:ident => $value:literal),+ $(,)?]) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($value => Ok($name::$variant),)+
                    other => Err(Error::Config(format!(
                        "Invalid {} \"{}\" provided. Must be one of {}",
                        $label,
                        other,
                        [$(concat!("\"", $value, "\"")),+].join(", ")
                    ))),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = Error;

            fn try_from(value: String) -> Result<Self> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// Whether projects in a release group share one version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProjectsRelationship {
    #[default]
    Fixed,
    Independent,
}

string_enum!(ProjectsRelationship, "projects_relationship", [
    Fixed => "fixed",
    Independent => "independent",
]);

/// Where the version specifier comes from when none is given explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SpecifierSource {
    #[default]
    Prompt,
    ConventionalCommits,
    VersionPlans,
}

string_enum!(SpecifierSource, "specifier_source", [
    Prompt => "prompt",
    ConventionalCommits => "conventional-commits",
    VersionPlans => "version-plans",
]);

/// How the current version of a project is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CurrentVersionResolver {
    #[default]
    Disk,
    GitTag,
    Registry,
}

string_enum!(CurrentVersionResolver, "current_version_resolver", [
    Disk => "disk",
    GitTag => "git-tag",
    Registry => "registry",
]);

/// Whether bumps propagate to dependents outside the current batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum UpdateDependents {
    #[default]
    Never,
    Auto,
}

string_enum!(UpdateDependents, "update_dependents", [
    Never => "never",
    Auto => "auto",
]);

/// Range operator written in front of updated dependency versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum VersionPrefix {
    /// Keep whatever operator the dependent already uses.
    #[default]
    Auto,
    None,
    Tilde,
    Caret,
    Equals,
}

string_enum!(VersionPrefix, "version_prefix", [
    Auto => "auto",
    None => "",
    Tilde => "~",
    Caret => "^",
    Equals => "=",
]);

impl VersionPrefix {
    /// The concrete prefix for a dependency currently recorded as `current`.
    pub fn resolve(&self, current: Option<&str>) -> &'static str {
        match self {
            VersionPrefix::Auto => match current.and_then(|c| c.chars().next()) {
                Some('^') => "^",
                Some('~') => "~",
                _ => "",
            },
            other => other.as_str(),
        }
    }
}

/// A set of projects released together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseGroup {
    #[serde(rename = "group_name")]
    pub name: String,
    pub projects_relationship: ProjectsRelationship,
    pub version_plans: bool,
    pub version_plans_dir: String,
}

impl Default for ReleaseGroup {
    fn default() -> Self {
        Self {
            name: DEFAULT_GROUP_NAME.to_string(),
            projects_relationship: ProjectsRelationship::Fixed,
            version_plans: false,
            version_plans_dir: DEFAULT_VERSION_PLANS_DIR.to_string(),
        }
    }
}

impl ReleaseGroup {
    #[inline]
    pub fn is_independent(&self) -> bool {
        self.projects_relationship == ProjectsRelationship::Independent
    }

    #[inline]
    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_GROUP_NAME
    }
}

/// Options controlling a versioning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseVersionOptions {
    pub specifier: Option<String>,
    pub specifier_source: SpecifierSource,
    pub current_version_resolver: CurrentVersionResolver,
    pub fallback_current_version_resolver: Option<CurrentVersionResolver>,
    pub tag_pattern: Option<String>,
    pub registry: Option<String>,
    pub update_dependents: UpdateDependents,
    pub version_prefix: VersionPrefix,
    pub preid: Option<String>,
    pub log_unchanged_projects: bool,
    pub package_root: Option<String>,
    pub skip_lock_file_update: bool,
    pub delete_version_plans: bool,
    pub first_release: bool,
}

impl Default for ReleaseVersionOptions {
    fn default() -> Self {
        Self {
            specifier: None,
            specifier_source: SpecifierSource::default(),
            current_version_resolver: CurrentVersionResolver::default(),
            fallback_current_version_resolver: None,
            tag_pattern: None,
            registry: None,
            update_dependents: UpdateDependents::default(),
            version_prefix: VersionPrefix::default(),
            preid: None,
            log_unchanged_projects: true,
            package_root: None,
            skip_lock_file_update: false,
            delete_version_plans: true,
            first_release: false,
        }
    }
}

impl ReleaseVersionOptions {
    /// Checks the options for configuration errors before anything is mutated.
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first problem found.
    pub fn validate(&self, group: &ReleaseGroup) -> Result<()> {
        if let Some(specifier) = &self.specifier {
            Specifier::parse(specifier)?;
        }

        if let Some(fallback) = self.fallback_current_version_resolver {
            if fallback != CurrentVersionResolver::Disk {
                return Err(Error::Config(format!(
                    "Invalid fallback_current_version_resolver \"{}\" provided. Only \"disk\" is supported",
                    fallback
                )));
            }
        }

        if let Some(preid) = self.preid.as_deref().filter(|p| !p.is_empty()) {
            Prerelease::new(preid).map_err(|e| {
                Error::Config(format!("Invalid preid \"{}\": {}", preid, e))
            })?;
        }

        if self.specifier.is_none() {
            match self.specifier_source {
                SpecifierSource::ConventionalCommits
                    if self.current_version_resolver != CurrentVersionResolver::GitTag =>
                {
                    return Err(Error::Config(format!(
                        "Invalid current_version_resolver \"{}\" provided for release group \"{}\". Must be \"git-tag\" when specifier_source is \"conventional-commits\"",
                        self.current_version_resolver, group.name
                    )));
                }
                SpecifierSource::VersionPlans if !group.version_plans => {
                    return Err(Error::Config(
                        "Invalid specifier_source \"version-plans\" provided. To enable version plans, set release.version_plans to true".to_string(),
                    ));
                }
                _ => {}
            }
        }

        Ok(())
    }

    pub fn tag_pattern(&self, group: &ReleaseGroup) -> TagPattern {
        match &self.tag_pattern {
            Some(pattern) => TagPattern::new(pattern.clone()),
            None if group.is_independent() => TagPattern::new(DEFAULT_INDEPENDENT_PATTERN),
            None => TagPattern::new(DEFAULT_FIXED_PATTERN),
        }
    }

    pub fn registry_url(&self) -> &str {
        self.registry.as_deref().unwrap_or(DEFAULT_REGISTRY)
    }

    pub fn preid(&self) -> Option<&str> {
        self.preid.as_deref().filter(|p| !p.is_empty())
    }

    /// Whether a missing tag or registry entry may fall back to the disk version.
    pub fn falls_back_to_disk(&self) -> bool {
        self.first_release
            || self.fallback_current_version_resolver == Some(CurrentVersionResolver::Disk)
    }
}

/// The `[release]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    #[serde(flatten)]
    pub group: ReleaseGroup,
    pub version: ReleaseVersionOptions,
}

/// Workspace-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub release: ReleaseConfig,
    /// Path of the file this config was loaded from.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl WorkspaceConfig {
    /// Loads `polyver.toml` from the workspace root, or defaults if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(workspace_root: &Path) -> Result<Self> {
        let path = workspace_root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let mut config = Self::parse(&content)?;
        config.config_path = Some(path);
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error if `content` is not a valid configuration.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|error| Error::Toml {
            error,
            context: CONFIG_FILE.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = WorkspaceConfig::parse(
            r#"
[release]
group_name = "python-libs"
projects_relationship = "independent"
version_plans = true

[release.version]
specifier_source = "conventional-commits"
current_version_resolver = "git-tag"
fallback_current_version_resolver = "disk"
update_dependents = "auto"
version_prefix = "~"
preid = "beta"
"#,
        )
        .unwrap();

        let release = &config.release;
        assert_eq!(release.group.name, "python-libs");
        assert!(release.group.is_independent());
        assert!(release.group.version_plans);
        assert_eq!(release.group.version_plans_dir, DEFAULT_VERSION_PLANS_DIR);
        assert_eq!(release.version.specifier_source, SpecifierSource::ConventionalCommits);
        assert_eq!(release.version.update_dependents, UpdateDependents::Auto);
        assert_eq!(release.version.version_prefix, VersionPrefix::Tilde);
        assert!(release.version.log_unchanged_projects);
        assert!(release.version.validate(&release.group).is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = WorkspaceConfig::parse("").unwrap();
        assert_eq!(config.release.group.name, DEFAULT_GROUP_NAME);
        assert_eq!(config.release.version.specifier_source, SpecifierSource::Prompt);
        assert_eq!(config.release.version.update_dependents, UpdateDependents::Never);
        assert!(config.release.version.delete_version_plans);
    }

    #[test]
    fn test_invalid_specifier_source() {
        let err = "guess".parse::<SpecifierSource>().unwrap_err();
        assert!(err.to_string().contains("Invalid specifier_source \"guess\""));
        assert!(WorkspaceConfig::parse("[release.version]\nspecifier_source = \"guess\"\n").is_err());
    }

    #[test]
    fn test_invalid_version_prefix() {
        assert!(WorkspaceConfig::parse("[release.version]\nversion_prefix = \">=\"\n").is_err());
        assert_eq!("".parse::<VersionPrefix>().unwrap(), VersionPrefix::None);
    }

    #[test]
    fn test_version_prefix_auto_infers_operator() {
        assert_eq!(VersionPrefix::Auto.resolve(Some("^1.0.0")), "^");
        assert_eq!(VersionPrefix::Auto.resolve(Some("~1.0")), "~");
        assert_eq!(VersionPrefix::Auto.resolve(Some(">=1.0")), "");
        assert_eq!(VersionPrefix::Auto.resolve(None), "");
        assert_eq!(VersionPrefix::Caret.resolve(Some("~1.0")), "^");
    }

    #[test]
    fn test_conventional_commits_requires_git_tag() {
        let options = ReleaseVersionOptions {
            specifier_source: SpecifierSource::ConventionalCommits,
            ..Default::default()
        };
        let err = options.validate(&ReleaseGroup::default()).unwrap_err();
        assert!(err.to_string().contains("Must be \"git-tag\""));
    }

    #[test]
    fn test_version_plans_must_be_enabled() {
        let options = ReleaseVersionOptions {
            specifier_source: SpecifierSource::VersionPlans,
            ..Default::default()
        };
        assert!(options.validate(&ReleaseGroup::default()).is_err());

        let group = ReleaseGroup {
            version_plans: true,
            ..Default::default()
        };
        assert!(options.validate(&group).is_ok());
    }

    #[test]
    fn test_explicit_specifier_validated() {
        let options = ReleaseVersionOptions {
            specifier: Some("sideways".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            options.validate(&ReleaseGroup::default()),
            Err(Error::InvalidSpecifier(_))
        ));
    }

    #[test]
    fn test_default_tag_patterns() {
        let options = ReleaseVersionOptions::default();
        assert_eq!(options.tag_pattern(&ReleaseGroup::default()).as_str(), "v{version}");
        let independent = ReleaseGroup {
            projects_relationship: ProjectsRelationship::Independent,
            ..Default::default()
        };
        assert_eq!(
            options.tag_pattern(&independent).as_str(),
            "{projectName}@{version}"
        );
    }
}
