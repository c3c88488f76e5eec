//! Core library for dependency-aware release versioning in Python monorepos.

pub mod clients;
pub mod config;
pub mod conventional;
pub mod current_version;
pub mod error;
pub mod graph;
pub mod local_deps;
pub mod manifest;
pub mod project;
pub mod release;
pub mod reporter;
pub mod specifier;
pub mod specifier_source;
pub mod store;
pub mod tag_pattern;
pub mod version_data;
pub mod version_plan;

pub use clients::{GitClient, LockfileUpdater, Prompter, RegistryClient};
pub use config::{
    CurrentVersionResolver, ProjectsRelationship, ReleaseGroup, ReleaseVersionOptions,
    SpecifierSource, UpdateDependents, VersionPrefix, WorkspaceConfig,
};
pub use conventional::RawCommit;
pub use error::{Error, Result};
pub use graph::sort_projects_topologically;
pub use local_deps::{LocalDependencies, LocalPackageDependency};
pub use manifest::{DependencyCollection, DependencySpec, Manifest};
pub use project::{PackageRoots, ProjectGraph, ProjectNode, MANIFEST_FILE};
pub use release::callback::{CallbackOptions, CallbackOutput, VersionCallback};
pub use release::{ReleaseVersion, VersionResult};
pub use reporter::{LogLevel, LogLine, ProjectColor, ProjectLogger, TracingReporter, VersionReporter};
pub use specifier::{SemverBump, Specifier};
pub use store::{ManifestStore, MemoryManifestStore};
pub use tag_pattern::{MatchingTag, TagMatcher, TagPattern};
pub use version_data::{VersionData, VersionDataEntry};
pub use version_plan::{VersionPlan, VersionPlanStore};
