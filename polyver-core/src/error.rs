//! Error types and result aliases.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error in {context}: {error}")]
    Toml {
        error: toml::de::Error,
        context: String,
    },

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Project not found: {name}. Available projects: {available}")]
    ProjectNotFound { name: String, available: String },

    #[error("Duplicate project name: {0}")]
    DuplicateProject(String),

    #[error("The project \"{0}\" does not have a packageRoot available")]
    MissingPackageRoot(String),

    #[error("Unable to find a pyproject.toml for project \"{project}\" at {path}")]
    MissingManifest { project: String, path: PathBuf },

    #[error("No version found for project \"{project}\" in {path}")]
    MissingVersion { project: String, path: PathBuf },

    #[error("Invalid version {version}: {message}")]
    InvalidVersion { version: String, message: String },

    #[error(
        "Invalid semver version specifier \"{0}\" provided. Please provide either a valid semver version or a valid semver version keyword"
    )]
    InvalidSpecifier(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(
        "No git tags matching pattern \"{pattern}\" for project \"{project}\" were found. You will need to create an initial matching tag, set fallback_current_version_resolver to \"disk\", or pass --first-release"
    )]
    NoMatchingTag { project: String, pattern: String },

    #[error("Unable to resolve the current version of \"{package}\" from the registry: {message}")]
    Registry { package: String, message: String },

    #[error("Git error: {0}")]
    Git(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Invalid version plan {path}: {message}")]
    VersionPlan { path: PathBuf, message: String },

    #[error("Manifest error in {path}: {message}")]
    Manifest { path: PathBuf, message: String },

    #[error("Lock file update failed in {cwd}: {message}")]
    Lockfile { cwd: PathBuf, message: String },
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::Toml {
            error,
            context: "pyproject.toml".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
