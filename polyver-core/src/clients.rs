//! Async interfaces to the outside world.
//!
//! The engine decides what should happen; these collaborators perform the
//! actual git, registry, terminal and process I/O.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::conventional::RawCommit;
use crate::error::Result;
use crate::tag_pattern::{MatchingTag, TagPattern};

#[async_trait]
pub trait GitClient: Send + Sync {
    /// The newest tag matching `pattern` for the given project, if any.
    async fn latest_tag_for_pattern(
        &self,
        pattern: &TagPattern,
        project_name: &str,
        group_name: &str,
    ) -> Result<Option<MatchingTag>>;

    /// The root commit of the repository.
    async fn first_commit(&self) -> Result<String>;

    /// Commits reachable from HEAD but not from `from`.
    ///
    /// A non-empty `paths` keeps only commits touching one of them.
    async fn commits_since(&self, from: &str, paths: &[PathBuf]) -> Result<Vec<RawCommit>>;
}

#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// The latest version of `package` published to `registry`.
    async fn current_published_version(&self, package: &str, registry: &str) -> Result<String>;
}

#[async_trait]
pub trait Prompter: Send + Sync {
    /// Asks the user to pick one of `items`. `None` means the prompt was dismissed.
    async fn select(&self, message: &str, items: &[String]) -> Result<Option<usize>>;

    async fn input(&self, message: &str) -> Result<String>;
}

#[async_trait]
pub trait LockfileUpdater: Send + Sync {
    /// Regenerates the lock file of the project rooted at `cwd`.
    async fn regenerate(&self, cwd: &Path) -> Result<()>;
}
