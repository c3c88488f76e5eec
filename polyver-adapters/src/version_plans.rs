//! Version plan files stored as markdown with YAML front matter.
//!
//! ```text
//! ---
//! lib-a: minor
//! app-b: patch
//! ---
//!
//! Adds the new parser API.
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use polyver_core::config::ReleaseGroup;
use polyver_core::error::{Error, Result};
use polyver_core::version_plan::{VersionPlan, VersionPlanStore};
use tracing::debug;

const FRONT_MATTER_DELIMITER: &str = "---";

/// Reads plans from `<workspace>/<version_plans_dir>`.
#[derive(Debug, Clone)]
pub struct FsVersionPlanStore {
    workspace_root: PathBuf,
    group: ReleaseGroup,
}

impl FsVersionPlanStore {
    pub fn new(workspace_root: impl Into<PathBuf>, group: ReleaseGroup) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            group,
        }
    }

    fn plans_dir(&self) -> PathBuf {
        self.workspace_root.join(&self.group.version_plans_dir)
    }

    fn parse_plan(&self, absolute_path: &Path, content: &str) -> Result<VersionPlan> {
        let plan_error = |message: String| Error::VersionPlan {
            path: absolute_path.to_path_buf(),
            message,
        };

        let yaml = extract_front_matter(content).map_err(|m| plan_error(m.to_string()))?;
        let bumps: IndexMap<String, String> =
            serde_yml::from_str(yaml).map_err(|e| plan_error(e.to_string()))?;
        if bumps.is_empty() {
            return Err(plan_error("front matter declares no bumps".to_string()));
        }

        let relative_path = absolute_path
            .strip_prefix(&self.workspace_root)
            .unwrap_or(absolute_path)
            .to_string_lossy()
            .replace('\\', "/");

        if self.group.is_independent() {
            return Ok(VersionPlan {
                absolute_path: absolute_path.to_path_buf(),
                relative_path,
                project_version_bumps: Some(bumps),
                group_version_bump: None,
            });
        }

        // The default group has no user-facing name, so any single key is accepted.
        let group_bump = match bumps.get(&self.group.name) {
            Some(bump) => bump.clone(),
            None if self.group.is_default() && bumps.len() == 1 => {
                bumps.values().next().cloned().unwrap_or_default()
            }
            None => {
                return Err(plan_error(format!(
                    "expected a bump for release group \"{}\"",
                    self.group.name
                )))
            }
        };
        Ok(VersionPlan {
            absolute_path: absolute_path.to_path_buf(),
            relative_path,
            project_version_bumps: None,
            group_version_bump: Some(group_bump),
        })
    }
}

impl VersionPlanStore for FsVersionPlanStore {
    fn load(&self) -> Result<Vec<VersionPlan>> {
        let dir = self.plans_dir();
        if !dir.is_dir() {
            debug!("No version plans directory at {}", dir.display());
            return Ok(Vec::new());
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
            .collect();
        paths.sort();

        let mut plans = Vec::with_capacity(paths.len());
        for path in paths {
            let content = fs::read_to_string(&path)?;
            plans.push(self.parse_plan(&path, &content)?);
        }
        debug!("Loaded {} version plans from {}", plans.len(), dir.display());
        Ok(plans)
    }

    fn delete(&self, absolute_path: &Path) -> Result<()> {
        fs::remove_file(absolute_path).map_err(|e| Error::VersionPlan {
            path: absolute_path.to_path_buf(),
            message: format!("Failed to delete: {}", e),
        })
    }
}

fn extract_front_matter(content: &str) -> std::result::Result<&str, &'static str> {
    let trimmed = content.trim_start();
    let Some(after_opening) = trimmed.strip_prefix(FRONT_MATTER_DELIMITER) else {
        return Err("missing opening front matter delimiter");
    };
    let after_opening = after_opening
        .strip_prefix("\r\n")
        .or_else(|| after_opening.strip_prefix('\n'))
        .unwrap_or(after_opening);

    let closing = if after_opening.starts_with(FRONT_MATTER_DELIMITER) {
        Some(0)
    } else {
        after_opening.find("\n---").map(|pos| pos + 1)
    };
    let Some(closing) = closing else {
        return Err("missing closing front matter delimiter");
    };

    Ok(after_opening[..closing].trim_end_matches('\r'))
}
