//! Version plan records and their aggregation.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use semver::Version;

use crate::error::{Error, Result};
use crate::specifier::Specifier;

/// A pre-authored record declaring intended bumps.
///
/// Plans for independent groups carry a per-project bump map; plans for
/// fixed groups carry a single group-wide bump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionPlan {
    pub absolute_path: PathBuf,
    pub relative_path: String,
    pub project_version_bumps: Option<IndexMap<String, String>>,
    pub group_version_bump: Option<String>,
}

impl VersionPlan {
    /// The raw bump this plan requests for `project`.
    pub fn bump_for(&self, project: &str) -> Option<&str> {
        match &self.project_version_bumps {
            Some(bumps) => bumps.get(project).map(String::as_str),
            None => self.group_version_bump.as_deref(),
        }
    }

    /// Whether applying this plan changes `project`.
    pub fn touches(&self, project: &str) -> bool {
        match &self.project_version_bumps {
            Some(bumps) => bumps.contains_key(project),
            None => true,
        }
    }

    fn specifier_for(&self, project: &str) -> Result<Option<Specifier>> {
        self.bump_for(project)
            .map(|raw| {
                Specifier::parse(raw).map_err(|_| Error::VersionPlan {
                    path: self.absolute_path.clone(),
                    message: format!("invalid bump \"{}\" for \"{}\"", raw, project),
                })
            })
            .transpose()
    }
}

/// Source of pending version plans.
pub trait VersionPlanStore: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if a plan file cannot be read or parsed.
    fn load(&self) -> Result<Vec<VersionPlan>>;

    /// # Errors
    ///
    /// Returns an error if the plan file cannot be removed.
    fn delete(&self, absolute_path: &Path) -> Result<()>;
}

/// Picks the plan specifier that produces the greatest version for `project`.
///
/// Comparison uses semver ordering of the resulting versions; on a tie the
/// first plan wins.
///
/// # Errors
///
/// Returns an error if a plan holds an unparseable bump.
pub fn select_specifier(
    plans: &[VersionPlan],
    project: &str,
    current: &Version,
    preid: Option<&str>,
) -> Result<Option<Specifier>> {
    let mut best: Option<(Specifier, Version)> = None;

    for plan in plans {
        let Some(specifier) = plan.specifier_for(project)? else {
            continue;
        };
        let candidate = specifier.apply(current, preid)?;
        let replace = match &best {
            Some((_, best_version)) => candidate > *best_version,
            None => true,
        };
        if replace {
            best = Some((specifier, candidate));
        }
    }

    Ok(best.map(|(specifier, _)| specifier))
}
