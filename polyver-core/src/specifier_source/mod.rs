//! Specifier resolution strategies.
//!
//! An explicit specifier always wins. Otherwise the configured
//! [`SpecifierSource`] decides, and a project left without a specifier may
//! still receive a patch bump when one of its local dependencies was bumped.

mod conventional_commits;
mod explicit;
mod prompt;
mod version_plans;

use std::path::PathBuf;

use semver::Version;
use tracing::debug;

use crate::config::{SpecifierSource, UpdateDependents};
use crate::error::Result;
use crate::release::context::RunContext;
use crate::release::ReleaseVersion;
use crate::reporter::ProjectLogger;
use crate::specifier::{SemverBump, Specifier};
use crate::tag_pattern::MatchingTag;
use crate::version_plan::VersionPlan;

/// Bump applied to a project whose only change is a dependency update.
pub const DEPENDENCY_BUMP: SemverBump = SemverBump::Patch;

/// What a strategy knows about the project being versioned.
pub(crate) struct SpecifierInput<'a> {
    pub project: &'a str,
    pub current_version: &'a Version,
    pub latest_matching_tag: Option<&'a MatchingTag>,
    /// Paths whose history counts for this project.
    pub commit_paths: Vec<PathBuf>,
    pub matched_projects: usize,
}

pub(crate) async fn resolve_specifier(
    release: &ReleaseVersion,
    input: &SpecifierInput<'_>,
    plans: &[VersionPlan],
    ctx: &mut RunContext,
    logger: &mut ProjectLogger,
) -> Result<Option<Specifier>> {
    let options = &release.options;
    if let Some(raw) = &options.specifier {
        return explicit::resolve(raw, logger).map(Some);
    }

    let source = options.specifier_source;
    let cached = if release.group.is_independent() {
        None
    } else {
        ctx.group_specifier.clone()
    };

    let resolved = match cached {
        Some(specifier) => {
            if let Some(specifier) = &specifier {
                logger.buffer(format!(
                    "Using the specifier \"{}\" resolved for the release group",
                    specifier
                ));
            }
            specifier
        }
        None => {
            let specifier = match source {
                SpecifierSource::ConventionalCommits => {
                    conventional_commits::resolve(
                        release.git()?,
                        input,
                        options.preid(),
                        options.falls_back_to_disk(),
                        logger,
                    )
                    .await?
                }
                SpecifierSource::Prompt => {
                    prompt::resolve(
                        release.prompter()?,
                        &release.group,
                        input,
                        options.preid(),
                        logger,
                    )
                    .await?
                }
                SpecifierSource::VersionPlans => {
                    version_plans::resolve(plans, input, options.preid(), logger)?
                }
            };
            if !release.group.is_independent() {
                ctx.group_specifier = Some(specifier.clone());
            }
            specifier
        }
    };

    if source == SpecifierSource::VersionPlans && options.delete_version_plans {
        for plan in plans.iter().filter(|plan| plan.touches(input.project)) {
            ctx.schedule_plan_deletion(plan);
        }
    }

    if resolved.is_some() {
        return Ok(resolved);
    }

    let propagating = options.update_dependents != UpdateDependents::Never;
    if source != SpecifierSource::Prompt
        && propagating
        && ctx.dependency_bumps.contains(input.project)
    {
        debug!(
            "{} has bumped dependencies: {:?}",
            input.project,
            ctx.dependency_bumps.get(input.project)
        );
        logger.buffer(format!(
            "Resolved the specifier as \"{}\" because one or more local dependencies were bumped and update_dependents is enabled",
            DEPENDENCY_BUMP
        ));
        return Ok(Some(DEPENDENCY_BUMP.into()));
    }

    match source {
        SpecifierSource::ConventionalCommits => logger.buffer(
            "No changes were detected using git history and the conventional commits standard",
        ),
        SpecifierSource::VersionPlans => {
            logger.buffer("No changes were detected within version plans")
        }
        SpecifierSource::Prompt => logger.buffer("No version specifier was selected"),
    }
    Ok(None)
}
