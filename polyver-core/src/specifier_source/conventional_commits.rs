use tracing::debug;

use crate::clients::GitClient;
use crate::conventional::classify_commits;
use crate::error::{Error, Result};
use crate::reporter::ProjectLogger;
use crate::specifier::{SemverBump, Specifier};

use super::SpecifierInput;

/// Classifies the commits since the previous release into a bump.
///
/// The reference point is the latest matching tag, or the first commit of
/// the repository when the current version came from disk. A prerelease
/// current version always continues as `prerelease`.
pub(crate) async fn resolve(
    git: &dyn GitClient,
    input: &SpecifierInput<'_>,
    preid: Option<&str>,
    falls_back_to_disk: bool,
    logger: &mut ProjectLogger,
) -> Result<Option<Specifier>> {
    let reference = match input.latest_matching_tag {
        Some(tag) => tag.tag.clone(),
        None if falls_back_to_disk => git.first_commit().await?,
        None => {
            return Err(Error::Git(format!(
                "No previous release tag found for \"{}\" to compare commits against",
                input.project
            )))
        }
    };

    let commits = git.commits_since(&reference, &input.commit_paths).await?;
    debug!(
        "{} commits since {} for {}",
        commits.len(),
        reference,
        input.project
    );

    let Some(bump) = classify_commits(&commits) else {
        return Ok(None);
    };

    if !input.current_version.pre.is_empty() {
        logger.buffer(format!(
            "Resolved the specifier as \"{}\" since the current version is a prerelease",
            SemverBump::Prerelease
        ));
        return Ok(Some(SemverBump::Prerelease.into()));
    }

    let bump = if preid.is_some() { bump.to_pre() } else { bump };
    logger.buffer(format!(
        "Resolved the specifier as \"{}\" using git history and the conventional commits standard",
        bump
    ));
    Ok(Some(bump.into()))
}
