//! Resolution of a project's current version.

use std::path::Path;

use semver::Version;

use crate::config::CurrentVersionResolver;
use crate::error::{Error, Result};
use crate::manifest::Manifest;
use crate::release::ReleaseVersion;
use crate::reporter::ProjectLogger;
use crate::specifier::parse_version;
use crate::tag_pattern::MatchingTag;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentVersion {
    pub version: Version,
    /// The tag the version was read from, when resolved from git.
    pub latest_matching_tag: Option<MatchingTag>,
}

/// Resolved version shared by all projects of a fixed group.
#[derive(Debug, Clone, Default)]
pub struct CurrentVersionCache {
    resolved: Option<CurrentVersion>,
}

impl CurrentVersionCache {
    pub fn get(&self) -> Option<&CurrentVersion> {
        self.resolved.as_ref()
    }
}

/// Resolves the current version of `project` with the configured resolver.
///
/// Fixed groups resolve once and reuse the result; independent groups
/// resolve every project separately.
///
/// # Errors
///
/// Returns an error if no version can be found and no disk fallback applies.
pub(crate) async fn resolve_current_version(
    release: &ReleaseVersion,
    project: &str,
    manifest: &Manifest,
    manifest_path: &Path,
    cache: &mut CurrentVersionCache,
    logger: &mut ProjectLogger,
) -> Result<CurrentVersion> {
    if !release.group.is_independent() {
        if let Some(cached) = cache.get() {
            logger.buffer(format!(
                "Using the current version {} already resolved for the release group",
                cached.version
            ));
            return Ok(cached.clone());
        }
    }

    let options = &release.options;
    let resolved = match options.current_version_resolver {
        CurrentVersionResolver::Disk => {
            let version = disk_version(project, manifest, manifest_path)?;
            logger.buffer(format!(
                "Resolved the current version as {} from {}",
                version,
                manifest_path.display()
            ));
            CurrentVersion {
                version,
                latest_matching_tag: None,
            }
        }
        CurrentVersionResolver::GitTag => {
            let git = release.git()?;
            let pattern = options.tag_pattern(&release.group);
            match git
                .latest_tag_for_pattern(&pattern, project, &release.group.name)
                .await?
            {
                Some(tag) => {
                    logger.buffer(format!(
                        "Resolved the current version as {} from git tag \"{}\"",
                        tag.extracted_version, tag.tag
                    ));
                    CurrentVersion {
                        version: tag.extracted_version.clone(),
                        latest_matching_tag: Some(tag),
                    }
                }
                None if options.falls_back_to_disk() => {
                    let version = disk_version(project, manifest, manifest_path)?;
                    logger.buffer(format!(
                        "Unable to resolve the current version from git tags using pattern \"{}\". Falling back to the version on disk of {}",
                        pattern.as_str(),
                        version
                    ));
                    CurrentVersion {
                        version,
                        latest_matching_tag: None,
                    }
                }
                None => {
                    return Err(Error::NoMatchingTag {
                        project: project.to_string(),
                        pattern: pattern.as_str().to_string(),
                    })
                }
            }
        }
        CurrentVersionResolver::Registry => {
            let registry = release.registry()?;
            let package = manifest.name().unwrap_or(project);
            let url = options.registry_url();
            match registry.current_published_version(package, url).await {
                Ok(published) => {
                    let version = parse_version(&published)?;
                    logger.buffer(format!(
                        "Resolved the current version as {} from registry {}",
                        version, url
                    ));
                    CurrentVersion {
                        version,
                        latest_matching_tag: None,
                    }
                }
                Err(e) if options.falls_back_to_disk() => {
                    let version = disk_version(project, manifest, manifest_path)?;
                    logger.buffer(format!(
                        "Unable to resolve the current version from registry {} ({}). Falling back to the version on disk of {}",
                        url, e, version
                    ));
                    CurrentVersion {
                        version,
                        latest_matching_tag: None,
                    }
                }
                Err(e) => return Err(e),
            }
        }
    };

    if !release.group.is_independent() {
        cache.resolved = Some(resolved.clone());
    }
    Ok(resolved)
}

fn disk_version(project: &str, manifest: &Manifest, manifest_path: &Path) -> Result<Version> {
    let raw = manifest.version().ok_or_else(|| Error::MissingVersion {
        project: project.to_string(),
        path: manifest_path.to_path_buf(),
    })?;
    parse_version(raw)
}
