//! Per-project versioning and dependent propagation.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use semver::Version;
use tracing::{debug, warn};

use crate::config::UpdateDependents;
use crate::current_version::resolve_current_version;
use crate::error::{Error, Result};
use crate::local_deps::{LocalDependencies, LocalPackageDependency};
use crate::manifest::Manifest;
use crate::project::PackageRoots;
use crate::reporter::ProjectLogger;
use crate::specifier::{increment, parse_version};
use crate::specifier_source::{resolve_specifier, SpecifierInput, DEPENDENCY_BUMP};
use crate::store::ManifestStore;
use crate::version_data::{VersionData, VersionDataEntry};
use crate::version_plan::VersionPlan;

use super::context::RunContext;
use super::ReleaseVersion;

pub(super) struct Engine<'a> {
    release: &'a ReleaseVersion,
    store: &'a mut dyn ManifestStore,
    package_roots: PackageRoots,
    dependencies: LocalDependencies,
    selected: IndexSet<String>,
    plans: Vec<VersionPlan>,
    ctx: RunContext,
    data: VersionData,
}

impl<'a> Engine<'a> {
    pub(super) fn new(
        release: &'a ReleaseVersion,
        store: &'a mut dyn ManifestStore,
        package_roots: PackageRoots,
        dependencies: LocalDependencies,
        selected: IndexSet<String>,
        plans: Vec<VersionPlan>,
    ) -> Self {
        Self {
            release,
            store,
            package_roots,
            dependencies,
            selected,
            plans,
            ctx: RunContext::new(),
            data: VersionData::new(),
        }
    }

    pub(super) fn finish(self) -> (VersionData, RunContext) {
        (self.data, self.ctx)
    }

    /// Versions one project, flushing its output even when it fails.
    pub(super) async fn version_project(&mut self, project: &str) -> Result<()> {
        let mut logger = ProjectLogger::new(project);
        let result = self.process(project, &mut logger).await;
        if result.is_err() {
            logger.flush(self.release.reporter.as_ref());
        }
        result
    }

    async fn process(&mut self, project: &str, logger: &mut ProjectLogger) -> Result<()> {
        let release = self.release;
        let options = &release.options;

        let manifest_path = self.package_roots.manifest_path(project)?;
        if !self.store.exists(&manifest_path) {
            return Err(Error::MissingManifest {
                project: project.to_string(),
                path: manifest_path,
            });
        }
        let mut manifest = self.store.read(&manifest_path)?;

        let current = resolve_current_version(
            release,
            project,
            &manifest,
            &manifest_path,
            &mut self.ctx.current_version,
            logger,
        )
        .await?;

        let input = SpecifierInput {
            project,
            current_version: &current.version,
            latest_matching_tag: current.latest_matching_tag.as_ref(),
            commit_paths: self.commit_paths(project)?,
            matched_projects: self.selected.len(),
        };
        let specifier =
            resolve_specifier(release, &input, &self.plans, &mut self.ctx, logger).await?;

        let (in_batch, out_of_batch): (Vec<_>, Vec<_>) = self
            .dependencies
            .dependents_of(project)
            .into_iter()
            .cloned()
            .partition(|dependent| self.is_in_batch(&dependent.source));

        for dependent in in_batch.iter().chain(out_of_batch.iter()) {
            if self.dependencies.depends_on(project, &dependent.source) {
                self.ctx.circular.insert(project, &dependent.source);
            }
        }

        let Some(specifier) = specifier else {
            logger.buffer(format!(
                "Skipping versioning \"{}\" as no changes were detected",
                project
            ));
            if options.log_unchanged_projects {
                logger.flush(release.reporter.as_ref());
            }
            self.data.record(
                project,
                VersionDataEntry {
                    current_version: Some(current.version.to_string()),
                    new_version: None,
                    dependent_projects: in_batch,
                },
            );
            return Ok(());
        };

        let new_version = specifier.apply(&current.version, options.preid())?;
        if new_version <= current.version {
            return Err(Error::InvalidVersion {
                version: new_version.to_string(),
                message: format!(
                    "must be greater than the current version {} of \"{}\"",
                    current.version, project
                ),
            });
        }
        let new_version = new_version.to_string();

        if !manifest.set_version(&new_version) {
            return Err(Error::Manifest {
                path: manifest_path,
                message: "no [project] or [tool.poetry] table to write the version to"
                    .to_string(),
            });
        }
        self.store.write(&manifest_path, &manifest)?;
        self.ctx.bumped.insert(project.to_string());
        self.mark_written(project)?;
        logger.buffer(format!(
            "New version {} written to {}",
            new_version,
            manifest_path.display()
        ));

        let package_name = manifest.name().unwrap_or(project).to_string();
        let propagating = options.update_dependents == UpdateDependents::Auto;

        let transitive = if propagating {
            self.transitive_dependents(project, &out_of_batch)
        } else {
            Vec::new()
        };

        let mut updated = in_batch.clone();
        if propagating {
            updated.extend(out_of_batch.iter().cloned());
        }
        self.data.record(
            project,
            VersionDataEntry {
                current_version: Some(current.version.to_string()),
                new_version: Some(new_version.clone()),
                dependent_projects: updated.clone(),
            },
        );

        let circular_transitive = transitive
            .iter()
            .filter(|edge| self.ctx.circular.contains(&edge.source, &edge.target))
            .count();
        let total = updated.len() + transitive.len() - circular_transitive;
        if total > 0 {
            logger.buffer(format!(
                "Applying new version {} to {} {} on {}",
                new_version,
                total,
                if total == 1 {
                    "package which depends"
                } else {
                    "packages which depend"
                },
                project
            ));
        }

        for dependent in &in_batch {
            self.ctx.dependency_bumps.record(&dependent.source, project);
            self.update_dependent(dependent, &package_name, &new_version, false)?;
        }

        if propagating {
            for dependent in &out_of_batch {
                // Selected projects only land here under version plans; they
                // bump themselves when their own turn comes.
                let selected = self.selected.contains(&dependent.source);
                if selected {
                    self.ctx.dependency_bumps.record(&dependent.source, project);
                }
                self.update_dependent(dependent, &package_name, &new_version, !selected)?;
            }

            for edge in &transitive {
                let Some((dependency_name, dependency_version)) =
                    self.package_identity(&edge.target)?
                else {
                    continue;
                };
                if self.selected.contains(&edge.source) {
                    self.ctx.dependency_bumps.record(&edge.source, &edge.target);
                }
                let force = !self.ctx.circular.contains(&edge.source, &edge.target)
                    && !self.selected.contains(&edge.source);
                self.update_dependent(edge, &dependency_name, &dependency_version, force)?;
            }
        } else if !out_of_batch.is_empty() {
            let names: Vec<&str> = out_of_batch.iter().map(|d| d.source.as_str()).collect();
            logger.warn(format!(
                "The following projects depend on \"{}\" but are not part of this release and will not be updated: {}. Set update_dependents to \"auto\" to update them automatically.",
                project,
                names.join(", ")
            ));
        }

        logger.flush(release.reporter.as_ref());
        Ok(())
    }

    /// A dependent is in the batch when it is selected and, under version
    /// plans, also named by at least one plan.
    fn is_in_batch(&self, source: &str) -> bool {
        if !self.selected.contains(source) {
            return false;
        }
        if self.release.uses_version_plans() {
            return self.plans.iter().any(|plan| plan.touches(source));
        }
        true
    }

    /// Every edge reachable from `direct` through dependents not in the batch.
    fn transitive_dependents(
        &self,
        project: &str,
        direct: &[LocalPackageDependency],
    ) -> Vec<LocalPackageDependency> {
        let mut result = Vec::new();
        let mut seen_edges: HashSet<(String, String)> = HashSet::new();
        let mut seen_projects: HashSet<String> = HashSet::new();
        seen_projects.insert(project.to_string());

        let mut queue: VecDeque<String> = VecDeque::new();
        for dependent in direct {
            if !self.selected.contains(&dependent.source)
                && seen_projects.insert(dependent.source.clone())
            {
                queue.push_back(dependent.source.clone());
            }
        }

        while let Some(current) = queue.pop_front() {
            for edge in self.dependencies.dependents_of(&current) {
                if !seen_edges.insert((edge.source.clone(), edge.target.clone())) {
                    continue;
                }
                result.push(edge.clone());
                if !self.selected.contains(&edge.source)
                    && seen_projects.insert(edge.source.clone())
                {
                    queue.push_back(edge.source.clone());
                }
            }
        }

        result
    }

    /// Rewrites `edge.source`'s requirement on `dependency_name` and
    /// optionally forces a patch bump of `edge.source`.
    ///
    /// A project is force-bumped at most once per run.
    fn update_dependent(
        &mut self,
        edge: &LocalPackageDependency,
        dependency_name: &str,
        dependency_version: &str,
        force_bump: bool,
    ) -> Result<()> {
        let path = self.package_roots.manifest_path(&edge.source)?;
        if !self.store.exists(&path) {
            debug!(
                "Skipping dependent {}: no manifest at {}",
                edge.source,
                path.display()
            );
            return Ok(());
        }
        let mut manifest = self.store.read(&path)?;

        let current_requirement = manifest
            .dependency(
                edge.dependency_collection,
                edge.group_key.as_deref(),
                dependency_name,
            )
            .and_then(|spec| spec.version().map(str::to_string));
        let prefix = self
            .release
            .options
            .version_prefix
            .resolve(current_requirement.as_deref());
        let requirement = format!("{}{}", prefix, dependency_version);
        if !manifest.set_dependency_version(
            edge.dependency_collection,
            edge.group_key.as_deref(),
            dependency_name,
            &requirement,
        ) {
            debug!(
                "{} no longer declares {}, leaving its manifest untouched",
                edge.source, dependency_name
            );
            return Ok(());
        }

        if force_bump && !self.ctx.bumped.contains(&edge.source) {
            let current = manifest_version(&edge.source, &manifest, &path)?;
            let next = increment(&current, DEPENDENCY_BUMP, None)?.to_string();
            if !manifest.set_version(&next) {
                return Err(Error::Manifest {
                    path,
                    message: "no [project] or [tool.poetry] table to write the version to"
                        .to_string(),
                });
            }
            self.ctx.bumped.insert(edge.source.clone());
            let dependents = self
                .dependencies
                .dependents_of(&edge.source)
                .into_iter()
                .cloned()
                .collect();
            self.data.record(
                &edge.source,
                VersionDataEntry {
                    current_version: Some(current.to_string()),
                    new_version: Some(next),
                    dependent_projects: dependents,
                },
            );
        }

        self.store.write(&path, &manifest)?;
        self.mark_written(&edge.source)
    }

    /// Package name and on-disk version of `project`, if its manifest exists.
    fn package_identity(&self, project: &str) -> Result<Option<(String, String)>> {
        let path = self.package_roots.manifest_path(project)?;
        if !self.store.exists(&path) {
            warn!(
                "No manifest for {} at {}; its dependents keep their current requirement",
                project,
                path.display()
            );
            return Ok(None);
        }
        let manifest = self.store.read(&path)?;
        let version = manifest_version(project, &manifest, &path)?;
        let name = manifest.name().unwrap_or(project).to_string();
        Ok(Some((name, version.to_string())))
    }

    fn commit_paths(&self, project: &str) -> Result<Vec<PathBuf>> {
        if self.release.group.is_independent() {
            return Ok(vec![self.package_roots.require(project)?.to_path_buf()]);
        }
        self.selected
            .iter()
            .map(|name| Ok(self.package_roots.require(name)?.to_path_buf()))
            .collect()
    }

    fn mark_written(&mut self, project: &str) -> Result<()> {
        let root = self.package_roots.require(project)?.to_path_buf();
        self.ctx.mark_written(project, root);
        Ok(())
    }
}

fn manifest_version(project: &str, manifest: &Manifest, path: &Path) -> Result<Version> {
    let raw = manifest.version().ok_or_else(|| Error::MissingVersion {
        project: project.to_string(),
        path: path.to_path_buf(),
    })?;
    parse_version(raw)
}
