//! Release versioning across a monorepo.
//!
//! [`ReleaseVersion`] walks the selected projects in dependency order,
//! resolves a specifier for each, writes the new version and propagates the
//! bump to local dependents. The returned [`VersionResult`] carries the
//! aggregated [`VersionData`] and a [`VersionCallback`] for the side effects
//! that must only happen once every manifest has been updated.

pub mod callback;
pub mod context;
mod engine;

use std::sync::Arc;

use indexmap::IndexSet;
use tracing::debug;

use crate::clients::{GitClient, LockfileUpdater, Prompter, RegistryClient};
use crate::config::{ReleaseGroup, ReleaseVersionOptions, SpecifierSource, UpdateDependents};
use crate::error::{Error, Result};
use crate::graph::sort_projects_topologically;
use crate::local_deps::LocalDependencies;
use crate::project::ProjectGraph;
use crate::reporter::{TracingReporter, VersionReporter};
use crate::store::ManifestStore;
use crate::version_data::VersionData;
use crate::version_plan::VersionPlanStore;

use self::callback::VersionCallback;
use self::engine::Engine;

/// Outcome of a versioning run.
pub struct VersionResult {
    pub data: VersionData,
    pub callback: VersionCallback,
}

/// Engine for versioning a release group.
pub struct ReleaseVersion {
    pub(crate) graph: ProjectGraph,
    pub(crate) group: ReleaseGroup,
    pub(crate) options: ReleaseVersionOptions,
    git: Option<Arc<dyn GitClient>>,
    registry: Option<Arc<dyn RegistryClient>>,
    prompter: Option<Arc<dyn Prompter>>,
    lockfile: Option<Arc<dyn LockfileUpdater>>,
    version_plans: Option<Arc<dyn VersionPlanStore>>,
    pub(crate) reporter: Arc<dyn VersionReporter>,
}

impl ReleaseVersion {
    /// Creates an engine with no collaborators attached.
    ///
    /// Collaborators are only required by the strategies that use them: a
    /// git client for the `git-tag` resolver and conventional commits, a
    /// registry client for the `registry` resolver, a prompter for the
    /// `prompt` source and a plan store for version plans.
    pub fn new(graph: ProjectGraph, group: ReleaseGroup, options: ReleaseVersionOptions) -> Self {
        Self {
            graph,
            group,
            options,
            git: None,
            registry: None,
            prompter: None,
            lockfile: None,
            version_plans: None,
            reporter: Arc::new(TracingReporter),
        }
    }

    /// Git history used by the conventional-commits source and tag-based
    /// current-version resolution.
    pub fn with_git<G: GitClient + 'static>(mut self, git: G) -> Self {
        self.git = Some(Arc::new(git));
        self
    }

    /// Package index consulted when the current version comes from the registry.
    pub fn with_registry<R: RegistryClient + 'static>(mut self, registry: R) -> Self {
        self.registry = Some(Arc::new(registry));
        self
    }

    /// Interactive prompts for the prompt specifier source and dependent updates.
    pub fn with_prompter<P: Prompter + 'static>(mut self, prompter: P) -> Self {
        self.prompter = Some(Arc::new(prompter));
        self
    }

    /// Refreshes lock files after manifests change, unless disabled in options.
    pub fn with_lockfile_updater<L: LockfileUpdater + 'static>(mut self, lockfile: L) -> Self {
        self.lockfile = Some(Arc::new(lockfile));
        self
    }

    /// Version plan files read by the version-plans specifier source.
    pub fn with_version_plans<S: VersionPlanStore + 'static>(mut self, store: S) -> Self {
        self.version_plans = Some(Arc::new(store));
        self
    }

    /// Receives per-project progress. Defaults to logging through `tracing`.
    pub fn with_reporter<R: VersionReporter + 'static>(mut self, reporter: R) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }

    /// The workspace graph this run versions.
    pub fn graph(&self) -> &ProjectGraph {
        &self.graph
    }

    /// The release group whose projects are versioned.
    pub fn group(&self) -> &ReleaseGroup {
        &self.group
    }

    /// Effective options after config and overrides are merged.
    pub fn options(&self) -> &ReleaseVersionOptions {
        &self.options
    }

    pub(crate) fn git(&self) -> Result<&dyn GitClient> {
        self.git
            .as_deref()
            .ok_or_else(|| missing_collaborator("a git client"))
    }

    pub(crate) fn registry(&self) -> Result<&dyn RegistryClient> {
        self.registry
            .as_deref()
            .ok_or_else(|| missing_collaborator("a registry client"))
    }

    pub(crate) fn prompter(&self) -> Result<&dyn Prompter> {
        self.prompter
            .as_deref()
            .ok_or_else(|| missing_collaborator("an interactive prompt"))
    }

    /// Whether specifiers come from version plans in this run.
    pub(crate) fn uses_version_plans(&self) -> bool {
        self.options.specifier.is_none()
            && self.options.specifier_source == SpecifierSource::VersionPlans
    }

    /// Versions `projects` (every project in the graph when empty).
    ///
    /// Manifests are read from and written to `store`; nothing else is
    /// touched until the returned callback is run.
    ///
    /// # Errors
    ///
    /// Configuration errors are returned before any manifest is written.
    /// Resolution errors abort the run; manifests written for earlier
    /// projects stay written in `store`.
    pub async fn run(
        &self,
        store: &mut dyn ManifestStore,
        projects: &[String],
    ) -> Result<VersionResult> {
        self.options.validate(&self.group)?;

        let selected = self.select(projects)?;
        let package_roots = self
            .graph
            .package_roots(self.options.package_root.as_deref());
        let propagating = self.options.update_dependents == UpdateDependents::Auto;

        // Independent groups also resolve edges from unselected dependents.
        let dependencies = LocalDependencies::resolve(
            &self.graph,
            &*store,
            &selected,
            &package_roots,
            self.group.is_independent(),
        )?;

        let order = if propagating {
            sort_projects_topologically(&selected, &dependencies)
        } else {
            selected.clone()
        };
        debug!("Processing order: {}", order.join(", "));

        let plans = if self.uses_version_plans() {
            let store = self
                .version_plans
                .as_deref()
                .ok_or_else(|| missing_collaborator("a version plan store"))?;
            store.load()?
        } else {
            Vec::new()
        };

        let mut engine = Engine::new(
            self,
            store,
            package_roots,
            dependencies,
            selected.into_iter().collect(),
            plans,
        );
        for project in &order {
            engine.version_project(project).await?;
        }
        let (data, ctx) = engine.finish();

        let lock_roots = if self.options.skip_lock_file_update {
            Vec::new()
        } else {
            ctx.written_roots.into_values().collect()
        };
        let callback = VersionCallback::new(
            self.graph.workspace_root().to_path_buf(),
            lock_roots,
            ctx.plans_to_delete.into_values().collect(),
            self.lockfile.clone(),
            self.version_plans.clone(),
        );

        Ok(VersionResult { data, callback })
    }

    fn select(&self, projects: &[String]) -> Result<Vec<String>> {
        if projects.is_empty() {
            return Ok(self.graph.names().map(str::to_string).collect());
        }
        let mut selected = IndexSet::new();
        for name in projects {
            self.graph.require(name)?;
            selected.insert(name.clone());
        }
        Ok(selected.into_iter().collect())
    }
}

fn missing_collaborator(what: &str) -> Error {
    Error::Config(format!(
        "The configured release options require {}, but none was provided",
        what
    ))
}
