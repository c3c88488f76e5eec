//! Side effects deferred until every manifest has been updated in memory.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::clients::LockfileUpdater;
use crate::error::Result;
use crate::version_plan::{VersionPlan, VersionPlanStore};

pub const LOCK_FILE: &str = "poetry.lock";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallbackOptions {
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackOutput {
    /// Lock files that are (or would be) regenerated.
    pub changed_files: Vec<String>,
    /// Version plan files that are (or would be) removed.
    pub deleted_files: Vec<String>,
}

/// Lock file regeneration and version plan deletion for a finished run.
pub struct VersionCallback {
    workspace_root: PathBuf,
    /// Package roots needing a fresh lock file, in processing order.
    lock_roots: Vec<PathBuf>,
    plans_to_delete: Vec<VersionPlan>,
    lockfile: Option<Arc<dyn LockfileUpdater>>,
    plan_store: Option<Arc<dyn VersionPlanStore>>,
}

impl VersionCallback {
    pub(crate) fn new(
        workspace_root: PathBuf,
        lock_roots: Vec<PathBuf>,
        plans_to_delete: Vec<VersionPlan>,
        lockfile: Option<Arc<dyn LockfileUpdater>>,
        plan_store: Option<Arc<dyn VersionPlanStore>>,
    ) -> Self {
        Self {
            workspace_root,
            lock_roots,
            plans_to_delete,
            lockfile,
            plan_store,
        }
    }

    /// Runs the deferred work, or only reports it when `dry_run` is set.
    ///
    /// # Errors
    ///
    /// Returns the first lock regeneration or plan deletion failure.
    pub async fn run(&self, options: CallbackOptions) -> Result<CallbackOutput> {
        let changed_files: Vec<String> = self
            .lock_roots
            .iter()
            .map(|root| root.join(LOCK_FILE).to_string_lossy().into_owned())
            .collect();
        let deleted_files: Vec<String> = self
            .plans_to_delete
            .iter()
            .map(|plan| plan.relative_path.clone())
            .collect();

        if options.dry_run {
            return Ok(CallbackOutput {
                changed_files,
                deleted_files,
            });
        }

        match &self.lockfile {
            Some(lockfile) => {
                for root in &self.lock_roots {
                    let cwd = self.workspace_root.join(root);
                    info!("Updating {} in {}", LOCK_FILE, cwd.display());
                    lockfile.regenerate(&cwd).await?;
                }
            }
            None if !self.lock_roots.is_empty() => {
                debug!("No lock file updater configured, skipping lock file regeneration");
            }
            None => {}
        }

        if let Some(store) = &self.plan_store {
            for plan in &self.plans_to_delete {
                debug!("Deleting version plan {}", plan.relative_path);
                store.delete(&plan.absolute_path)?;
            }
        }

        Ok(CallbackOutput {
            changed_files,
            deleted_files,
        })
    }
}
