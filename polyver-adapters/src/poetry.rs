//! Lock file regeneration through the Poetry CLI.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use polyver_core::clients::LockfileUpdater;
use polyver_core::error::{Error, Result};
use tokio::process::Command;
use tracing::{debug, info};

/// Runs `poetry lock --no-update` in a project directory.
#[derive(Debug, Clone)]
pub struct PoetryLockfile {
    program: String,
}

impl PoetryLockfile {
    pub fn new() -> Self {
        Self {
            program: "poetry".to_string(),
        }
    }

    /// Uses another executable in place of `poetry`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for PoetryLockfile {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LockfileUpdater for PoetryLockfile {
    async fn regenerate(&self, cwd: &Path) -> Result<()> {
        info!("Updating lock file in {}", cwd.display());

        let output = Command::new(&self.program)
            .args(["lock", "--no-update"])
            .current_dir(cwd)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| Error::Lockfile {
                cwd: cwd.to_path_buf(),
                message: format!("Failed to spawn {}: {}", self.program, e),
            })?;

        if output.status.success() {
            debug!("{}", String::from_utf8_lossy(&output.stdout).trim());
            Ok(())
        } else {
            Err(Error::Lockfile {
                cwd: cwd.to_path_buf(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}
