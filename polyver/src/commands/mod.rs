//! Command implementations for the CLI.

mod graph;
mod reporter;
mod version;

use std::path::Path;

use anyhow::{Context, Result};
use polyver_adapters::Scanner;
use polyver_core::{ProjectGraph, WorkspaceConfig};

pub use graph::cmd_graph;
pub use version::cmd_version;

fn load_workspace(workspace: &Path) -> Result<(WorkspaceConfig, ProjectGraph)> {
    let config = WorkspaceConfig::load(workspace)
        .with_context(|| format!("Failed to load configuration from {}", workspace.display()))?;
    let graph = Scanner::new(workspace)
        .scan()
        .with_context(|| format!("Failed to scan workspace {}", workspace.display()))?;
    Ok((config, graph))
}
