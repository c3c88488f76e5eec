mod commands;
mod formatting;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use polyver_core::{SpecifierSource, UpdateDependents};
use tracing::Level;

#[derive(Parser)]
#[command(name = "polyver")]
#[command(about = "Dependency-aware release versioning for Python monorepos")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, default_value = ".")]
    workspace: PathBuf,

    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(short, long, global = true, action)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Determine and apply new versions for the selected projects.
    Version(VersionArgs),
    /// Print the processing order and local dependency edges.
    Graph {
        #[arg(long, action)]
        json: bool,
    },
}

#[derive(Args)]
pub struct VersionArgs {
    /// Projects to version. All projects when omitted.
    projects: Vec<String>,

    /// Exact version or semver keyword applied to every selected project.
    #[arg(long)]
    specifier: Option<String>,

    #[arg(long, value_parser = parse_specifier_source)]
    specifier_source: Option<SpecifierSource>,

    #[arg(long)]
    preid: Option<String>,

    #[arg(long, value_parser = parse_update_dependents)]
    update_dependents: Option<UpdateDependents>,

    #[arg(long, action)]
    dry_run: bool,

    #[arg(long, action)]
    first_release: bool,
}

fn parse_specifier_source(value: &str) -> std::result::Result<SpecifierSource, String> {
    value.parse().map_err(|e: polyver_core::Error| e.to_string())
}

fn parse_update_dependents(value: &str) -> std::result::Result<UpdateDependents, String> {
    value.parse().map_err(|e: polyver_core::Error| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        Commands::Version(args) => commands::cmd_version(cli.workspace, args).await?,
        Commands::Graph { json } => commands::cmd_graph(cli.workspace, json)?,
    }

    Ok(())
}
