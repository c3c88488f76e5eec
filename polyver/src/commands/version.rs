//! `polyver version`

use std::path::PathBuf;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use polyver_adapters::{
    DialoguerPrompter, FsVersionPlanStore, Git2Client, PoetryLockfile, PypiRegistry,
    PyprojectStore,
};
use polyver_core::{CallbackOptions, ManifestStore, ReleaseVersion, ReleaseVersionOptions};

use super::load_workspace;
use super::reporter::CliVersionReporter;
use crate::formatting::{
    print_key_value, print_section_header, print_success, print_version_table, print_warning,
    SectionStyle,
};
use crate::VersionArgs;

pub async fn cmd_version(workspace: PathBuf, args: VersionArgs) -> Result<()> {
    let (config, graph) = load_workspace(&workspace)?;
    let group = config.release.group.clone();
    let options = apply_overrides(config.release.version.clone(), &args);

    let release = ReleaseVersion::new(graph, group.clone(), options)
        .with_git(Git2Client::new(&workspace))
        .with_registry(PypiRegistry::new()?)
        .with_prompter(DialoguerPrompter)
        .with_lockfile_updater(PoetryLockfile::new())
        .with_version_plans(FsVersionPlanStore::new(&workspace, group))
        .with_reporter(CliVersionReporter);

    let mut store = PyprojectStore::new(&workspace);
    let result = release.run(&mut store, &args.projects).await?;

    print_section_header("[Versions]", SectionStyle::Primary);
    if result.data.is_empty() {
        println!("  {}", "(no projects)".bright_black());
    } else {
        print_version_table(&result.data);
    }
    println!();

    if args.dry_run {
        for path in store.changed_paths() {
            print_key_value("would write", &path.display().to_string());
        }
        print_warning("Dry run: no files were written");
    } else {
        let written = store.commit().context("Failed to write manifests")?;
        print_success(&format!("Updated {} pyproject.toml files", written.len()));
    }

    let output = result
        .callback
        .run(CallbackOptions {
            dry_run: args.dry_run,
        })
        .await?;
    for file in &output.changed_files {
        print_key_value("lock file", file);
    }
    for file in &output.deleted_files {
        print_key_value("deleted plan", file);
    }

    Ok(())
}

fn apply_overrides(mut options: ReleaseVersionOptions, args: &VersionArgs) -> ReleaseVersionOptions {
    if let Some(specifier) = &args.specifier {
        options.specifier = Some(specifier.clone());
    }
    if let Some(source) = args.specifier_source {
        options.specifier_source = source;
    }
    if let Some(preid) = &args.preid {
        options.preid = Some(preid.clone());
    }
    if let Some(update_dependents) = args.update_dependents {
        options.update_dependents = update_dependents;
    }
    if args.first_release {
        options.first_release = true;
    }
    options
}
