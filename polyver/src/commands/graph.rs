//! `polyver graph`

use std::path::PathBuf;

use anyhow::Result;
use owo_colors::OwoColorize;
use polyver_adapters::PyprojectStore;
use polyver_core::{sort_projects_topologically, LocalDependencies};

use super::load_workspace;
use crate::formatting::{print_edge_table, print_section_header, print_warning, SectionStyle};

pub fn cmd_graph(workspace: PathBuf, json: bool) -> Result<()> {
    let (config, graph) = load_workspace(&workspace)?;
    let store = PyprojectStore::new(&workspace);

    let projects: Vec<String> = graph.names().map(str::to_string).collect();
    let package_roots = graph.package_roots(config.release.version.package_root.as_deref());
    let dependencies =
        LocalDependencies::resolve(&graph, &store, &projects, &package_roots, true)?;
    let order = sort_projects_topologically(&projects, &dependencies);

    if json {
        let graph_data = serde_json::json!({
            "order": order,
            "edges": dependencies.edges(),
        });
        println!("{}", serde_json::to_string_pretty(&graph_data)?);
        return Ok(());
    }

    print_section_header("[Processing Order]", SectionStyle::Primary);
    if order.is_empty() {
        print_warning("No projects found");
        return Ok(());
    }
    for (idx, name) in order.iter().enumerate() {
        println!(
            "  {} {}",
            format!("{}.", idx + 1).bright_black(),
            name.bold().white()
        );
    }
    println!();

    if !dependencies.is_empty() {
        print_section_header("[Local Dependencies]", SectionStyle::Secondary);
        print_edge_table(dependencies.edges());
    }

    Ok(())
}
