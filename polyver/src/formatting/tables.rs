//! Table formatting utilities using comfy-table.

use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use polyver_core::{LocalPackageDependency, VersionData};

fn styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(*h).add_attribute(Attribute::Bold))
                .collect::<Vec<_>>(),
        )
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Prints current and new versions per project, in processing order.
pub fn print_version_table(data: &VersionData) {
    let mut table = styled_table(&["Project", "Current", "New", "Dependents"]);

    for (project, entry) in data.iter() {
        let current = entry.current_version.as_deref().unwrap_or("-");
        let new_version = match &entry.new_version {
            Some(version) => Cell::new(version).fg(Color::Green),
            None => Cell::new("unchanged").fg(Color::DarkGrey),
        };
        let dependents: Vec<&str> = entry
            .dependent_projects
            .iter()
            .map(|d| d.source.as_str())
            .collect();
        table.add_row(vec![
            Cell::new(project).fg(Color::White),
            Cell::new(current),
            new_version,
            Cell::new(dependents.join(", ")).fg(Color::DarkGrey),
        ]);
    }

    println!("{}", table);
}

/// Prints local dependency edges as `dependent -> dependency`.
pub fn print_edge_table(edges: &[LocalPackageDependency]) {
    let mut table = styled_table(&["Dependent", "Dependency", "Collection"]);

    for edge in edges {
        let collection = match &edge.group_key {
            Some(group) => format!("{} ({})", edge.dependency_collection.as_str(), group),
            None => edge.dependency_collection.as_str().to_string(),
        };
        table.add_row(vec![
            Cell::new(&edge.source).fg(Color::White),
            Cell::new(&edge.target).fg(Color::Cyan),
            Cell::new(collection).fg(Color::DarkGrey),
        ]);
    }

    println!("{}", table);
}
