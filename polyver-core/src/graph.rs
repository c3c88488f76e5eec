//! Topological ordering of projects using petgraph.

use std::collections::{BTreeSet, HashMap};

use petgraph::algo::condensation;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::local_deps::LocalDependencies;

/// Orders `projects` so that dependencies come before their dependents.
///
/// Only edges between the given projects are considered. Projects that form a
/// cycle are collapsed into one strongly connected component, emitted once
/// each in their input order, after every non-cyclic predecessor of the
/// component. Unconstrained projects keep their relative input order.
pub fn sort_projects_topologically(
    projects: &[String],
    dependencies: &LocalDependencies,
) -> Vec<String> {
    let mut graph: DiGraph<usize, ()> = DiGraph::new();
    let mut node_map: HashMap<&str, NodeIndex> = HashMap::new();

    for (idx, name) in projects.iter().enumerate() {
        if node_map.contains_key(name.as_str()) {
            continue;
        }
        let node = graph.add_node(idx);
        node_map.insert(name.as_str(), node);
    }

    for edge in dependencies.edges() {
        if let (Some(&source), Some(&target)) = (
            node_map.get(edge.source.as_str()),
            node_map.get(edge.target.as_str()),
        ) {
            if source != target {
                graph.update_edge(source, target, ());
            }
        }
    }

    // Each component lists the input positions of its projects.
    let components = condensation(graph, true);

    let mut pending: Vec<usize> = components
        .node_indices()
        .map(|node| {
            components
                .neighbors_directed(node, Direction::Outgoing)
                .count()
        })
        .collect();

    let first_position = |node: NodeIndex| -> usize {
        components[node].iter().copied().min().unwrap_or(usize::MAX)
    };

    let mut ready: BTreeSet<(usize, NodeIndex)> = components
        .node_indices()
        .filter(|node| pending[node.index()] == 0)
        .map(|node| (first_position(node), node))
        .collect();

    let mut order = Vec::with_capacity(projects.len());
    while let Some(entry) = ready.pop_first() {
        let (_, node) = entry;

        let mut members = components[node].clone();
        members.sort_unstable();
        order.extend(members.into_iter().map(|idx| projects[idx].clone()));

        for dependent in components.neighbors_directed(node, Direction::Incoming) {
            pending[dependent.index()] -= 1;
            if pending[dependent.index()] == 0 {
                ready.insert((first_position(dependent), dependent));
            }
        }
    }

    order
}
