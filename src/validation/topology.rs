use crate::diagram::{Connection, Node};
use ahash::AHashSet;
use serde::Serialize;

/// Outcome of validating the nodes and connections of one canvas.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyReport {
    /// One if any node has an incomplete checklist, otherwise zero.
    pub warnings: u32,
    /// One if any node is isolated in a set of more than one node, otherwise zero.
    pub errors: u32,
    /// Nodes counted as isolated. Empty when the set has a single node.
    pub isolated_node_ids: Vec<String>,
    pub is_complete: bool,
}

/// Validates one canvas. Callers pass only nodes and connections of the same phase.
pub fn validate<'a>(
    nodes: impl IntoIterator<Item = &'a Node>,
    connections: impl IntoIterator<Item = &'a Connection>,
) -> TopologyReport {
    let nodes: Vec<&Node> = nodes.into_iter().collect();
    let connected: AHashSet<&str> = connections
        .into_iter()
        .flat_map(|c| [c.source_id.as_str(), c.target_id.as_str()])
        .collect();

    let warnings = u32::from(nodes.iter().any(|n| !n.is_detailed));

    // A lone node has nothing to connect to.
    let isolated_node_ids: Vec<String> = if nodes.len() > 1 {
        nodes
            .iter()
            .filter(|n| !connected.contains(n.id.as_str()))
            .map(|n| n.id.clone())
            .collect()
    } else {
        Vec::new()
    };
    let errors = u32::from(!isolated_node_ids.is_empty());

    TopologyReport {
        warnings,
        errors,
        isolated_node_ids,
        is_complete: warnings == 0 && errors == 0,
    }
}
