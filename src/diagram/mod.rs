//! The diagram document: nodes on two canvases, the wires between them, and the
//! counters and flags that make up one user's architecture sketch.

use crate::catalog::ComponentType;
use crate::error::DiagramError;
use crate::validation::{self, TopologyReport};
use ahash::AHashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

mod connection;
pub mod placement;

pub use connection::{ConnectionSelector, SelectionOutcome};
pub use placement::{CanvasRect, DropPoint, NodeMoved, PhaseChange, PlacedNode, PlacementEngine};

/// Attribute values entered through a node's checklist, keyed by attribute name.
pub type Details = AHashMap<String, serde_json::Value>;

/// Which canvas a node or connection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Source,
    Target,
}

impl Phase {
    pub fn other(self) -> Phase {
        match self {
            Phase::Source => Phase::Target,
            Phase::Target => Phase::Source,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Source => f.write_str("Source"),
            Phase::Target => f.write_str("Target"),
        }
    }
}

/// Position of a node's top-left corner as a percentage of its canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Cosmetic mirror of the migration job attached to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NodeMigrationStatus {
    #[default]
    Idle,
    Migrating,
    Succeeded,
    Failed,
}

/// One placed component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub name: String,
    pub component_type: ComponentType,
    pub phase: Phase,
    pub position: Position,
    #[serde(default)]
    pub details: Details,
    #[serde(default)]
    pub is_detailed: bool,
    #[serde(default)]
    pub migration_status: NodeMigrationStatus,
}

/// An undirected wire between two nodes of the same phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub phase: Phase,
}

impl Connection {
    /// True if this connection joins `a` and `b`, in either direction.
    pub fn joins(&self, a: &str, b: &str) -> bool {
        (self.source_id == a && self.target_id == b) || (self.source_id == b && self.target_id == a)
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source_id == node_id || self.target_id == node_id
    }
}

/// The full diagram state. All mutation goes through the named operations below.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArchitectureDocument {
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
    pub next_node_id: u64,
    pub next_connection_id: u64,
    pub source_confirmed: bool,
}

impl ArchitectureDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    /// Looks a node up, reporting a missing id as an invariant violation.
    pub fn require_node(&self, node_id: &str) -> Result<&Node, DiagramError> {
        self.node(node_id)
            .ok_or_else(|| DiagramError::NodeNotFound(node_id.to_string()))
    }

    pub(crate) fn require_node_mut(&mut self, node_id: &str) -> Result<&mut Node, DiagramError> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == node_id)
            .ok_or_else(|| DiagramError::NodeNotFound(node_id.to_string()))
    }

    pub fn nodes_in(&self, phase: Phase) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.phase == phase)
    }

    pub fn connections_in(&self, phase: Phase) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.phase == phase)
    }

    /// Runs the topology check over one canvas.
    pub fn validate_phase(&self, phase: Phase) -> TopologyReport {
        validation::validate(self.nodes_in(phase), self.connections_in(phase))
    }

    /// Replaces a node's checklist values and recomputes `is_detailed`.
    ///
    /// Returns the new `is_detailed` value.
    pub fn save_details(&mut self, node_id: &str, details: Details) -> Result<bool, DiagramError> {
        let node = self.require_node_mut(node_id)?;
        node.details = details;
        node.is_detailed = validation::compute_is_detailed(node);
        log::debug!(
            "Saved details for '{}' (detailed: {})",
            node.id,
            node.is_detailed
        );
        Ok(node.is_detailed)
    }

    pub fn set_migration_status(
        &mut self,
        node_id: &str,
        status: NodeMigrationStatus,
    ) -> Result<(), DiagramError> {
        self.require_node_mut(node_id)?.migration_status = status;
        Ok(())
    }

    /// Marks the source canvas as confirmed if it passes validation.
    pub fn confirm_source(&mut self) -> Result<TopologyReport, DiagramError> {
        let report = self.validate_phase(Phase::Source);
        if !report.is_complete {
            return Err(DiagramError::SourceIncomplete {
                warnings: report.warnings,
                errors: report.errors,
            });
        }
        self.source_confirmed = true;
        log::info!("Source architecture confirmed");
        Ok(report)
    }

    /// Moves every node back to the source canvas at a random position and clears
    /// migration state. Connections are dropped since their phases no longer hold.
    pub fn reset_to_source<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for node in &mut self.nodes {
            node.phase = Phase::Source;
            node.migration_status = NodeMigrationStatus::Idle;
            node.position = Position {
                x: rng.random_range(20.0..70.0),
                y: rng.random_range(20.0..70.0),
            };
        }
        self.connections.clear();
        self.source_confirmed = false;
        log::info!("Diagram reset: {} node(s) moved to Source", self.nodes.len());
    }

    // A document received from the remote store may carry a stale counter.
    pub(crate) fn allocate_node_id(&mut self) -> String {
        loop {
            self.next_node_id += 1;
            let id = format!("node-{}", self.next_node_id);
            if self.node(&id).is_none() {
                return id;
            }
        }
    }

    pub(crate) fn allocate_connection_id(&mut self) -> String {
        loop {
            self.next_connection_id += 1;
            let id = format!("conn-{}", self.next_connection_id);
            if self.connections.iter().all(|c| c.id != id) {
                return id;
            }
        }
    }
}
