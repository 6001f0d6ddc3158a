use super::{ArchitectureDocument, Node, NodeMigrationStatus, Phase, Position};
use crate::catalog::ComponentType;
use crate::config::{EditorConfig, PhasePolicy};
use crate::error::DiagramError;
use crate::validation;
use serde::{Deserialize, Serialize};

/// Bounding rectangle of a canvas at drop time, in client pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Pointer position of a drop, in client pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropPoint {
    pub x: f64,
    pub y: f64,
}

/// A freshly placed node. `open_details` asks the caller to start detail entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedNode {
    pub node: Node,
    pub open_details: bool,
}

/// A node crossing from one canvas to the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    pub from: Phase,
    pub to: Phase,
}

impl PhaseChange {
    pub fn is_migration(&self) -> bool {
        self.from == Phase::Source && self.to == Phase::Target
    }
}

/// Result of moving an existing node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeMoved {
    pub node_id: String,
    pub position: Position,
    pub phase_change: Option<PhaseChange>,
    /// Connections dropped because the node left their canvas.
    pub detached_connections: usize,
}

/// Maps drop events onto the document.
#[derive(Debug, Clone)]
pub struct PlacementEngine {
    policy: PhasePolicy,
    clamp_to_canvas: bool,
    node_footprint_px: f64,
}

impl PlacementEngine {
    pub fn new(policy: PhasePolicy, clamp_to_canvas: bool, node_footprint_px: f64) -> Self {
        Self {
            policy,
            clamp_to_canvas,
            node_footprint_px: node_footprint_px.max(0.0),
        }
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(
            config.phase_policy,
            config.clamp_to_canvas,
            config.node_footprint_px,
        )
    }

    pub fn policy(&self) -> PhasePolicy {
        self.policy
    }

    /// Converts a drop point into a percentage position on `rect`.
    pub fn position_from_drop(&self, rect: &CanvasRect, point: DropPoint) -> Position {
        Position {
            x: self.axis_percent(point.x - rect.left, rect.width),
            y: self.axis_percent(point.y - rect.top, rect.height),
        }
    }

    fn axis_percent(&self, offset: f64, extent: f64) -> f64 {
        if !(extent.is_finite() && extent > 0.0) || !offset.is_finite() {
            return 0.0;
        }
        let percent = (offset / extent * 100.0).max(0.0);
        if self.clamp_to_canvas {
            let limit = (100.0 - self.node_footprint_px / extent * 100.0).max(0.0);
            percent.min(limit)
        } else {
            percent
        }
    }

    fn check_phase_open(
        &self,
        document: &ArchitectureDocument,
        phase: Phase,
    ) -> Result<(), DiagramError> {
        if self.policy == PhasePolicy::ConfirmThenKickoff
            && phase == Phase::Target
            && !document.source_confirmed
        {
            return Err(DiagramError::TargetPhaseLocked(phase));
        }
        Ok(())
    }

    /// Creates a new node of `component_type` where it was dropped.
    pub fn place_node(
        &self,
        document: &mut ArchitectureDocument,
        component_type: ComponentType,
        phase: Phase,
        rect: &CanvasRect,
        point: DropPoint,
    ) -> Result<PlacedNode, DiagramError> {
        self.check_phase_open(document, phase)?;

        let id = document.allocate_node_id();
        let name = format!(
            "{}-{}",
            component_type.descriptor().short_name,
            document.nodes.len() + 1
        );
        let mut node = Node {
            id,
            name,
            component_type,
            phase,
            position: self.position_from_drop(rect, point),
            details: Default::default(),
            is_detailed: false,
            migration_status: NodeMigrationStatus::Idle,
        };
        node.is_detailed = validation::compute_is_detailed(&node);

        log::info!(
            "Placed {} '{}' on the {} canvas",
            component_type,
            node.id,
            phase
        );
        document.nodes.push(node.clone());
        Ok(PlacedNode {
            node,
            open_details: true,
        })
    }

    /// Moves an existing node to where it was dropped, possibly onto the other canvas.
    pub fn move_node(
        &self,
        document: &mut ArchitectureDocument,
        node_id: &str,
        phase: Phase,
        rect: &CanvasRect,
        point: DropPoint,
    ) -> Result<NodeMoved, DiagramError> {
        let current = document.require_node(node_id)?.phase;
        if current != phase {
            self.check_phase_open(document, phase)?;
        }
        let position = self.position_from_drop(rect, point);
        relocate(document, node_id, phase, position)
    }
}

/// Updates a node's position and phase. Leaving a canvas drops the node's wires there.
pub fn relocate(
    document: &mut ArchitectureDocument,
    node_id: &str,
    phase: Phase,
    position: Position,
) -> Result<NodeMoved, DiagramError> {
    let node = document.require_node_mut(node_id)?;
    node.position = position;
    let from = node.phase;
    node.phase = phase;

    let phase_change = (from != phase).then_some(PhaseChange { from, to: phase });
    let detached_connections = if phase_change.is_some() {
        let dropped = document.detach(node_id);
        log::info!(
            "Node '{}' moved from {} to {} ({} connection(s) dropped)",
            node_id,
            from,
            phase,
            dropped
        );
        dropped
    } else {
        0
    };

    Ok(NodeMoved {
        node_id: node_id.to_string(),
        position,
        phase_change,
        detached_connections,
    })
}
