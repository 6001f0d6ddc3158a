use super::{ArchitectureDocument, Connection};
use crate::error::{ConnectionRejection, DiagramError};

impl ArchitectureDocument {
    /// Connects two nodes of the same phase.
    ///
    /// Rules are checked in order: cross-phase, duplicate pair, self loop. The
    /// outcome does not depend on argument order.
    pub fn connect(&mut self, node_a: &str, node_b: &str) -> Result<Connection, DiagramError> {
        let phase_a = self.require_node(node_a)?.phase;
        let phase_b = self.require_node(node_b)?.phase;

        if phase_a != phase_b {
            return Err(ConnectionRejection::CrossPhaseRejected.into());
        }
        if self
            .connections_in(phase_a)
            .any(|c| c.joins(node_a, node_b))
        {
            return Err(ConnectionRejection::DuplicateRejected.into());
        }
        if node_a == node_b {
            return Err(ConnectionRejection::SelfLoopRejected.into());
        }

        let connection = Connection {
            id: self.allocate_connection_id(),
            source_id: node_a.to_string(),
            target_id: node_b.to_string(),
            phase: phase_a,
        };
        log::info!(
            "Connected '{}' <-> '{}' on the {} canvas",
            node_a,
            node_b,
            phase_a
        );
        self.connections.push(connection.clone());
        Ok(connection)
    }

    /// Drops every connection touching `node_id`, returning how many were removed.
    pub(crate) fn detach(&mut self, node_id: &str) -> usize {
        let before = self.connections.len();
        self.connections.retain(|c| !c.touches(node_id));
        before - self.connections.len()
    }
}

/// What a click on a node did under the two-click connection protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    /// The node is now the pending source.
    Armed(String),
    /// The pending source was clicked again and released.
    Disarmed,
    Connected(Connection),
}

/// Tracks the pending first endpoint of a connection.
#[derive(Debug, Clone, Default)]
pub struct ConnectionSelector {
    armed: Option<String>,
}

impl ConnectionSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn armed(&self) -> Option<&str> {
        self.armed.as_deref()
    }

    pub fn disarm(&mut self) {
        self.armed = None;
    }

    /// Handles a click on `node_id`.
    ///
    /// Any connection attempt, successful or not, leaves the selector disarmed.
    pub fn click(
        &mut self,
        document: &mut ArchitectureDocument,
        node_id: &str,
    ) -> Result<SelectionOutcome, DiagramError> {
        document.require_node(node_id)?;

        let Some(pending) = self.armed.take() else {
            self.armed = Some(node_id.to_string());
            return Ok(SelectionOutcome::Armed(node_id.to_string()));
        };

        if pending == node_id {
            return Ok(SelectionOutcome::Disarmed);
        }
        document
            .connect(&pending, node_id)
            .map(SelectionOutcome::Connected)
    }
}
