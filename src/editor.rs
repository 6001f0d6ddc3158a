//! The single-writer editor: one document, one job list, and every user action as a
//! named operation. Rejections are returned to the caller and also queued as
//! user-visible notices.

use crate::catalog::ComponentType;
use crate::config::{EditorConfig, PhasePolicy};
use crate::diagram::{
    ArchitectureDocument, CanvasRect, ConnectionSelector, Details, DropPoint, NodeMoved, Phase,
    PlacedNode, PlacementEngine, SelectionOutcome,
};
use crate::error::{DiagramError, KickoffRejection};
use crate::migration::{Advance, MigrationJob, Orchestrator, TickReport};
use crate::validation::{self, TopologyReport};
use async_trait::async_trait;
use rand::rngs::StdRng;
use std::collections::VecDeque;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Result of dropping an existing node.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveReport {
    pub moved: NodeMoved,
    /// Job started by the move under `PhasePolicy::AutoMigrate`.
    pub started_job: Option<MigrationJob>,
}

pub struct Editor {
    config: EditorConfig,
    document: ArchitectureDocument,
    orchestrator: Orchestrator<StdRng>,
    placement: PlacementEngine,
    selector: ConnectionSelector,
    notices: VecDeque<Notice>,
    editing: Option<String>,
    ready: bool,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        let orchestrator = Orchestrator::new(&config);
        Self::with_orchestrator(config, orchestrator)
    }

    pub fn with_orchestrator(config: EditorConfig, orchestrator: Orchestrator<StdRng>) -> Self {
        Self {
            placement: PlacementEngine::from_config(&config),
            config,
            document: ArchitectureDocument::new(),
            orchestrator,
            selector: ConnectionSelector::new(),
            notices: VecDeque::new(),
            editing: None,
            ready: false,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn document(&self) -> &ArchitectureDocument {
        &self.document
    }

    pub fn orchestrator(&self) -> &Orchestrator<StdRng> {
        &self.orchestrator
    }

    pub fn jobs(&self) -> &[MigrationJob] {
        self.orchestrator.jobs()
    }

    /// Enables drops once the identity bootstrap has resolved, whatever its outcome.
    pub fn mark_ready(&mut self) {
        self.ready = true;
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// The node waiting for detail entry, if any.
    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn cancel_editing(&mut self) {
        self.editing = None;
    }

    /// The node armed as the first endpoint of a connection, if any.
    pub fn armed(&self) -> Option<&str> {
        self.selector.armed()
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push_back(notice);
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    fn reject<T>(&mut self, err: DiagramError) -> Result<T, DiagramError> {
        if matches!(err, DiagramError::NodeNotFound(_)) {
            log::error!("Internal error: {}", err);
        } else {
            log::warn!("Rejected: {}", err);
            self.notices.push_back(Notice::warning(err.to_string()));
        }
        Err(err)
    }

    fn ensure_ready(&mut self) -> Result<(), DiagramError> {
        if self.ready {
            Ok(())
        } else {
            self.reject(DiagramError::NotReady)
        }
    }

    /// Places a new component from the toolbox and opens its checklist.
    pub fn drop_new(
        &mut self,
        component_type: ComponentType,
        phase: Phase,
        rect: &CanvasRect,
        point: DropPoint,
    ) -> Result<PlacedNode, DiagramError> {
        self.ensure_ready()?;
        match self
            .placement
            .place_node(&mut self.document, component_type, phase, rect, point)
        {
            Ok(placed) => {
                if placed.open_details {
                    self.editing = Some(placed.node.id.clone());
                }
                Ok(placed)
            }
            Err(e) => self.reject(e),
        }
    }

    /// Places a new component identified by its catalog key, as carried by a toolbox drag.
    pub fn drop_tool(
        &mut self,
        tool_key: &str,
        phase: Phase,
        rect: &CanvasRect,
        point: DropPoint,
    ) -> Result<PlacedNode, DiagramError> {
        match ComponentType::from_key(tool_key) {
            Some(component_type) => self.drop_new(component_type, phase, rect, point),
            None => self.reject(DiagramError::UnknownComponentType(tool_key.to_string())),
        }
    }

    /// Moves an existing node. Under `AutoMigrate`, crossing onto the Target canvas
    /// starts a migration job for it.
    pub fn drop_existing(
        &mut self,
        node_id: &str,
        phase: Phase,
        rect: &CanvasRect,
        point: DropPoint,
    ) -> Result<MoveReport, DiagramError> {
        self.ensure_ready()?;
        let moved = match self
            .placement
            .move_node(&mut self.document, node_id, phase, rect, point)
        {
            Ok(moved) => moved,
            Err(e) => return self.reject(e),
        };

        let crossed = moved.phase_change.is_some_and(|c| c.is_migration());
        let started_job = if crossed && self.placement.policy() == PhasePolicy::AutoMigrate {
            let node = self.document.require_node(node_id)?.clone();
            let job = self.orchestrator.start_job(&node, &self.document);
            self.document
                .set_migration_status(node_id, job.status.node_status())?;
            self.notices.push_back(Notice::info(format!(
                "Migrating {}: {}",
                node.name,
                job.status.label()
            )));
            Some(job)
        } else {
            None
        };

        if self.selector.armed() == Some(node_id) && moved.phase_change.is_some() {
            self.selector.disarm();
        }
        Ok(MoveReport { moved, started_job })
    }

    /// Handles a click on a node under the two-click connection protocol.
    pub fn click_node(&mut self, node_id: &str) -> Result<SelectionOutcome, DiagramError> {
        match self.selector.click(&mut self.document, node_id) {
            Ok(outcome) => Ok(outcome),
            Err(e) => self.reject(e),
        }
    }

    /// Saves a node's checklist and returns whether it is now complete.
    pub fn save_details(&mut self, node_id: &str, details: Details) -> Result<bool, DiagramError> {
        match self.document.save_details(node_id, details) {
            Ok(is_detailed) => {
                if self.editing.as_deref() == Some(node_id) {
                    self.editing = None;
                }
                Ok(is_detailed)
            }
            Err(e) => self.reject(e),
        }
    }

    pub fn validate(&self, phase: Phase) -> TopologyReport {
        self.document.validate_phase(phase)
    }

    /// Confirms the Source canvas, unlocking the Target canvas under `ConfirmThenKickoff`.
    pub fn confirm_source(&mut self) -> Result<TopologyReport, DiagramError> {
        match self.document.confirm_source() {
            Ok(report) => Ok(report),
            Err(e) => self.reject(e),
        }
    }

    /// Freezes the validated Source canvas into migration jobs.
    pub fn kickoff(&mut self) -> Result<Vec<MigrationJob>, KickoffRejection> {
        let jobs = match self
            .orchestrator
            .kickoff(&self.document, self.placement.policy())
        {
            Ok(jobs) => jobs,
            Err(e) => {
                log::warn!("Kickoff rejected: {}", e);
                self.notices.push_back(Notice::warning(e.to_string()));
                return Err(e);
            }
        };

        for job in &jobs {
            if let Err(e) = self
                .document
                .set_migration_status(&job.source_component_id, job.status.node_status())
            {
                log::error!("Internal error: {}", e);
            }
        }
        self.notices.push_back(Notice::info(format!(
            "Started {} migration job(s)",
            jobs.len()
        )));
        Ok(jobs)
    }

    /// Advances all jobs by one state and mirrors the result onto their nodes.
    pub fn tick(&mut self) -> TickReport {
        let report = self.orchestrator.tick();
        for transition in &report.transitions {
            // The source node may have been removed by a remote overwrite.
            if self
                .document
                .set_migration_status(&transition.source_component_id, transition.to.node_status())
                .is_err()
            {
                log::warn!(
                    "Job '{}' has no node '{}' to mirror onto",
                    transition.job_id,
                    transition.source_component_id
                );
            }
        }
        report
    }

    pub fn has_active_jobs(&self) -> bool {
        self.orchestrator.has_active_jobs()
    }

    /// Moves every node back to Source and clears migration state on the diagram.
    pub fn reset(&mut self) {
        self.document.reset_to_source(&mut rand::rng());
        self.selector.disarm();
        self.editing = None;
    }

    /// Replaces the local document with one received from the store.
    ///
    /// Checklist flags are recomputed rather than trusted.
    pub fn replace_document(&mut self, mut document: ArchitectureDocument) {
        for node in &mut document.nodes {
            node.is_detailed = validation::compute_is_detailed(node);
        }
        if let Some(armed) = self.selector.armed() {
            if document.node(armed).is_none() {
                self.selector.disarm();
            }
        }
        if let Some(editing) = self.editing.as_deref() {
            if document.node(editing).is_none() {
                self.editing = None;
            }
        }
        self.document = document;
    }

    pub fn replace_jobs(&mut self, jobs: Vec<MigrationJob>) {
        self.orchestrator.replace_jobs(jobs);
    }
}

#[async_trait]
impl Advance for tokio::sync::Mutex<Editor> {
    async fn advance(&self) -> bool {
        self.lock().await.tick().active_jobs > 0
    }
}
