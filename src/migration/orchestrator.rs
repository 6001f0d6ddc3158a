use super::{JobStatus, MigrationJob, advance};
use crate::config::{EditorConfig, PhasePolicy};
use crate::diagram::{ArchitectureDocument, Node, Phase};
use crate::error::KickoffRejection;
use chrono::Utc;
use itertools::Itertools;
use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

/// A single status change made during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobTransition {
    pub job_id: String,
    pub source_component_id: String,
    pub from: JobStatus,
    pub to: JobStatus,
}

/// Everything a tick changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub transitions: Vec<JobTransition>,
    /// Jobs still non-terminal after the tick.
    pub active_jobs: usize,
}

/// Owns the migration jobs and drives them through their lifecycle.
///
/// The random source is injected so cutover outcomes can be seeded in tests.
pub struct Orchestrator<R = StdRng> {
    jobs: Vec<MigrationJob>,
    rng: R,
    failure_rate: f64,
    placeholder_target_label: String,
}

impl Orchestrator<StdRng> {
    pub fn new(config: &EditorConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }
}

impl<R: Rng> Orchestrator<R> {
    pub fn with_rng(config: &EditorConfig, rng: R) -> Self {
        Self {
            jobs: Vec::new(),
            rng,
            failure_rate: config.failure_probability(),
            placeholder_target_label: config.placeholder_target_label.clone(),
        }
    }

    pub fn jobs(&self) -> &[MigrationJob] {
        &self.jobs
    }

    pub fn job(&self, job_id: &str) -> Option<&MigrationJob> {
        self.jobs.iter().find(|j| j.id == job_id)
    }

    /// Jobs ordered for display, newest request first.
    pub fn jobs_by_recency(&self) -> Vec<&MigrationJob> {
        self.jobs
            .iter()
            .sorted_by(|a, b| b.requested_at.cmp(&a.requested_at))
            .collect()
    }

    pub fn has_active_jobs(&self) -> bool {
        self.jobs.iter().any(|j| !j.is_terminal())
    }

    /// Replaces the job list with one received from the job store.
    pub fn replace_jobs(&mut self, jobs: Vec<MigrationJob>) {
        self.jobs = jobs;
    }

    /// Checks the kickoff precondition without creating anything.
    pub fn check_kickoff(
        &self,
        document: &ArchitectureDocument,
        policy: PhasePolicy,
    ) -> Result<(), KickoffRejection> {
        if policy == PhasePolicy::ConfirmThenKickoff && !document.source_confirmed {
            return Err(KickoffRejection::SourceNotConfirmed);
        }

        let source = document.validate_phase(Phase::Source);
        if !source.is_complete {
            return Err(KickoffRejection::SourceIncomplete {
                warnings: source.warnings,
                errors: source.errors,
            });
        }
        let target = document.validate_phase(Phase::Target);
        if !target.is_complete {
            return Err(KickoffRejection::TargetIncomplete {
                warnings: target.warnings,
                errors: target.errors,
            });
        }

        if !document.nodes_in(Phase::Source).any(|n| n.is_detailed) {
            return Err(KickoffRejection::NoDetailedSourceNodes);
        }
        Ok(())
    }

    /// Creates one `Initiating` job per detailed source node.
    pub fn kickoff(
        &mut self,
        document: &ArchitectureDocument,
        policy: PhasePolicy,
    ) -> Result<Vec<MigrationJob>, KickoffRejection> {
        self.check_kickoff(document, policy)?;

        let target_name = self.destination_label(document);
        let created: Vec<MigrationJob> = document
            .nodes_in(Phase::Source)
            .filter(|n| n.is_detailed)
            .map(|node| self.new_job(node, &target_name))
            .collect();

        log::info!(
            "Kickoff accepted: {} job(s) targeting '{}'",
            created.len(),
            target_name
        );
        self.jobs.extend(created.iter().cloned());
        Ok(created)
    }

    /// Starts a job for a single node, used when a node is dragged onto the Target canvas.
    pub fn start_job(&mut self, node: &Node, document: &ArchitectureDocument) -> MigrationJob {
        let target_name = self.destination_label(document);
        let job = self.new_job(node, &target_name);
        log::info!(
            "Migration started for '{}' ({})",
            node.name,
            job.external_job_id
        );
        self.jobs.push(job.clone());
        job
    }

    /// Advances every non-terminal job by exactly one state.
    pub fn tick(&mut self) -> TickReport {
        let mut transitions = Vec::new();
        for job in self.jobs.iter_mut().filter(|j| !j.is_terminal()) {
            let next = advance(job, self.failure_rate, &mut self.rng);
            log::debug!("Job '{}': {:?} -> {:?}", job.id, job.status, next.status);
            if next.is_terminal() {
                log::info!(
                    "Migration of '{}' finished: {}",
                    next.source_component_name,
                    next.status
                );
            }
            transitions.push(JobTransition {
                job_id: job.id.clone(),
                source_component_id: job.source_component_id.clone(),
                from: job.status,
                to: next.status,
            });
            *job = next;
        }

        TickReport {
            transitions,
            active_jobs: self.jobs.iter().filter(|j| !j.is_terminal()).count(),
        }
    }

    /// Name of a detailed compute node on the Target canvas, or the placeholder.
    fn destination_label(&self, document: &ArchitectureDocument) -> String {
        document
            .nodes_in(Phase::Target)
            .find(|n| n.is_detailed && n.component_type.descriptor().is_compute())
            .map(|n| n.name.clone())
            .unwrap_or_else(|| self.placeholder_target_label.clone())
    }

    fn new_job(&mut self, node: &Node, target_name: &str) -> MigrationJob {
        let token: String = (&mut self.rng)
            .sample_iter(Alphanumeric)
            .take(10)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();
        MigrationJob {
            id: Uuid::new_v4().to_string(),
            source_component_id: node.id.clone(),
            source_component_name: node.name.clone(),
            source_details: node.details.clone(),
            target_component_name: target_name.to_string(),
            status: JobStatus::Initiating,
            requested_at: Utc::now(),
            external_job_id: format!("mgn-{}", token),
        }
    }
}
