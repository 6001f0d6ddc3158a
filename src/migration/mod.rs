//! Simulated migration jobs and their status state machine.
//!
//! ```text
//! Initiating -> Replicating -> CutoverPending -> Completed
//!                                            \-> Failed
//! ```
//!
//! `advance` is pure given its random source; scheduling lives in [`ticker`].

use crate::diagram::{Details, NodeMigrationStatus};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

mod orchestrator;
pub mod ticker;

pub use orchestrator::{JobTransition, Orchestrator, TickReport};
pub use ticker::{Advance, AdvancementLoop};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    Initiating,
    Replicating,
    CutoverPending,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// The status one tick later. `fails` is only consulted for `CutoverPending`.
    pub fn successor(self, fails: impl FnOnce() -> bool) -> JobStatus {
        match self {
            JobStatus::Initiating => JobStatus::Replicating,
            JobStatus::Replicating => JobStatus::CutoverPending,
            JobStatus::CutoverPending if fails() => JobStatus::Failed,
            JobStatus::CutoverPending => JobStatus::Completed,
            terminal => terminal,
        }
    }

    /// Label for the status panel.
    pub fn label(self) -> &'static str {
        match self {
            JobStatus::Initiating => "Starting",
            JobStatus::Replicating => "Replicating Data...",
            JobStatus::CutoverPending => "Ready for Cutover!",
            JobStatus::Completed => "Cutover Complete!",
            JobStatus::Failed => "Cutover Failed",
        }
    }

    /// The cosmetic status shown on the job's source node.
    pub fn node_status(self) -> NodeMigrationStatus {
        match self {
            JobStatus::Initiating | JobStatus::Replicating | JobStatus::CutoverPending => {
                NodeMigrationStatus::Migrating
            }
            JobStatus::Completed => NodeMigrationStatus::Succeeded,
            JobStatus::Failed => NodeMigrationStatus::Failed,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One simulated migration of a source component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationJob {
    pub id: String,
    pub source_component_id: String,
    pub source_component_name: String,
    /// The node's details at kickoff time. Later edits to the node do not reach here.
    pub source_details: Details,
    pub target_component_name: String,
    pub status: JobStatus,
    pub requested_at: DateTime<Utc>,
    /// Display-only token standing in for a provider job id.
    pub external_job_id: String,
}

impl MigrationJob {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Advances a job by one state. Terminal jobs are returned unchanged.
///
/// The cutover draw fails with probability `failure_rate`, which must lie in `[0, 1]`.
pub fn advance<R: Rng + ?Sized>(job: &MigrationJob, failure_rate: f64, rng: &mut R) -> MigrationJob {
    let status = job.status.successor(|| rng.random_bool(failure_rate));
    MigrationJob {
        status,
        ..job.clone()
    }
}
