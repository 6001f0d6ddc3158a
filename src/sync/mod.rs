//! Contracts for the external collaborators (identity, document store, job store)
//! and the session that reconciles local state with them.
//!
//! Reconciliation is last-writer-wins: whatever the store pushes last replaces the
//! local copy, with no merge and no revision check.

use crate::diagram::ArchitectureDocument;
use crate::error::PersistenceError;
use crate::migration::{JobStatus, MigrationJob};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc::UnboundedReceiver;

mod memory;
mod session;

pub use memory::{AnonymousIdentity, MemoryDocumentStore, MemoryJobStore, StaticIdentity};
pub use session::SyncSession;

/// Collection a stored document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Diagrams,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Diagrams => f.write_str("diagrams"),
        }
    }
}

/// Address of one document in the realtime store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    pub app_id: String,
    pub user_id: String,
    pub kind: DocumentKind,
    pub document_id: String,
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "artifacts/{}/users/{}/{}/{}",
            self.app_id, self.user_id, self.kind, self.document_id
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOptions {
    /// Merge top-level fields into the existing value instead of replacing it.
    pub merge: bool,
}

/// Fields of a job that may change after insertion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_component_name: Option<String>,
}

impl JobPatch {
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn apply(&self, job: &mut MigrationJob) {
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(name) = &self.target_component_name {
            job.target_component_name = name.clone();
        }
    }
}

/// The value written for a diagram: the document plus a write timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDocument {
    #[serde(flatten)]
    pub document: ArchitectureDocument,
    pub last_updated: DateTime<Utc>,
}

/// Full document values pushed by the store. `None` means the document does not exist.
pub type DocumentFeed = UnboundedReceiver<Option<serde_json::Value>>;

/// Full job lists pushed by the store, newest request first.
pub type JobFeed = UnboundedReceiver<Vec<MigrationJob>>;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn get_or_create_user_id(&self) -> Result<String, PersistenceError>;
}

/// A realtime key/value document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Upserts `value` at `key`.
    async fn write(
        &self,
        key: &DocumentKey,
        value: serde_json::Value,
        options: WriteOptions,
    ) -> Result<(), PersistenceError>;

    /// Streams the value at `key`, starting with its current value. Dropping the
    /// feed unsubscribes.
    async fn subscribe(&self, key: &DocumentKey) -> Result<DocumentFeed, PersistenceError>;
}

/// The per-user `migrations` collection.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn subscribe(&self, user_id: &str) -> Result<JobFeed, PersistenceError>;

    async fn insert(&self, user_id: &str, job: &MigrationJob) -> Result<(), PersistenceError>;

    async fn update(
        &self,
        user_id: &str,
        job_id: &str,
        patch: &JobPatch,
    ) -> Result<(), PersistenceError>;
}
