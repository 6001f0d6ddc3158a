use super::{
    DocumentFeed, DocumentKey, DocumentKind, DocumentStore, IdentityProvider, JobFeed, JobPatch,
    JobStore, StoredDocument, WriteOptions,
};
use crate::config::EditorConfig;
use crate::diagram::ArchitectureDocument;
use crate::error::PersistenceError;
use crate::migration::{JobStatus, MigrationJob};
use chrono::Utc;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::error::TryRecvError;

struct Remote {
    key: DocumentKey,
    documents: Arc<dyn DocumentStore>,
    jobs: Arc<dyn JobStore>,
}

#[derive(Default)]
struct Feeds {
    documents: Option<DocumentFeed>,
    jobs: Option<JobFeed>,
}

/// Connection between one editor and the remote stores.
///
/// A session without a remote is local-only: every persistence call returns
/// `PersistenceError::LocalOnly` and nothing is ever received.
pub struct SyncSession {
    remote: Option<Remote>,
    feeds: Mutex<Feeds>,
}

impl SyncSession {
    /// Resolves the user id and subscribes to the user's diagram and jobs.
    ///
    /// A failed subscription leaves that feed empty and is returned next to the
    /// session; saving still works.
    pub async fn connect(
        identity: &dyn IdentityProvider,
        documents: Arc<dyn DocumentStore>,
        jobs: Arc<dyn JobStore>,
        config: &EditorConfig,
    ) -> Result<(Self, Vec<PersistenceError>), PersistenceError> {
        let user_id = identity.get_or_create_user_id().await?;
        let key = DocumentKey {
            app_id: config.app_id.clone(),
            user_id,
            kind: DocumentKind::Diagrams,
            document_id: config.document_id.clone(),
        };

        let mut failures = Vec::new();
        let document_feed = match documents.subscribe(&key).await {
            Ok(feed) => Some(feed),
            Err(e) => {
                log::error!("Diagram subscription failed: {}", e);
                failures.push(e);
                None
            }
        };
        let job_feed = match jobs.subscribe(&key.user_id).await {
            Ok(feed) => Some(feed),
            Err(e) => {
                log::error!("Job subscription failed: {}", e);
                failures.push(e);
                None
            }
        };

        log::info!("Sync session connected at '{}'", key);
        let session = Self {
            remote: Some(Remote {
                key,
                documents,
                jobs,
            }),
            feeds: Mutex::new(Feeds {
                documents: document_feed,
                jobs: job_feed,
            }),
        };
        Ok((session, failures))
    }

    pub fn local_only() -> Self {
        Self {
            remote: None,
            feeds: Mutex::new(Feeds::default()),
        }
    }

    pub fn is_local_only(&self) -> bool {
        self.remote.is_none()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.remote.as_ref().map(|r| r.key.user_id.as_str())
    }

    pub fn key(&self) -> Option<&DocumentKey> {
        self.remote.as_ref().map(|r| &r.key)
    }

    fn remote(&self) -> Result<&Remote, PersistenceError> {
        self.remote.as_ref().ok_or(PersistenceError::LocalOnly)
    }

    fn feeds(&self) -> std::sync::MutexGuard<'_, Feeds> {
        self.feeds.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Writes the whole document, replacing what the store holds.
    pub async fn save_document(
        &self,
        document: &ArchitectureDocument,
    ) -> Result<(), PersistenceError> {
        let remote = self.remote()?;
        let value = serde_json::to_value(StoredDocument {
            document: document.clone(),
            last_updated: Utc::now(),
        })?;
        remote
            .documents
            .write(&remote.key, value, WriteOptions { merge: false })
            .await
    }

    pub async fn record_job(&self, job: &MigrationJob) -> Result<(), PersistenceError> {
        let remote = self.remote()?;
        remote.jobs.insert(&remote.key.user_id, job).await
    }

    pub async fn update_job_status(
        &self,
        job_id: &str,
        status: JobStatus,
    ) -> Result<(), PersistenceError> {
        let remote = self.remote()?;
        remote
            .jobs
            .update(&remote.key.user_id, job_id, &JobPatch::status(status))
            .await
    }

    /// Drains the diagram feed and returns the last value received, if any.
    ///
    /// A missing remote document reads as an empty diagram. Payloads that do not
    /// decode are skipped.
    pub fn latest_document(&self) -> Option<ArchitectureDocument> {
        let mut feeds = self.feeds();
        let feed = feeds.documents.as_mut()?;

        let mut latest = None;
        let closed = loop {
            match feed.try_recv() {
                Ok(Some(value)) => match serde_json::from_value::<ArchitectureDocument>(value) {
                    Ok(document) => latest = Some(document),
                    Err(e) => log::warn!("Ignoring undecodable diagram payload: {}", e),
                },
                Ok(None) => latest = Some(ArchitectureDocument::default()),
                Err(TryRecvError::Empty) => break false,
                Err(TryRecvError::Disconnected) => break true,
            }
        };
        if closed {
            log::warn!("Diagram feed closed by the store");
            feeds.documents = None;
        }
        latest
    }

    /// Drains the job feed and returns the last list received, if any.
    pub fn latest_jobs(&self) -> Option<Vec<MigrationJob>> {
        let mut feeds = self.feeds();
        let feed = feeds.jobs.as_mut()?;

        let mut latest = None;
        let closed = loop {
            match feed.try_recv() {
                Ok(jobs) => latest = Some(jobs),
                Err(TryRecvError::Empty) => break false,
                Err(TryRecvError::Disconnected) => break true,
            }
        };
        if closed {
            log::warn!("Job feed closed by the store");
            feeds.jobs = None;
        }
        latest
    }

    /// Unsubscribes from both feeds.
    pub fn close(&self) {
        let mut feeds = self.feeds();
        feeds.documents = None;
        feeds.jobs = None;
    }
}
