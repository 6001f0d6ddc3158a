//! An editor bound to the remote stores: identity bootstrap, saves, remote
//! overwrites, and the advancement loop, all cancelled together on teardown.

use crate::config::EditorConfig;
use crate::editor::{Editor, Notice};
use crate::error::{KickoffRejection, PersistenceError};
use crate::migration::{Advance, AdvancementLoop, MigrationJob};
use crate::sync::{DocumentStore, IdentityProvider, JobStore, SyncSession};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Ticks the editor's jobs and writes each status change to the job store.
struct LiveJobs {
    editor: Arc<Mutex<Editor>>,
    session: Arc<SyncSession>,
}

#[async_trait]
impl Advance for LiveJobs {
    async fn advance(&self) -> bool {
        let report = self.editor.lock().await.tick();
        for transition in &report.transitions {
            match self
                .session
                .update_job_status(&transition.job_id, transition.to)
                .await
            {
                Ok(()) | Err(PersistenceError::LocalOnly) => {}
                Err(e) => {
                    log::error!("Failed to store status of job '{}': {}", transition.job_id, e);
                    self.editor
                        .lock()
                        .await
                        .push_notice(Notice::error(e.to_string()));
                }
            }
        }
        report.active_jobs > 0
    }
}

/// Queues exactly one notice for a failed save.
async fn report_save_failure(editor: &Mutex<Editor>, err: &PersistenceError) {
    let notice = match err {
        PersistenceError::LocalOnly => {
            log::warn!("Save skipped: {}", err);
            Notice::warning(err.to_string())
        }
        _ => {
            log::error!("Save failed: {}", err);
            Notice::error(err.to_string())
        }
    };
    editor.lock().await.push_notice(notice);
}

pub struct Workspace {
    editor: Arc<Mutex<Editor>>,
    session: Arc<SyncSession>,
    ticker: Option<AdvancementLoop>,
    tick_interval: Duration,
    pending_saves: Vec<JoinHandle<()>>,
}

impl Workspace {
    /// Bootstraps identity and subscriptions. A failed bootstrap leaves the workspace
    /// local-only; the editor is usable either way. Each failed subscription queues
    /// one error notice.
    pub async fn open(
        config: EditorConfig,
        identity: &dyn IdentityProvider,
        documents: Arc<dyn DocumentStore>,
        jobs: Arc<dyn JobStore>,
    ) -> Self {
        let tick_interval = config.tick_interval();
        let mut editor = Editor::new(config.clone());
        let session = match SyncSession::connect(identity, documents, jobs, &config).await {
            Ok((session, failures)) => {
                for failure in failures {
                    editor.push_notice(Notice::error(failure.to_string()));
                }
                session
            }
            Err(e) => {
                log::error!("Running in local-only mode: {}", e);
                editor.push_notice(Notice::error(format!(
                    "{}. Changes will only be kept on this device.",
                    e
                )));
                SyncSession::local_only()
            }
        };
        editor.mark_ready();

        let workspace = Self {
            editor: Arc::new(Mutex::new(editor)),
            session: Arc::new(session),
            ticker: None,
            tick_interval,
            pending_saves: Vec::new(),
        };
        workspace.pull_remote().await;
        workspace
    }

    pub fn editor(&self) -> Arc<Mutex<Editor>> {
        Arc::clone(&self.editor)
    }

    pub fn session(&self) -> &SyncSession {
        &self.session
    }

    pub fn is_local_only(&self) -> bool {
        self.session.is_local_only()
    }

    /// Saves the current document and waits for the outcome.
    pub async fn save(&self) -> Result<(), PersistenceError> {
        let document = self.editor.lock().await.document().clone();
        let result = self.session.save_document(&document).await;
        if let Err(e) = &result {
            report_save_failure(&self.editor, e).await;
        }
        result
    }

    /// Saves the current document in the background, replacing any save still pending.
    ///
    /// In local-only mode nothing is replaced, so every scheduled save reports its
    /// own "not saved" notice.
    pub fn schedule_save(&mut self) {
        if !self.session.is_local_only() {
            for previous in self.pending_saves.drain(..) {
                previous.abort();
            }
        }
        let editor = Arc::clone(&self.editor);
        let session = Arc::clone(&self.session);
        self.pending_saves.push(tokio::spawn(async move {
            let document = editor.lock().await.document().clone();
            if let Err(e) = session.save_document(&document).await {
                report_save_failure(&editor, &e).await;
            }
        }));
    }

    /// Waits for every pending background save.
    pub async fn flush(&mut self) {
        for handle in self.pending_saves.drain(..) {
            if let Err(e) = handle.await {
                log::debug!("Pending save did not finish: {}", e);
            }
        }
    }

    /// Applies whatever the store pushed since the last call. The remote value
    /// replaces local state outright.
    ///
    /// Returns `true` if anything was applied.
    pub async fn pull_remote(&self) -> bool {
        let document = self.session.latest_document();
        let jobs = self.session.latest_jobs();
        if document.is_none() && jobs.is_none() {
            return false;
        }

        let mut editor = self.editor.lock().await;
        if let Some(document) = document {
            log::debug!("Applying remote diagram ({} nodes)", document.nodes.len());
            editor.replace_document(document);
        }
        if let Some(jobs) = jobs {
            log::debug!("Applying remote job list ({} jobs)", jobs.len());
            editor.replace_jobs(jobs);
        }
        true
    }

    /// Kicks off the migration, stores the new jobs and starts the advancement loop.
    pub async fn kickoff(&mut self) -> Result<Vec<MigrationJob>, KickoffRejection> {
        let jobs = self.editor.lock().await.kickoff()?;
        self.track(&jobs).await;
        Ok(jobs)
    }

    /// Stores jobs created outside `kickoff` (e.g. by a move under auto-migrate) and
    /// makes sure they get advanced.
    pub async fn track(&mut self, jobs: &[MigrationJob]) {
        for job in jobs {
            match self.session.record_job(job).await {
                Ok(()) => {}
                Err(PersistenceError::LocalOnly) => {
                    log::debug!("Job '{}' kept locally only", job.id)
                }
                Err(e) => {
                    log::error!("Failed to store job '{}': {}", job.id, e);
                    self.editor
                        .lock()
                        .await
                        .push_notice(Notice::error(e.to_string()));
                }
            }
        }
        if !jobs.is_empty() {
            self.ensure_ticker();
        }
    }

    /// Starts the advancement loop unless it is already running.
    pub fn ensure_ticker(&mut self) {
        if self.ticker.as_ref().is_some_and(AdvancementLoop::is_running) {
            return;
        }
        let target = Arc::new(LiveJobs {
            editor: Arc::clone(&self.editor),
            session: Arc::clone(&self.session),
        });
        self.ticker = Some(AdvancementLoop::spawn(target, self.tick_interval));
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().is_some_and(AdvancementLoop::is_running)
    }

    /// Cancels the advancement loop and any pending save, and unsubscribes.
    pub fn teardown(&mut self) {
        if let Some(mut ticker) = self.ticker.take() {
            ticker.cancel();
        }
        for save in self.pending_saves.drain(..) {
            save.abort();
        }
        self.session.close();
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.teardown();
    }
}
