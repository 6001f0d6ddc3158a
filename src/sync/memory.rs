//! In-process implementations of the collaborator contracts, used for local runs and tests.

use super::{
    DocumentFeed, DocumentKey, DocumentStore, IdentityProvider, JobFeed, JobPatch, JobStore,
    WriteOptions,
};
use crate::error::PersistenceError;
use crate::migration::MigrationJob;
use ahash::AHashMap;
use async_trait::async_trait;
use itertools::Itertools;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock};
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use uuid::Uuid;

/// Always returns the same user id.
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub String);

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn get_or_create_user_id(&self) -> Result<String, PersistenceError> {
        Ok(self.0.clone())
    }
}

/// Creates a random user id on first use and keeps it for the provider's lifetime.
#[derive(Debug, Default)]
pub struct AnonymousIdentity {
    user_id: OnceLock<String>,
}

#[async_trait]
impl IdentityProvider for AnonymousIdentity {
    async fn get_or_create_user_id(&self) -> Result<String, PersistenceError> {
        Ok(self
            .user_id
            .get_or_init(|| Uuid::new_v4().to_string())
            .clone())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // State stays consistent even if a holder panicked mid-test.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
struct DocumentState {
    values: AHashMap<DocumentKey, Value>,
    subscribers: Vec<(DocumentKey, UnboundedSender<Option<Value>>)>,
}

/// A document store kept in memory. Every write is pushed to all subscribers of the key,
/// including the writer's own subscription.
#[derive(Default)]
pub struct MemoryDocumentStore {
    state: Mutex<DocumentState>,
    offline: AtomicBool,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline, writes and subscriptions fail.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn get(&self, key: &DocumentKey) -> Option<Value> {
        lock(&self.state).values.get(key).cloned()
    }

    /// Simulates a write made by another session.
    pub fn push_remote(&self, key: &DocumentKey, value: Value) {
        let mut state = lock(&self.state);
        state.values.insert(key.clone(), value.clone());
        Self::notify(&mut state, key, Some(value));
    }

    /// Simulates another session deleting the document.
    pub fn delete_remote(&self, key: &DocumentKey) {
        let mut state = lock(&self.state);
        state.values.remove(key);
        Self::notify(&mut state, key, None);
    }

    fn notify(state: &mut DocumentState, key: &DocumentKey, value: Option<Value>) {
        state
            .subscribers
            .retain(|(k, tx)| k != key || tx.send(value.clone()).is_ok());
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn write(
        &self,
        key: &DocumentKey,
        value: Value,
        options: WriteOptions,
    ) -> Result<(), PersistenceError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(PersistenceError::Write("store is offline".to_string()));
        }
        let mut state = lock(&self.state);
        let merged = match (options.merge, state.values.get(key), value) {
            (true, Some(Value::Object(existing)), Value::Object(incoming)) => {
                let mut fields = existing.clone();
                fields.extend(incoming);
                Value::Object(fields)
            }
            (_, _, value) => value,
        };
        state.values.insert(key.clone(), merged.clone());
        Self::notify(&mut state, key, Some(merged));
        Ok(())
    }

    async fn subscribe(&self, key: &DocumentKey) -> Result<DocumentFeed, PersistenceError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(PersistenceError::Subscribe("store is offline".to_string()));
        }
        let (tx, rx) = unbounded_channel();
        let mut state = lock(&self.state);
        // Subscribers always receive the current value first.
        let current = state.values.get(key).cloned();
        if tx.send(current).is_ok() {
            state.subscribers.push((key.clone(), tx));
        }
        Ok(rx)
    }
}

#[derive(Default)]
struct JobState {
    jobs: AHashMap<String, Vec<MigrationJob>>,
    subscribers: Vec<(String, UnboundedSender<Vec<MigrationJob>>)>,
}

impl JobState {
    fn snapshot(&self, user_id: &str) -> Vec<MigrationJob> {
        self.jobs
            .get(user_id)
            .map(|jobs| {
                jobs.iter()
                    .sorted_by(|a, b| b.requested_at.cmp(&a.requested_at))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn notify(&mut self, user_id: &str) {
        let snapshot = self.snapshot(user_id);
        self.subscribers
            .retain(|(user, tx)| user != user_id || tx.send(snapshot.clone()).is_ok());
    }
}

/// A `migrations` collection kept in memory.
#[derive(Default)]
pub struct MemoryJobStore {
    state: Mutex<JobState>,
    offline: AtomicBool,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Current jobs of `user_id`, newest request first.
    pub fn jobs(&self, user_id: &str) -> Vec<MigrationJob> {
        lock(&self.state).snapshot(user_id)
    }

    fn ensure_online(&self) -> Result<(), PersistenceError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(PersistenceError::Write("store is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn subscribe(&self, user_id: &str) -> Result<JobFeed, PersistenceError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(PersistenceError::Subscribe("store is offline".to_string()));
        }
        let (tx, rx) = unbounded_channel();
        let mut state = lock(&self.state);
        if tx.send(state.snapshot(user_id)).is_ok() {
            state.subscribers.push((user_id.to_string(), tx));
        }
        Ok(rx)
    }

    async fn insert(&self, user_id: &str, job: &MigrationJob) -> Result<(), PersistenceError> {
        self.ensure_online()?;
        let mut state = lock(&self.state);
        state
            .jobs
            .entry(user_id.to_string())
            .or_default()
            .push(job.clone());
        state.notify(user_id);
        Ok(())
    }

    async fn update(
        &self,
        user_id: &str,
        job_id: &str,
        patch: &JobPatch,
    ) -> Result<(), PersistenceError> {
        self.ensure_online()?;
        let mut state = lock(&self.state);
        let job = state
            .jobs
            .get_mut(user_id)
            .and_then(|jobs| jobs.iter_mut().find(|j| j.id == job_id))
            .ok_or_else(|| PersistenceError::Write(format!("job '{}' not found", job_id)))?;
        patch.apply(job);
        state.notify(user_id);
        Ok(())
    }
}
