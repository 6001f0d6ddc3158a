//! Tests for persistence: identity bootstrap, saves, last-writer-wins overwrites and
//! the job store, driven through the in-memory collaborators.
mod common;
use async_trait::async_trait;
use common::*;
use diagrammer::prelude::*;
use diagrammer::sync::{AnonymousIdentity, MemoryDocumentStore, MemoryJobStore, StaticIdentity};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

struct FailingIdentity;

#[async_trait]
impl IdentityProvider for FailingIdentity {
    async fn get_or_create_user_id(&self) -> std::result::Result<String, PersistenceError> {
        Err(PersistenceError::Identity("credential service unreachable".to_string()))
    }
}

struct Stores {
    documents: Arc<MemoryDocumentStore>,
    jobs: Arc<MemoryJobStore>,
}

impl Stores {
    fn new() -> Self {
        Self {
            documents: Arc::new(MemoryDocumentStore::new()),
            jobs: Arc::new(MemoryJobStore::new()),
        }
    }

    async fn open(&self, config: EditorConfig) -> Workspace {
        Workspace::open(
            config,
            &StaticIdentity("user-1".to_string()),
            self.documents.clone(),
            self.jobs.clone(),
        )
        .await
    }
}

#[cfg(test)]
mod local_only_tests {
    use super::*;

    #[tokio::test]
    async fn test_failed_identity_degrades_to_local_only() {
        let stores = Stores::new();
        let workspace = Workspace::open(
            EditorConfig::default(),
            &FailingIdentity,
            stores.documents.clone(),
            stores.jobs.clone(),
        )
        .await;

        assert!(workspace.is_local_only());
        let editor = workspace.editor();
        let mut editor = editor.lock().await;
        let notices = editor.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);

        // Editing keeps working in memory.
        assert!(editor.is_ready());
        add_node(&mut editor, ComponentType::OnPremServer, Phase::Source, true);
        assert_eq!(editor.document().nodes.len(), 1);
    }

    #[tokio::test]
    async fn test_each_local_only_save_emits_one_notice() {
        let stores = Stores::new();
        let workspace = Workspace::open(
            EditorConfig::default(),
            &FailingIdentity,
            stores.documents.clone(),
            stores.jobs.clone(),
        )
        .await;
        workspace.editor().lock().await.take_notices();

        for attempt in 1..=3 {
            let result = workspace.save().await;
            assert!(matches!(result, Err(PersistenceError::LocalOnly)));
            let notices = workspace.editor().lock().await.take_notices();
            assert_eq!(notices.len(), 1, "attempt {}", attempt);
            assert_eq!(notices[0].level, NoticeLevel::Warning);
        }
    }

    #[tokio::test]
    async fn test_scheduled_local_only_saves_each_emit_a_notice() {
        let stores = Stores::new();
        let mut workspace = Workspace::open(
            EditorConfig::default(),
            &FailingIdentity,
            stores.documents.clone(),
            stores.jobs.clone(),
        )
        .await;
        workspace.editor().lock().await.take_notices();

        for _ in 0..3 {
            workspace.schedule_save();
        }
        workspace.flush().await;

        let notices = workspace.editor().lock().await.take_notices();
        assert_eq!(notices.len(), 3);
        assert!(notices.iter().all(|n| n.level == NoticeLevel::Warning));
    }

    #[tokio::test(start_paused = true)]
    async fn test_local_only_kickoff_still_advances() {
        let stores = Stores::new();
        let mut workspace = Workspace::open(
            config_with_failure_rate(0.0),
            &FailingIdentity,
            stores.documents.clone(),
            stores.jobs.clone(),
        )
        .await;
        prepare_for_kickoff(&mut *workspace.editor().lock().await, 2);

        let jobs = workspace.kickoff().await.expect("kickoff should succeed");
        assert_eq!(jobs.len(), 2);
        assert!(workspace.is_ticking());

        tokio::time::sleep(Duration::from_secs(10)).await;
        let editor = workspace.editor();
        let editor = editor.lock().await;
        assert!(editor.jobs().iter().all(|j| j.status == JobStatus::Completed));
        assert!(!workspace.is_ticking());
    }
}

#[cfg(test)]
mod document_tests {
    use super::*;

    #[tokio::test]
    async fn test_save_writes_stamped_document() {
        let stores = Stores::new();
        let workspace = stores.open(EditorConfig::default()).await;
        add_node(
            &mut *workspace.editor().lock().await,
            ComponentType::OnPremServer,
            Phase::Source,
            true,
        );

        workspace.save().await.expect("save should succeed");

        let key = workspace.session().key().expect("connected").clone();
        assert_eq!(
            key.to_string(),
            "artifacts/default-app-id/users/user-1/diagrams/current_diagram"
        );
        let stored = stores.documents.get(&key).expect("document stored");
        assert_eq!(stored["nodes"].as_array().map(Vec::len), Some(1));
        assert!(stored.get("lastUpdated").is_some());
    }

    #[tokio::test]
    async fn test_remote_value_overwrites_local_state() {
        let stores = Stores::new();
        let workspace = stores.open(EditorConfig::default()).await;
        add_node(
            &mut *workspace.editor().lock().await,
            ComponentType::OnPremServer,
            Phase::Source,
            true,
        );

        let mut remote = editor_ready_for_kickoff(EditorConfig::default(), 2)
            .document()
            .clone();
        remote.nodes[0].is_detailed = false;
        let key = workspace.session().key().expect("connected").clone();
        stores
            .documents
            .push_remote(&key, serde_json::to_value(&remote).expect("serializes"));

        assert!(workspace.pull_remote().await);
        let editor = workspace.editor();
        let editor = editor.lock().await;
        assert_eq!(editor.document().nodes.len(), 4);
        assert!(editor.document().source_confirmed);
        // Checklist flags are recomputed on receipt.
        assert!(editor.document().nodes[0].is_detailed);
    }

    #[tokio::test]
    async fn test_own_write_echo_is_applied() {
        let stores = Stores::new();
        let workspace = stores.open(EditorConfig::default()).await;
        add_node(
            &mut *workspace.editor().lock().await,
            ComponentType::LoadBalancer,
            Phase::Source,
            false,
        );
        workspace.save().await.expect("save should succeed");

        assert!(workspace.pull_remote().await);
        assert_eq!(workspace.editor().lock().await.document().nodes.len(), 1);
        assert!(!workspace.pull_remote().await);
    }

    #[tokio::test]
    async fn test_undecodable_remote_payload_is_ignored() {
        let stores = Stores::new();
        let workspace = stores.open(EditorConfig::default()).await;
        add_node(
            &mut *workspace.editor().lock().await,
            ComponentType::OnPremServer,
            Phase::Source,
            false,
        );

        let key = workspace.session().key().expect("connected").clone();
        stores
            .documents
            .push_remote(&key, json!({ "nodes": "not a list" }));

        assert!(!workspace.pull_remote().await);
        assert_eq!(workspace.editor().lock().await.document().nodes.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_write_emits_error_notice() {
        let stores = Stores::new();
        let workspace = stores.open(EditorConfig::default()).await;
        stores.documents.set_offline(true);

        let result = workspace.save().await;
        assert!(matches!(result, Err(PersistenceError::Write(_))));
        let notices = workspace.editor().lock().await.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert!(!workspace.is_local_only());
    }

    #[tokio::test]
    async fn test_failed_subscription_still_allows_saving() {
        let stores = Stores::new();
        stores.documents.set_offline(true);
        let workspace = stores.open(EditorConfig::default()).await;
        assert!(!workspace.is_local_only());

        let notices = workspace.editor().lock().await.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);

        stores.documents.set_offline(false);
        workspace.save().await.expect("save should succeed");
        assert!(!workspace.pull_remote().await);
    }

    #[tokio::test]
    async fn test_each_failed_subscription_emits_a_notice() {
        let stores = Stores::new();
        stores.documents.set_offline(true);
        stores.jobs.set_offline(true);
        let workspace = stores.open(EditorConfig::default()).await;

        let notices = workspace.editor().lock().await.take_notices();
        assert_eq!(notices.len(), 2);
        assert!(notices.iter().all(|n| n.level == NoticeLevel::Error));
    }

    #[tokio::test]
    async fn test_deleted_remote_document_reads_as_empty() {
        let stores = Stores::new();
        let workspace = stores.open(EditorConfig::default()).await;
        let editor = workspace.editor();
        {
            let mut editor = editor.lock().await;
            let a = add_node(&mut editor, ComponentType::OnPremServer, Phase::Source, true);
            let b = add_node(&mut editor, ComponentType::OnPremDatabase, Phase::Source, true);
            wire(&mut editor, &a, &b);
        }

        let key = workspace.session().key().expect("connected").clone();
        stores.documents.delete_remote(&key);

        assert!(workspace.pull_remote().await);
        let editor = editor.lock().await;
        assert!(editor.document().nodes.is_empty());
        assert!(editor.document().connections.is_empty());
        assert!(!editor.document().source_confirmed);
    }

    #[tokio::test]
    async fn test_scheduled_saves_coalesce() {
        let stores = Stores::new();
        let mut workspace = stores.open(EditorConfig::default()).await;
        add_node(
            &mut *workspace.editor().lock().await,
            ComponentType::OnPremServer,
            Phase::Source,
            true,
        );

        workspace.schedule_save();
        workspace.schedule_save();
        workspace.flush().await;

        let key = workspace.session().key().expect("connected").clone();
        let stored = stores.documents.get(&key).expect("document stored");
        assert_eq!(stored["nodes"].as_array().map(Vec::len), Some(1));
    }
}

#[cfg(test)]
mod job_store_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_job_statuses_reach_the_store() {
        let stores = Stores::new();
        let mut workspace = stores.open(config_with_failure_rate(0.0)).await;
        prepare_for_kickoff(&mut *workspace.editor().lock().await, 2);

        workspace.kickoff().await.expect("kickoff should succeed");
        let stored = stores.jobs.jobs("user-1");
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|j| j.status == JobStatus::Initiating));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!workspace.is_ticking());
        assert!(stores
            .jobs
            .jobs("user-1")
            .iter()
            .all(|j| j.status == JobStatus::Completed));

        assert!(workspace.pull_remote().await);
        assert_eq!(workspace.editor().lock().await.jobs().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_cancels_advancement() {
        let stores = Stores::new();
        let mut workspace = stores.open(config_with_failure_rate(0.0)).await;
        prepare_for_kickoff(&mut *workspace.editor().lock().await, 1);

        workspace.kickoff().await.expect("kickoff should succeed");
        workspace.teardown();
        assert!(!workspace.is_ticking());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(stores
            .jobs
            .jobs("user-1")
            .iter()
            .all(|j| j.status == JobStatus::Initiating));
        assert!(!workspace.pull_remote().await);
    }
}

#[cfg(test)]
mod identity_tests {
    use super::*;

    #[test]
    fn test_anonymous_identity_is_stable() {
        let identity = AnonymousIdentity::default();
        let first = tokio_test::block_on(identity.get_or_create_user_id()).expect("id");
        let second = tokio_test::block_on(identity.get_or_create_user_id()).expect("id");
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }
}
