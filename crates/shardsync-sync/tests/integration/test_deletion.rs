//! Deletion reconciliation scenarios

use tokio_util::sync::CancellationToken;
use wiremock::MockServer;

use crate::common::{self, Recorder};

#[tokio::test]
async fn test_obsolete_file_removed_and_second_run_is_clean() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    common::write(root.path(), "old/plugin.dll", "legacy");

    common::mount_plan(&server, "{}").await;
    common::mount_delete_list(&server, &["old/plugin.dll"]).await;

    let sync = common::orchestrator(&server, root.path());
    let first = sync
        .run(&Recorder::default(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(first.entries_deleted, 1);
    assert!(!root.path().join("old/plugin.dll").exists());

    let second = sync
        .run(&Recorder::default(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(second.entries_deleted, 0);
    assert!(second.errors.is_empty());
}

#[tokio::test]
async fn test_running_executable_survives_deletion_list() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    common::write(root.path(), "Launcher.exe", "me");
    common::write(root.path(), "legacy/old.txt", "x");

    common::mount_plan(&server, "{}").await;
    common::mount_delete_list(&server, &["Launcher.exe", "legacy"]).await;

    let report = common::orchestrator(&server, root.path())
        .run(&Recorder::default(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(root.path().join("Launcher.exe").exists());
    assert!(!root.path().join("legacy").exists());
    assert_eq!(report.entries_deleted, 1);
}

#[tokio::test]
async fn test_missing_delete_list_endpoint_keeps_run_successful() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    common::mount_plan(&server, "{}").await;

    let recorder = Recorder::default();
    let report = common::orchestrator(&server, root.path())
        .run(&recorder, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.errors.len(), 1);
    assert_eq!(*recorder.progress.lock().unwrap().last().unwrap(), 1.0);
}
