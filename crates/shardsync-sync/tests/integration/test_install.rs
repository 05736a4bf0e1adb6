//! Artifact installation scenarios

use shardsync_core::ports::FileOutcome;
use shardsync_sync::scanner::ManifestScanner;
use tokio_util::sync::CancellationToken;
use wiremock::MockServer;

use crate::common::{self, Recorder, PROTECTED, SETTINGS};

#[tokio::test]
async fn test_patch_overwrites_data_and_keeps_protected_profile() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    common::write(root.path(), "data/a.txt", "old content");
    let macro_rel = format!("{PROTECTED}/macro.xml");
    let macro_file = common::write(root.path(), &macro_rel, "my macros");

    common::mount_plan(&server, r#"{"patch001": "x"}"#).await;
    common::mount_artifact(
        &server,
        "patch001",
        common::build_zip(&[
            ("data/a.txt", "new content"),
            (macro_rel.as_str(), "server macros"),
        ]),
    )
    .await;
    common::mount_delete_list(&server, &[]).await;

    let recorder = Recorder::default();
    let report = common::orchestrator(&server, root.path())
        .run(&recorder, &CancellationToken::new())
        .await
        .expect("sync failed");

    assert_eq!(
        std::fs::read_to_string(root.path().join("data/a.txt")).unwrap(),
        "new content"
    );
    assert_eq!(std::fs::read_to_string(&macro_file).unwrap(), "my macros");
    assert_eq!(report.artifacts_installed, 1);
    assert_eq!(report.files_installed, 1);
    assert_eq!(report.files_protected, 1);

    let lines = recorder.lines.lock().unwrap();
    assert!(lines.iter().any(|l| l == "Updated patch001 (1/1)"));
    assert_eq!(lines.last().unwrap(), "Update completed successfully");

    let progress = recorder.progress.lock().unwrap();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(progress.iter().filter(|p| **p == 1.0).count(), 1);
    assert_eq!(*progress.last().unwrap(), 1.0);

    let files = recorder.files.lock().unwrap();
    assert!(files.iter().any(|e| {
        e.path.as_str().ends_with("macro.xml") && e.outcome == FileOutcome::SkippedProtected
    }));
}

#[tokio::test]
async fn test_missing_protected_file_is_created() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    let macro_rel = format!("{PROTECTED}/macro.xml");

    common::mount_plan(&server, r#"{"razor": 1}"#).await;
    common::mount_artifact(
        &server,
        "razor",
        common::build_zip(&[(macro_rel.as_str(), "defaults")]),
    )
    .await;
    common::mount_delete_list(&server, &[]).await;

    common::orchestrator(&server, root.path())
        .run(&Recorder::default(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        std::fs::read_to_string(root.path().join(PROTECTED).join("macro.xml")).unwrap(),
        "defaults"
    );
}

#[tokio::test]
async fn test_settings_merge_keeps_user_keys() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    common::write(
        root.path(),
        SETTINGS,
        r#"{"ip":"old.host","port":2593,"username":"player","sound":false}"#,
    );

    common::mount_plan(&server, r#"{"ClassicUO/config": 1}"#).await;
    common::mount_artifact(
        &server,
        "ClassicUO/config",
        common::build_zip(&[(
            SETTINGS,
            r#"{"ip":"server.endore.pl","port":2594,"clientversion":"7.0.15.1","username":"default"}"#,
        )]),
    )
    .await;
    common::mount_delete_list(&server, &[]).await;

    let report = common::orchestrator(&server, root.path())
        .run(&Recorder::default(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(report.files_merged, 1);

    let text = std::fs::read_to_string(root.path().join(SETTINGS)).unwrap();
    let merged: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        merged,
        serde_json::json!({
            "ip": "server.endore.pl",
            "port": 2594,
            "clientversion": "7.0.15.1",
            "username": "player",
            "sound": false
        })
    );
}

#[tokio::test]
async fn test_rescan_after_install_matches_archive_content() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();

    common::mount_plan(&server, r#"{"patch001": 1}"#).await;
    common::mount_artifact(
        &server,
        "patch001",
        common::build_zip(&[("data/a.txt", "alpha"), ("data/b/c.bin", "gamma")]),
    )
    .await;
    common::mount_delete_list(&server, &[]).await;

    common::orchestrator(&server, root.path())
        .run(&Recorder::default(), &CancellationToken::new())
        .await
        .unwrap();

    let expected = tempfile::tempdir().unwrap();
    common::write(expected.path(), "data/a.txt", "alpha");
    common::write(expected.path(), "data/b/c.bin", "gamma");

    let installed = ManifestScanner::new(root.path()).scan().await.unwrap();
    let reference = ManifestScanner::new(expected.path()).scan().await.unwrap();
    assert_eq!(installed.manifest, reference.manifest);
}

#[tokio::test]
async fn test_broken_artifact_does_not_stop_the_next_one() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();

    common::mount_plan(&server, r#"{"broken": 1, "good": 1}"#).await;
    common::mount_artifact(&server, "broken", b"not a zip".to_vec()).await;
    common::mount_artifact(&server, "good", common::build_zip(&[("ok.txt", "ok")])).await;
    common::mount_delete_list(&server, &[]).await;

    let report = common::orchestrator(&server, root.path())
        .run(&Recorder::default(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.artifacts_installed, 1);
    assert_eq!(report.artifacts_failed(), 1);
    assert!(report.has_failures());
    assert!(root.path().join("ok.txt").exists());
}

#[tokio::test]
async fn test_staging_never_lands_in_game_directory() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();

    common::mount_plan(&server, r#"{"patch001": 1}"#).await;
    common::mount_artifact(&server, "patch001", common::build_zip(&[("a.txt", "a")])).await;
    common::mount_delete_list(&server, &[]).await;

    common::orchestrator(&server, root.path())
        .run(&Recorder::default(), &CancellationToken::new())
        .await
        .unwrap();

    let names: Vec<String> = std::fs::read_dir(root.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.txt".to_string()]);
}
