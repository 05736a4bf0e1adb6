//! Reconciliation and exclusion scenarios

use shardsync_core::domain::RelativePath;
use shardsync_sync::SyncError;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{self, Recorder};

#[tokio::test]
async fn test_manifest_sent_with_exclusion_applied() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    common::write(root.path(), "data/a.txt", "a");
    common::write(root.path(), "ClassicUO/ClassicUO.exe", "cuo");

    common::mount_plan(&server, "{}").await;
    common::mount_delete_list(&server, &[]).await;

    common::orchestrator(&server, root.path())
        .with_exclusion(Some(RelativePath::parse("ClassicUO/").unwrap()))
        .run(&Recorder::default(), &CancellationToken::new())
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let post = requests
        .iter()
        .find(|r| r.url.path() == "/api/updater")
        .expect("no reconcile request");
    let body: serde_json::Value = serde_json::from_slice(&post.body).unwrap();

    let files = body["files_to_check"].as_object().unwrap();
    assert!(files.contains_key("data/a.txt"));
    assert!(!files.keys().any(|k| k.starts_with("ClassicUO/")));
    assert_eq!(body["skip_classicuo"], true);
    assert_eq!(body["settings_json"], "{}");
}

#[tokio::test]
async fn test_excluded_artifact_is_not_downloaded() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();

    common::mount_plan(&server, r#"{"ClassicUO/client": 1, "patch001": 1}"#).await;
    Mock::given(method("GET"))
        .and(path("/download/ClassicUO/client"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    common::mount_artifact(&server, "patch001", common::build_zip(&[("a.txt", "a")])).await;
    common::mount_delete_list(&server, &[]).await;

    let recorder = Recorder::default();
    let report = common::orchestrator(&server, root.path())
        .with_exclusion(Some(RelativePath::parse("ClassicUO").unwrap()))
        .run(&recorder, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.artifacts_total, 2);
    assert_eq!(report.artifacts_skipped, 1);
    assert!(recorder
        .lines
        .lock()
        .unwrap()
        .iter()
        .any(|l| l == "Updated patch001 (2/2)"));
}

#[tokio::test]
async fn test_server_error_aborts_before_install() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/api/updater"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/delete-list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Vec::<String>::new()))
        .expect(0)
        .mount(&server)
        .await;

    let recorder = Recorder::default();
    let err = common::orchestrator(&server, root.path())
        .run(&recorder, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::SyncUnavailable(_)));
    assert!(err.is_fatal());
    assert!(recorder
        .lines
        .lock()
        .unwrap()
        .last()
        .unwrap()
        .starts_with("Update failed:"));
}

#[tokio::test]
async fn test_malformed_plan_aborts() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    common::mount_plan(&server, r#"["not", "an", "object"]"#).await;

    let err = common::orchestrator(&server, root.path())
        .run(&Recorder::default(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::SyncUnavailable(_)));
}
