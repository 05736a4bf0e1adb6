//! Integration tests for manifest reconciliation

use shardsync_client::ClientError;
use shardsync_core::domain::{ContentDigest, Manifest, RelativePath, SyncRequest};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common;

fn sample_request() -> SyncRequest {
    let mut manifest = Manifest::new();
    manifest.insert(
        RelativePath::parse("data/map0.mul").unwrap(),
        ContentDigest::new("ab".repeat(32)).unwrap(),
    );
    SyncRequest::new(manifest, None, false)
}

#[tokio::test]
async fn test_reconcile_returns_keys_in_document_order() {
    let (server, client) = common::setup_update_mock().await;
    common::mount_reconcile(&server, r#"{"patch002": 1, "patch001": 1, "ClassicUO/x": 1}"#).await;

    let plan = client
        .reconcile(&sample_request())
        .await
        .expect("reconcile failed");

    let keys: Vec<&str> = plan.artifacts().iter().map(|k| k.as_str()).collect();
    assert_eq!(keys, vec!["patch002", "patch001", "ClassicUO/x"]);
}

#[tokio::test]
async fn test_reconcile_sends_wire_fields() {
    let (server, client) = common::setup_update_mock().await;

    Mock::given(method("POST"))
        .and(path("/api/updater"))
        .and(body_partial_json(serde_json::json!({
            "files_to_check": { "data/map0.mul": "ab".repeat(32) },
            "settings_json": "{}",
            "skip_classicuo": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let plan = client.reconcile(&sample_request()).await.unwrap();
    assert!(plan.is_empty());
}

#[tokio::test]
async fn test_reconcile_empty_object_is_empty_plan() {
    let (server, client) = common::setup_update_mock().await;
    common::mount_reconcile(&server, "{}").await;

    let plan = client.reconcile(&sample_request()).await.unwrap();
    assert!(plan.is_empty());
}

#[tokio::test]
async fn test_reconcile_rejects_non_object() {
    let (server, client) = common::setup_update_mock().await;
    common::mount_reconcile(&server, r#"["patch001"]"#).await;

    let err = client.reconcile(&sample_request()).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_reconcile_rejects_malformed_json() {
    let (server, client) = common::setup_update_mock().await;
    common::mount_reconcile(&server, "{not json").await;

    let err = client.reconcile(&sample_request()).await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)));
}

#[tokio::test]
async fn test_reconcile_server_error_status() {
    let (server, client) = common::setup_update_mock().await;
    common::mount_status(&server, "POST", "/api/updater", 500).await;

    let err = client.reconcile(&sample_request()).await.unwrap_err();
    match err {
        ClientError::Status { status, url } => {
            assert_eq!(status, 500);
            assert!(url.ends_with("/api/updater"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_reconcile_unreachable_server() {
    // Nothing listens on port 9 of localhost in the test environment.
    let client = shardsync_client::client::UpdateClient::with_base_url("http://127.0.0.1:9").unwrap();
    let err = client.reconcile(&sample_request()).await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)));
}
