//! Integration tests for the deletion list endpoint

use shardsync_client::provider::HttpUpdateAuthority;
use shardsync_client::ClientError;
use shardsync_core::ports::IUpdateAuthority;

use crate::common;

#[tokio::test]
async fn test_delete_list_returns_entries_in_order() {
    let (server, client) = common::setup_update_mock().await;
    common::mount_delete_list(
        &server,
        serde_json::json!(["old/plugin.dll", "legacy", "Launcher.exe"]),
    )
    .await;

    let list = client.fetch_delete_list().await.expect("fetch failed");
    assert_eq!(list.entries(), ["old/plugin.dll", "legacy", "Launcher.exe"]);
}

#[tokio::test]
async fn test_delete_list_empty() {
    let (server, client) = common::setup_update_mock().await;
    common::mount_delete_list(&server, serde_json::json!([])).await;

    let list = client.fetch_delete_list().await.unwrap();
    assert!(list.is_empty());
}

#[tokio::test]
async fn test_delete_list_rejects_object() {
    let (server, client) = common::setup_update_mock().await;
    common::mount_delete_list(&server, serde_json::json!({"files": []})).await;

    let err = client.fetch_delete_list().await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_delete_list_through_port_adds_context() {
    let (server, client) = common::setup_update_mock().await;
    common::mount_status(&server, "GET", "/api/delete-list", 503).await;

    let authority = HttpUpdateAuthority::new(client);
    let err = authority.fetch_delete_list().await.unwrap_err();
    assert!(err.to_string().contains("deletion list"));
    assert!(err.downcast_ref::<ClientError>().is_some());
}
