//! Integration tests for artifact downloads

use shardsync_client::ClientError;
use shardsync_core::domain::ArtifactKey;

use crate::common;

#[tokio::test]
async fn test_download_writes_body_to_file() {
    let (server, client) = common::setup_update_mock().await;
    let content = b"PK fake archive bytes";
    common::mount_download(&server, "patch001", content).await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("patch001.zip");
    let key = ArtifactKey::new("patch001").unwrap();

    let written = client
        .download_artifact(&key, &dest)
        .await
        .expect("download failed");

    assert_eq!(written, content.len() as u64);
    assert_eq!(std::fs::read(&dest).unwrap(), content);
}

#[tokio::test]
async fn test_download_large_body() {
    let (server, client) = common::setup_update_mock().await;
    let content: Vec<u8> = (0..2_097_152).map(|i| (i % 251) as u8).collect();
    common::mount_download(&server, "big", &content).await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("big.zip");
    let written = client
        .download_artifact(&ArtifactKey::new("big").unwrap(), &dest)
        .await
        .unwrap();

    assert_eq!(written, 2_097_152);
    assert_eq!(std::fs::read(&dest).unwrap(), content);
}

#[tokio::test]
async fn test_download_key_with_slash_keeps_path() {
    let (server, client) = common::setup_update_mock().await;
    common::mount_download(&server, "ClassicUO/client", b"zip").await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("a.zip");
    let written = client
        .download_artifact(&ArtifactKey::new("ClassicUO/client").unwrap(), &dest)
        .await
        .unwrap();
    assert_eq!(written, 3);
}

#[tokio::test]
async fn test_download_truncates_existing_destination() {
    let (server, client) = common::setup_update_mock().await;
    common::mount_download(&server, "small", b"new").await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("small.zip");
    std::fs::write(&dest, b"much longer previous content").unwrap();

    client
        .download_artifact(&ArtifactKey::new("small").unwrap(), &dest)
        .await
        .unwrap();
    assert_eq!(std::fs::read(&dest).unwrap(), b"new");
}

#[tokio::test]
async fn test_download_missing_artifact() {
    let (server, client) = common::setup_update_mock().await;
    common::mount_status(&server, "GET", "/download/gone", 404).await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("gone.zip");
    let err = client
        .download_artifact(&ArtifactKey::new("gone").unwrap(), &dest)
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Status { status: 404, .. }));
    assert!(!dest.exists());
}
