//! Shared test helpers for update server integration tests
//!
//! Provides wiremock-based mock server setup for the update server
//! endpoints. Each helper mounts one endpoint on an existing server.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shardsync_client::client::UpdateClient;

/// Starts an empty mock server and returns a client pointing at it
pub async fn setup_update_mock() -> (MockServer, UpdateClient) {
    let server = MockServer::start().await;
    let client = UpdateClient::with_base_url(server.uri()).expect("build client");
    (server, client)
}

/// Mounts `POST /api/updater` answering with the given JSON body.
///
/// The body is sent as raw text so the key order of an object is exactly
/// the order written in the test.
pub async fn mount_reconcile(server: &MockServer, raw_body: &str) {
    Mock::given(method("POST"))
        .and(path("/api/updater"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .set_body_string(raw_body.to_string()),
        )
        .mount(server)
        .await;
}

/// Mounts `GET /download/<key>` returning the given bytes
pub async fn mount_download(server: &MockServer, key: &str, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/download/{}", key)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(server)
        .await;
}

/// Mounts `GET /api/delete-list` returning the given JSON body
pub async fn mount_delete_list(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/delete-list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mounts an error status on the given method and path
pub async fn mount_status(server: &MockServer, http_method: &str, endpoint: &str, status: u16) {
    Mock::given(method(http_method))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}
