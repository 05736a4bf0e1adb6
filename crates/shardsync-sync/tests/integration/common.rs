//! Shared helpers for end-to-end sync tests

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use shardsync_client::client::UpdateClient;
use shardsync_client::provider::HttpUpdateAuthority;
use shardsync_core::domain::{InstallRules, MergeTarget, RelativePath};
use shardsync_core::ports::{FileEvent, ISyncObserver};
use shardsync_sync::engine::SyncOrchestrator;

pub const PROTECTED: &str = "ClassicUO/Data/Plugins/Razor/Profiles/default";
pub const SETTINGS: &str = "ClassicUO/settings.json";

/// Observer recording everything the engine reports
#[derive(Default)]
pub struct Recorder {
    pub progress: Mutex<Vec<f64>>,
    pub lines: Mutex<Vec<String>>,
    pub files: Mutex<Vec<FileEvent>>,
}

impl ISyncObserver for Recorder {
    fn on_progress(&self, fraction: f64) {
        self.progress.lock().unwrap().push(fraction);
    }

    fn on_status(&self, message: &str) {
        self.lines.lock().unwrap().push(message.to_string());
    }

    fn on_file(&self, event: &FileEvent) {
        self.files.lock().unwrap().push(event.clone());
    }
}

/// Build a zip archive in memory
pub fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

/// Write a file under `root`, creating parents
pub fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, content).unwrap();
    path
}

/// Install rules used by the game launcher
pub fn launcher_rules() -> InstallRules {
    InstallRules::none()
        .with_protected(RelativePath::parse(PROTECTED).unwrap())
        .with_merge_target(MergeTarget::new(
            RelativePath::parse(SETTINGS).unwrap(),
            ["ip", "port", "clientversion", "last_server_name", "lastservernum"],
        ))
}

/// Orchestrator for `root` talking to `server`
pub fn orchestrator(server: &MockServer, root: &Path) -> SyncOrchestrator {
    let client = UpdateClient::with_base_url(server.uri()).expect("build client");
    let authority = Arc::new(HttpUpdateAuthority::new(client));
    SyncOrchestrator::new(authority, root, launcher_rules())
        .with_executable(Some(root.join("Launcher.exe")))
}

/// Mount `POST /api/updater` answering with a raw JSON body
pub async fn mount_plan(server: &MockServer, raw_body: &str) {
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

/// Mount `GET /download/<key>` serving an archive
pub async fn mount_artifact(server: &MockServer, key: &str, archive: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(format!("/download/{}", key)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive))
        .mount(server)
        .await;
}

/// Mount `GET /api/delete-list`
pub async fn mount_delete_list(server: &MockServer, entries: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/api/delete-list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(entries))
        .mount(server)
        .await;
}
