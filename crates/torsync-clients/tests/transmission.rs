use std::path::Path;
use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use torsync_clients::TransmissionAdapter;
use torsync_core::{
    AddTorrent, AdapterError, ClientAdapter, ContentAccess, ContentHash, ContentLocator, LabelSet,
    TorrentId,
};

const RPC_PATH: &str = "/transmission/rpc";
const HASH: &str = "0123456789abcdef0123456789abcdef01234567";
// base64 of "d4:infoe"
const METAINFO_B64: &str = "ZDQ6aW5mb2U=";

fn adapter_for(server: &MockServer, torrent_dir: &Path) -> TransmissionAdapter {
    let url = server.url(RPC_PATH).parse().expect("mock rpc url");
    TransmissionAdapter::new(url, None, torrent_dir, Duration::from_secs(5))
        .expect("adapter builds")
}

fn mock_session(server: &MockServer, rpc_version: u32) {
    server.mock(|when, then| {
        when.method(POST).path(RPC_PATH).json_body(json!({
            "method": "session-get",
            "arguments": {"fields": ["version", "rpc-version"]}
        }));
        then.status(200).json_body(json!({
            "result": "success",
            "arguments": {"version": "4.0.5 (a6fe2a64aa)", "rpc-version": rpc_version}
        }));
    });
}

async fn connected(server: &MockServer, torrent_dir: &Path) -> TransmissionAdapter {
    mock_session(server, 17);
    let mut adapter = adapter_for(server, torrent_dir);
    adapter.connect().await.expect("connect succeeds");
    adapter
}

fn add_request<'a>(
    hash: &'a ContentHash,
    locator: &'a ContentLocator,
    labels: &'a LabelSet,
) -> AddTorrent<'a> {
    AddTorrent {
        content_hash: hash,
        name: "Film",
        locator,
        location: "/data/movies",
        labels,
        category: Some("films"),
        skip_verification: true,
        start_paused: true,
    }
}

#[tokio::test]
async fn connect_retries_once_with_fresh_session_id() {
    let server = MockServer::start_async().await;
    let accepted = server.mock(|when, then| {
        when.method(POST)
            .path(RPC_PATH)
            .header("X-Transmission-Session-Id", "token-1");
        then.status(200).json_body(json!({
            "result": "success",
            "arguments": {"version": "4.0.5", "rpc-version": 17}
        }));
    });
    server.mock(|when, then| {
        when.method(POST).path(RPC_PATH);
        then.status(409).header("X-Transmission-Session-Id", "token-1");
    });

    let dir = tempfile::tempdir().expect("tempdir");
    let mut adapter = adapter_for(&server, dir.path());
    let version = adapter.connect().await.expect("connect succeeds");
    accepted.assert();
    assert_eq!(version.version, "4.0.5");
    assert_eq!(version.api_version.as_deref(), Some("17"));
    assert!(adapter.capabilities().supports_labels);
    assert_eq!(adapter.capabilities().content_access, ContentAccess::Stored);
}

#[tokio::test]
async fn basic_auth_is_sent_and_401_maps_to_auth() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(POST)
            .path(RPC_PATH)
            .header("authorization", "Basic dXNlcjpwYXNz");
        then.status(401);
    });

    let url = server.url(RPC_PATH).parse().expect("url");
    let mut adapter = TransmissionAdapter::new(
        url,
        Some(("user".to_string(), "pass".to_string())),
        "/tmp",
        Duration::from_secs(5),
    )
    .expect("adapter builds");
    let err = adapter.connect().await.expect_err("unauthorised");
    assert!(matches!(err, AdapterError::Auth { .. }));
}

#[tokio::test]
async fn old_rpc_versions_do_not_support_labels() {
    let server = MockServer::start_async().await;
    mock_session(&server, 15);
    let dir = tempfile::tempdir().expect("tempdir");
    let mut adapter = adapter_for(&server, dir.path());
    adapter.connect().await.expect("connect succeeds");
    assert!(!adapter.capabilities().supports_labels);
}

#[tokio::test]
async fn calls_before_connect_fail_fast() {
    let server = MockServer::start_async().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let adapter = adapter_for(&server, dir.path());
    let hash: ContentHash = HASH.parse().expect("hash");
    assert!(matches!(
        adapter.locate_content(&hash).await,
        Err(AdapterError::NotConnected { .. })
    ));
    assert!(matches!(
        adapter.pause_torrent(&TorrentId::new("1")).await,
        Err(AdapterError::NotConnected { .. })
    ));
}

#[tokio::test]
async fn list_torrents_reads_native_label_lists() {
    let server = MockServer::start_async().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let adapter = connected(&server, dir.path()).await;
    server.mock(|when, then| {
        when.method(POST).path(RPC_PATH).json_body(json!({
            "method": "torrent-get",
            "arguments": {"fields": ["id", "hashString", "name", "downloadDir", "percentDone", "labels"]}
        }));
        then.status(200).json_body(json!({
            "result": "success",
            "arguments": {"torrents": [
                {"id": 1, "hashString": HASH, "name": "Film", "downloadDir": "/data/movies",
                 "percentDone": 1.0, "labels": ["movies"]},
                {"id": 2, "hashString": "short", "name": "Bad", "downloadDir": "/data",
                 "percentDone": 0.0, "labels": []}
            ]}
        }));
    });

    let records = adapter.list_torrents().await.expect("listing succeeds");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id.as_str(), "1");
    assert!(records[0].labels.contains("movies"));
    assert!(records[0].category.is_none());
}

#[tokio::test]
async fn locate_content_prefers_torrent_then_magnet() {
    let server = MockServer::start_async().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let adapter = connected(&server, dir.path()).await;
    let hash: ContentHash = HASH.parse().expect("hash");

    let err = adapter.locate_content(&hash).await.expect_err("nothing stored");
    assert!(matches!(err, AdapterError::NotFound { .. }));
    assert!(err.to_string().contains("neither torrent nor magnet file found"));

    let magnet = dir.path().join(format!("{HASH}.magnet"));
    std::fs::write(&magnet, "magnet:?xt=urn:btih:x").expect("write magnet");
    assert_eq!(
        adapter.locate_content(&hash).await.expect("magnet found"),
        ContentLocator::MagnetFile(magnet)
    );

    let torrent = dir.path().join(format!("{HASH}.torrent"));
    std::fs::write(&torrent, b"d4:infoe").expect("write torrent");
    assert_eq!(
        adapter.locate_content(&hash).await.expect("torrent found"),
        ContentLocator::TorrentFile(torrent)
    );
}

#[tokio::test]
async fn add_uploads_metainfo_and_applies_labels() {
    let server = MockServer::start_async().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let adapter = connected(&server, dir.path()).await;
    let torrent = dir.path().join(format!("{HASH}.torrent"));
    std::fs::write(&torrent, b"d4:infoe").expect("write torrent");

    let add = server.mock(|when, then| {
        when.method(POST).path(RPC_PATH).json_body(json!({
            "method": "torrent-add",
            "arguments": {
                "download-dir": "/data/movies",
                "paused": true,
                "metainfo": METAINFO_B64
            }
        }));
        then.status(200).json_body(json!({
            "result": "success",
            "arguments": {"torrent-added": {"id": 5, "hashString": HASH, "name": "Film"}}
        }));
    });
    let labels_set = server.mock(|when, then| {
        when.method(POST).path(RPC_PATH).json_body(json!({
            "method": "torrent-set",
            "arguments": {"ids": [5], "labels": ["movies"]}
        }));
        then.status(200).json_body(json!({"result": "success", "arguments": {}}));
    });

    let hash: ContentHash = HASH.parse().expect("hash");
    let labels = LabelSet::from_delimited("movies");
    let locator = ContentLocator::TorrentFile(torrent);
    let added = adapter
        .add_torrent(&add_request(&hash, &locator, &labels))
        .await
        .expect("add succeeds");
    assert!(added);
    add.assert();
    labels_set.assert();
}

#[tokio::test]
async fn add_submits_magnet_links_as_filename() {
    let server = MockServer::start_async().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let adapter = connected(&server, dir.path()).await;
    let magnet = dir.path().join(format!("{HASH}.magnet"));
    std::fs::write(&magnet, "magnet:?xt=urn:btih:abc\n").expect("write magnet");

    let add = server.mock(|when, then| {
        when.method(POST).path(RPC_PATH).json_body(json!({
            "method": "torrent-add",
            "arguments": {
                "download-dir": "/data/movies",
                "paused": true,
                "filename": "magnet:?xt=urn:btih:abc"
            }
        }));
        then.status(200).json_body(json!({
            "result": "success",
            "arguments": {"torrent-added": {"id": 6, "hashString": HASH, "name": "Film"}}
        }));
    });

    let hash: ContentHash = HASH.parse().expect("hash");
    let labels = LabelSet::new();
    let locator = ContentLocator::MagnetFile(magnet);
    assert!(
        adapter
            .add_torrent(&add_request(&hash, &locator, &labels))
            .await
            .expect("add succeeds")
    );
    add.assert();
}

#[tokio::test]
async fn duplicates_and_failed_results_are_rejections() {
    let server = MockServer::start_async().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let adapter = connected(&server, dir.path()).await;
    let torrent = dir.path().join(format!("{HASH}.torrent"));
    std::fs::write(&torrent, b"d4:infoe").expect("write torrent");

    let mut duplicate = server.mock(|when, then| {
        when.method(POST).path(RPC_PATH).json_body(json!({
            "method": "torrent-add",
            "arguments": {"download-dir": "/data/movies", "paused": true, "metainfo": METAINFO_B64}
        }));
        then.status(200).json_body(json!({
            "result": "success",
            "arguments": {"torrent-duplicate": {"id": 1, "hashString": HASH, "name": "Film"}}
        }));
    });

    let hash: ContentHash = HASH.parse().expect("hash");
    let labels = LabelSet::new();
    let locator = ContentLocator::TorrentFile(torrent);
    let request = add_request(&hash, &locator, &labels);
    assert!(!adapter.add_torrent(&request).await.expect("duplicate"));
    duplicate.delete();

    server.mock(|when, then| {
        when.method(POST).path(RPC_PATH).json_body(json!({
            "method": "torrent-add",
            "arguments": {"download-dir": "/data/movies", "paused": true, "metainfo": METAINFO_B64}
        }));
        then.status(200)
            .json_body(json!({"result": "invalid or corrupt torrent file"}));
    });
    assert!(!adapter.add_torrent(&request).await.expect("failed result"));
}

#[tokio::test]
async fn pause_sends_numeric_ids() {
    let server = MockServer::start_async().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let adapter = connected(&server, dir.path()).await;
    let stop = server.mock(|when, then| {
        when.method(POST).path(RPC_PATH).json_body(json!({
            "method": "torrent-stop",
            "arguments": {"ids": [7]}
        }));
        then.status(200).json_body(json!({"result": "success", "arguments": {}}));
    });

    adapter
        .pause_torrent(&TorrentId::new("7"))
        .await
        .expect("pause succeeds");
    stop.assert();
}
