//! In-memory adapter used to drive the runner without a daemon.

#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use torsync_core::{
    AdapterError, AdapterResult, AddTorrent, Capabilities, ClientAdapter, ClientKind,
    ClientVersion, ContentAccess, ContentHash, ContentLocator, LabelSet, TorrentId, TorrentRecord,
};

/// Recorded `add_torrent` call.
#[derive(Debug, Clone)]
pub struct AddCall {
    pub hash: ContentHash,
    pub location: String,
    pub labels: LabelSet,
    pub skip_verification: bool,
    pub start_paused: bool,
    pub locator: ContentLocator,
}

pub struct FakeClient {
    kind: ClientKind,
    capabilities: Capabilities,
    content_dir: PathBuf,
    torrents: Mutex<Vec<TorrentRecord>>,
    missing_content: HashSet<ContentHash>,
    reject_adds: HashSet<ContentHash>,
    fail_adds: HashSet<ContentHash>,
    fail_pause: bool,
    fail_listing: bool,
    paused: Mutex<Vec<TorrentId>>,
    added: Mutex<Vec<AddCall>>,
    exported: Mutex<Vec<ContentHash>>,
}

impl FakeClient {
    pub fn transmission(torrents: Vec<TorrentRecord>) -> Self {
        Self::new(
            ClientKind::Transmission,
            ContentAccess::Stored,
            true,
            torrents,
        )
    }

    pub fn qbittorrent(torrents: Vec<TorrentRecord>) -> Self {
        Self::new(ClientKind::Qbittorrent, ContentAccess::Export, true, torrents)
    }

    fn new(
        kind: ClientKind,
        content_access: ContentAccess,
        supports_labels: bool,
        torrents: Vec<TorrentRecord>,
    ) -> Self {
        Self {
            kind,
            capabilities: Capabilities {
                supports_labels,
                content_access,
            },
            content_dir: PathBuf::from("/var/lib/transmission/torrents"),
            torrents: Mutex::new(torrents),
            missing_content: HashSet::new(),
            reject_adds: HashSet::new(),
            fail_adds: HashSet::new(),
            fail_pause: false,
            fail_listing: false,
            paused: Mutex::new(Vec::new()),
            added: Mutex::new(Vec::new()),
            exported: Mutex::new(Vec::new()),
        }
    }

    pub fn without_labels(mut self) -> Self {
        self.capabilities.supports_labels = false;
        self
    }

    pub fn missing_content(mut self, hash: &ContentHash) -> Self {
        self.missing_content.insert(hash.clone());
        self
    }

    pub fn rejecting(mut self, hash: &ContentHash) -> Self {
        self.reject_adds.insert(hash.clone());
        self
    }

    pub fn erroring_on_add(mut self, hash: &ContentHash) -> Self {
        self.fail_adds.insert(hash.clone());
        self
    }

    pub fn failing_pause(mut self) -> Self {
        self.fail_pause = true;
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn added(&self) -> Vec<AddCall> {
        self.added.lock().expect("lock").clone()
    }

    pub fn paused(&self) -> Vec<TorrentId> {
        self.paused.lock().expect("lock").clone()
    }

    pub fn exported(&self) -> Vec<ContentHash> {
        self.exported.lock().expect("lock").clone()
    }

    pub fn torrent_count(&self) -> usize {
        self.torrents.lock().expect("lock").len()
    }
}

#[async_trait]
impl ClientAdapter for FakeClient {
    fn kind(&self) -> ClientKind {
        self.kind
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    async fn connect(&mut self) -> AdapterResult<ClientVersion> {
        Ok(ClientVersion {
            version: "fake".to_string(),
            api_version: None,
        })
    }

    async fn list_torrents(&self) -> AdapterResult<Vec<TorrentRecord>> {
        if self.fail_listing {
            return Err(AdapterError::connection(
                self.kind,
                "list",
                std::io::Error::other("connection refused"),
            ));
        }
        Ok(self.torrents.lock().expect("lock").clone())
    }

    async fn locate_content(&self, hash: &ContentHash) -> AdapterResult<ContentLocator> {
        if self.missing_content.contains(hash) {
            return Err(AdapterError::NotFound {
                hash: hash.clone(),
                directory: self.content_dir.clone(),
            });
        }
        Ok(ContentLocator::TorrentFile(
            self.content_dir.join(format!("{hash}.torrent")),
        ))
    }

    async fn export_content(&self, hash: &ContentHash, output_dir: &Path) -> AdapterResult<PathBuf> {
        if self.missing_content.contains(hash) {
            return Err(AdapterError::Export {
                hash: hash.clone(),
                source: "torrent metadata unavailable".into(),
            });
        }
        self.exported.lock().expect("lock").push(hash.clone());
        Ok(output_dir.join(format!("{hash}.torrent")))
    }

    async fn pause_torrent(&self, id: &TorrentId) -> AdapterResult<()> {
        if self.fail_pause {
            return Err(AdapterError::protocol(self.kind, "pause", "torrent is gone"));
        }
        self.paused.lock().expect("lock").push(id.clone());
        Ok(())
    }

    async fn add_torrent(&self, request: &AddTorrent<'_>) -> AdapterResult<bool> {
        if self.fail_adds.contains(request.content_hash) {
            return Err(AdapterError::connection(
                self.kind,
                "add",
                std::io::Error::other("connection reset by peer"),
            ));
        }
        if self.reject_adds.contains(request.content_hash) {
            return Ok(false);
        }
        self.added.lock().expect("lock").push(AddCall {
            hash: request.content_hash.clone(),
            location: request.location.to_string(),
            labels: request.labels.clone(),
            skip_verification: request.skip_verification,
            start_paused: request.start_paused,
            locator: request.locator.clone(),
        });
        self.torrents.lock().expect("lock").push(TorrentRecord {
            id: TorrentId::new(request.content_hash.as_str()),
            content_hash: request.content_hash.clone(),
            name: request.name.to_string(),
            location: request.location.to_string(),
            completion: 0.0,
            labels: request.labels.clone(),
            category: request.category.map(str::to_string),
        });
        Ok(true)
    }
}

pub fn hash(ch: char) -> ContentHash {
    ch.to_string().repeat(40).parse().expect("valid hash")
}

pub fn record(ch: char, name: &str, completion: f64, labels: &str) -> TorrentRecord {
    TorrentRecord {
        id: TorrentId::new(format!("{}", u32::from(ch))),
        content_hash: hash(ch),
        name: name.to_string(),
        location: format!("/data/{name}"),
        completion,
        labels: LabelSet::from_delimited(labels),
        category: None,
    }
}
