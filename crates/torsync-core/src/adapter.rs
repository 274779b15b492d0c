//! Capability interface implemented by each torrent-client adapter.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{AdapterError, AdapterResult};
use crate::model::{ClientKind, ContentHash, ContentLocator, LabelSet, TorrentId, TorrentRecord};

/// How an adapter makes torrent content available for transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentAccess {
    /// Content files are kept on disk and can be located by hash.
    Stored,
    /// The daemon must be asked to serialise the torrent into a file.
    Export,
}

/// Feature flags fixed once the adapter is connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Whether added torrents can carry labels/tags.
    pub supports_labels: bool,
    /// How transferable content is obtained from this client as a source.
    pub content_access: ContentAccess,
}

/// Version information reported by a daemon during connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientVersion {
    /// Application version string.
    pub version: String,
    /// Protocol revision, when the daemon reports one separately.
    pub api_version: Option<String>,
}

/// Parameters for creating a torrent on a destination daemon.
#[derive(Debug, Clone, Copy)]
pub struct AddTorrent<'a> {
    /// Content identifier, for logging and duplicate detection.
    pub content_hash: &'a ContentHash,
    /// Display name, for logging.
    pub name: &'a str,
    /// Transferable content to upload.
    pub locator: &'a ContentLocator,
    /// Save directory on the destination.
    pub location: &'a str,
    /// Labels to attach.
    pub labels: &'a LabelSet,
    /// Category to attach where supported.
    pub category: Option<&'a str>,
    /// Ask the daemon to trust the on-disk data without re-hashing.
    pub skip_verification: bool,
    /// Create the torrent paused.
    pub start_paused: bool,
}

/// Uniform surface over a remote torrent-client daemon.
#[async_trait]
pub trait ClientAdapter: Send + Sync {
    /// Which daemon this adapter talks to.
    fn kind(&self) -> ClientKind;

    /// Feature flags; only meaningful after a successful connect.
    fn capabilities(&self) -> Capabilities;

    /// Authenticate and record the session used by every other call.
    async fn connect(&mut self) -> AdapterResult<ClientVersion>;

    /// Fetch every torrent currently known to the daemon.
    async fn list_torrents(&self) -> AdapterResult<Vec<TorrentRecord>>;

    /// Locate stored `.torrent` or `.magnet` content for a hash.
    async fn locate_content(&self, hash: &ContentHash) -> AdapterResult<ContentLocator> {
        let _ = hash;
        Err(AdapterError::Unsupported {
            client: self.kind(),
            operation: "locate content",
        })
    }

    /// Ask the daemon to write `<output_dir>/<hash>.torrent` and return its path.
    async fn export_content(&self, hash: &ContentHash, output_dir: &Path) -> AdapterResult<PathBuf> {
        let _ = (hash, output_dir);
        Err(AdapterError::Unsupported {
            client: self.kind(),
            operation: "export content",
        })
    }

    /// Pause (stop) a torrent by its client-local identifier.
    async fn pause_torrent(&self, id: &TorrentId) -> AdapterResult<()>;

    /// Create a torrent. `Ok(false)` means the daemon rejected this add; `Err` is
    /// reserved for transport or session faults.
    async fn add_torrent(&self, request: &AddTorrent<'_>) -> AdapterResult<bool>;
}
