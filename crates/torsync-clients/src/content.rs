//! Helpers shared by both adapters: HTTP client construction and loading the
//! payload behind a [`ContentLocator`].

use std::io;
use std::path::Path;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use torsync_core::{AdapterError, AdapterResult, ClientKind, ContentLocator};

/// Transferable torrent content read from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Payload {
    /// Raw bencoded `.torrent` bytes.
    Metainfo(Vec<u8>),
    /// Magnet URI read from a `.magnet` file.
    Magnet(String),
}

impl Payload {
    pub(crate) async fn load(locator: &ContentLocator) -> AdapterResult<Self> {
        match locator {
            ContentLocator::TorrentFile(path) => tokio::fs::read(path)
                .await
                .map(Self::Metainfo)
                .map_err(|source| AdapterError::io("read torrent file", path, source)),
            ContentLocator::MagnetFile(path) => read_magnet_link(path).await.map(Self::Magnet),
        }
    }
}

async fn read_magnet_link(path: &Path) -> AdapterResult<String> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| AdapterError::io("read magnet file", path, source))?;
    let link = raw.trim();
    if link.is_empty() {
        return Err(AdapterError::io(
            "read magnet file",
            path,
            io::Error::new(io::ErrorKind::InvalidData, "magnet file is empty"),
        ));
    }
    Ok(link.to_string())
}

/// The cookie store carries the WebUI session, whose cookie name differs between
/// qBittorrent releases (`SID`, `QBT_SID_<port>`).
pub(crate) fn build_http_client(client: ClientKind, timeout: Duration) -> AdapterResult<Client> {
    Client::builder()
        .timeout(timeout)
        .cookie_store(true)
        .build()
        .map_err(|err| AdapterError::connection(client, "build http client", err))
}

pub(crate) fn unexpected_status(
    client: ClientKind,
    operation: &'static str,
    status: StatusCode,
) -> AdapterError {
    AdapterError::protocol(client, operation, format!("HTTP {status}"))
}
