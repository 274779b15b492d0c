//! Transmission JSON-RPC adapter.
//!
//! # Design
//! - A 409 answer carries a fresh `X-Transmission-Session-Id`; it is stored and the call
//!   retried once.
//! - Content is read from `<torrent_dir>/<hash>.torrent` or `.magnet`; Transmission has no
//!   export call.
//! - Labels need RPC version 16 and are applied with a follow-up `torrent-set`.

mod rpc;

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::{Value, json};
use tokio::sync::RwLock;
use torsync_core::{
    AddTorrent, AdapterError, AdapterResult, Capabilities, ClientAdapter, ClientKind,
    ClientVersion, ContentAccess, ContentHash, ContentLocator, LabelSet, TorrentId, TorrentRecord,
};
use tracing::{debug, warn};
use url::Url;

use crate::content::{Payload, build_http_client, unexpected_status};
use rpc::{
    AddResult, LABELS_MIN_RPC_VERSION, RpcRequest, RpcResponse, SESSION_HEADER, SessionInfo,
    TORRENT_FIELDS, TorrentList, rpc_id,
};

const KIND: ClientKind = ClientKind::Transmission;

#[derive(Debug, Clone, Copy)]
struct Connected {
    rpc_version: u32,
}

/// Adapter speaking to a Transmission daemon over JSON-RPC.
pub struct TransmissionAdapter {
    http: Client,
    rpc_url: Url,
    credentials: Option<(String, String)>,
    torrent_dir: PathBuf,
    session_id: RwLock<Option<String>>,
    connected: Option<Connected>,
}

impl TransmissionAdapter {
    /// Build an adapter for the RPC endpoint at `rpc_url`.
    ///
    /// `torrent_dir` is where the daemon keeps `<hash>.torrent` and `<hash>.magnet` files.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Connection`] when the HTTP client cannot be constructed.
    pub fn new(
        rpc_url: Url,
        credentials: Option<(String, String)>,
        torrent_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> AdapterResult<Self> {
        Ok(Self {
            http: build_http_client(KIND, timeout)?,
            rpc_url,
            credentials,
            torrent_dir: torrent_dir.into(),
            session_id: RwLock::new(None),
            connected: None,
        })
    }

    fn connected(&self) -> AdapterResult<Connected> {
        self.connected
            .ok_or(AdapterError::NotConnected { client: KIND })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        method: &str,
        arguments: Value,
    ) -> AdapterResult<RpcResponse<T>> {
        let body = RpcRequest { method, arguments };
        let mut retried = false;
        loop {
            let mut request = self.http.post(self.rpc_url.clone()).json(&body);
            if let Some(token) = self.session_id.read().await.as_deref() {
                request = request.header(SESSION_HEADER, token);
            }
            if let Some((username, password)) = &self.credentials {
                request = request.basic_auth(username, Some(password));
            }

            let response = request
                .send()
                .await
                .map_err(|err| AdapterError::connection(KIND, operation, err))?;
            match response.status() {
                StatusCode::CONFLICT if !retried => {
                    let token = response
                        .headers()
                        .get(SESSION_HEADER)
                        .and_then(|value| value.to_str().ok())
                        .map(str::to_string)
                        .ok_or_else(|| {
                            AdapterError::protocol(KIND, operation, "409 without a session id")
                        })?;
                    debug!("refreshing Transmission session id");
                    *self.session_id.write().await = Some(token);
                    retried = true;
                }
                StatusCode::UNAUTHORIZED => return Err(AdapterError::Auth { client: KIND }),
                status if !status.is_success() => {
                    return Err(unexpected_status(KIND, operation, status));
                }
                _ => {
                    return response
                        .json()
                        .await
                        .map_err(|err| AdapterError::protocol(KIND, operation, err.to_string()));
                }
            }
        }
    }

    async fn apply_labels(&self, id: i64, labels: &LabelSet) {
        let labels: Vec<&str> = labels.iter().collect();
        let outcome = self
            .call::<IgnoredAny>(
                "set labels",
                "torrent-set",
                json!({ "ids": [id], "labels": labels }),
            )
            .await;
        match outcome {
            Ok(response) if response.is_success() => {}
            Ok(response) => {
                warn!(id, result = %response.result, "could not set Transmission labels");
            }
            Err(err) => warn!(id, error = %err, "could not set Transmission labels"),
        }
    }

    async fn exists(path: &Path) -> AdapterResult<bool> {
        tokio::fs::try_exists(path)
            .await
            .map_err(|source| AdapterError::io("locate content", path, source))
    }
}

#[async_trait]
impl ClientAdapter for TransmissionAdapter {
    fn kind(&self) -> ClientKind {
        KIND
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            supports_labels: self
                .connected
                .is_some_and(|state| state.rpc_version >= LABELS_MIN_RPC_VERSION),
            content_access: ContentAccess::Stored,
        }
    }

    async fn connect(&mut self) -> AdapterResult<ClientVersion> {
        let response: RpcResponse<SessionInfo> = self
            .call(
                "session",
                "session-get",
                json!({ "fields": ["version", "rpc-version"] }),
            )
            .await?;
        if !response.is_success() {
            return Err(AdapterError::protocol(KIND, "session", response.result));
        }
        let info = response.arguments.unwrap_or(SessionInfo {
            version: None,
            rpc_version: None,
        });
        let rpc_version = info.rpc_version.unwrap_or_default();
        self.connected = Some(Connected { rpc_version });
        Ok(ClientVersion {
            version: info.version.unwrap_or_else(|| "unknown".to_string()),
            api_version: info.rpc_version.map(|value| value.to_string()),
        })
    }

    async fn list_torrents(&self) -> AdapterResult<Vec<TorrentRecord>> {
        self.connected()?;
        let response: RpcResponse<TorrentList> = self
            .call(
                "list torrents",
                "torrent-get",
                json!({ "fields": TORRENT_FIELDS }),
            )
            .await?;
        if !response.is_success() {
            return Err(AdapterError::protocol(KIND, "list torrents", response.result));
        }

        Ok(response
            .arguments
            .map(|list| list.torrents)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| match entry.into_record() {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(error = %err, "skipping Transmission torrent with invalid hash");
                    None
                }
            })
            .collect())
    }

    async fn locate_content(&self, hash: &ContentHash) -> AdapterResult<ContentLocator> {
        self.connected()?;
        let torrent = self.torrent_dir.join(format!("{hash}.torrent"));
        if Self::exists(&torrent).await? {
            return Ok(ContentLocator::TorrentFile(torrent));
        }
        let magnet = self.torrent_dir.join(format!("{hash}.magnet"));
        if Self::exists(&magnet).await? {
            return Ok(ContentLocator::MagnetFile(magnet));
        }
        Err(AdapterError::NotFound {
            hash: hash.clone(),
            directory: self.torrent_dir.clone(),
        })
    }

    async fn pause_torrent(&self, id: &TorrentId) -> AdapterResult<()> {
        self.connected()?;
        let response: RpcResponse<IgnoredAny> = self
            .call("pause", "torrent-stop", json!({ "ids": [rpc_id(id)] }))
            .await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(AdapterError::protocol(KIND, "pause", response.result))
        }
    }

    async fn add_torrent(&self, request: &AddTorrent<'_>) -> AdapterResult<bool> {
        self.connected()?;
        if request.skip_verification {
            debug!(hash = %request.content_hash, "Transmission cannot skip verification on add");
        }
        if let Some(category) = request.category {
            debug!(hash = %request.content_hash, category, "Transmission has no categories; dropping");
        }

        let mut arguments = json!({
            "download-dir": request.location,
            "paused": request.start_paused,
        });
        match Payload::load(request.locator).await? {
            Payload::Metainfo(bytes) => arguments["metainfo"] = Value::from(STANDARD.encode(bytes)),
            Payload::Magnet(link) => arguments["filename"] = Value::from(link),
        }

        let response: RpcResponse<AddResult> = self.call("add", "torrent-add", arguments).await?;
        if !response.is_success() {
            warn!(
                hash = %request.content_hash,
                result = %response.result,
                "Transmission rejected the add"
            );
            return Ok(false);
        }
        let Some(result) = response.arguments else {
            return Err(AdapterError::protocol(KIND, "add", "missing torrent-add arguments"));
        };
        if let Some(existing) = result.duplicate {
            warn!(hash = %request.content_hash, id = existing.id, "Transmission reports a duplicate torrent");
            return Ok(false);
        }
        let Some(added) = result.added else {
            return Err(AdapterError::protocol(KIND, "add", "missing torrent-added entry"));
        };

        if !request.labels.is_empty() && self.capabilities().supports_labels {
            self.apply_labels(added.id, request.labels).await;
        }
        Ok(true)
    }
}
