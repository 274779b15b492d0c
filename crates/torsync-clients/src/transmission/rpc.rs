//! Transmission JSON-RPC envelopes and argument shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use torsync_core::{
    ContentHash, InvalidContentHash, LabelSet, TagField, TorrentId, TorrentRecord,
    normalize_completion,
};

/// Header carrying the CSRF session token.
pub(crate) const SESSION_HEADER: &str = "X-Transmission-Session-Id";
/// `result` value of a successful call.
pub(crate) const RESULT_SUCCESS: &str = "success";
/// First RPC revision with torrent labels.
pub(crate) const LABELS_MIN_RPC_VERSION: u32 = 16;
/// Fields requested from `torrent-get`.
pub(crate) const TORRENT_FIELDS: [&str; 6] = [
    "id",
    "hashString",
    "name",
    "downloadDir",
    "percentDone",
    "labels",
];

#[derive(Debug, Serialize)]
pub(crate) struct RpcRequest<'a> {
    pub(crate) method: &'a str,
    pub(crate) arguments: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RpcResponse<T> {
    pub(crate) result: String,
    pub(crate) arguments: Option<T>,
}

impl<T> RpcResponse<T> {
    pub(crate) fn is_success(&self) -> bool {
        self.result == RESULT_SUCCESS
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SessionInfo {
    #[serde(default)]
    pub(crate) version: Option<String>,
    #[serde(default, rename = "rpc-version")]
    pub(crate) rpc_version: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TorrentList {
    #[serde(default)]
    pub(crate) torrents: Vec<TorrentEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TorrentEntry {
    pub(crate) id: i64,
    pub(crate) hash_string: String,
    #[serde(default)]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) download_dir: String,
    #[serde(default)]
    pub(crate) percent_done: f64,
    #[serde(default)]
    pub(crate) labels: TagField,
}

impl TorrentEntry {
    pub(crate) fn into_record(self) -> Result<TorrentRecord, InvalidContentHash> {
        let content_hash: ContentHash = self.hash_string.parse()?;
        Ok(TorrentRecord {
            id: TorrentId::new(self.id.to_string()),
            content_hash,
            name: self.name,
            location: self.download_dir,
            completion: normalize_completion(self.percent_done),
            labels: LabelSet::from(self.labels),
            category: None,
        })
    }
}

/// Reference to a torrent in `torrent-add` responses.
#[derive(Debug, Deserialize)]
pub(crate) struct AddedTorrent {
    pub(crate) id: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddResult {
    #[serde(default, rename = "torrent-added")]
    pub(crate) added: Option<AddedTorrent>,
    #[serde(default, rename = "torrent-duplicate")]
    pub(crate) duplicate: Option<AddedTorrent>,
}

/// RPC id value for a client-local identifier: numeric when it parses, else verbatim.
pub(crate) fn rpc_id(id: &TorrentId) -> Value {
    id.as_str()
        .parse::<i64>()
        .map_or_else(|_| Value::from(id.as_str()), Value::from)
}
