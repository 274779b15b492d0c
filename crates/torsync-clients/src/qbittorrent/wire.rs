//! WebUI payload shapes and the multipart field set for `torrents/add`.

use serde::Deserialize;
use torsync_core::{
    AddTorrent, ContentHash, InvalidContentHash, LabelSet, TagField, TorrentId, TorrentRecord,
    normalize_completion,
};

/// One entry of `GET /api/v2/torrents/info`.
#[derive(Debug, Deserialize)]
pub(crate) struct TorrentInfo {
    pub(crate) hash: String,
    #[serde(default)]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) save_path: String,
    #[serde(default)]
    pub(crate) progress: f64,
    #[serde(default)]
    pub(crate) tags: TagField,
    #[serde(default)]
    pub(crate) category: Option<String>,
}

impl TorrentInfo {
    pub(crate) fn into_record(self) -> Result<TorrentRecord, InvalidContentHash> {
        let content_hash: ContentHash = self.hash.parse()?;
        Ok(TorrentRecord {
            id: TorrentId::new(self.hash),
            content_hash,
            name: self.name,
            location: self.save_path,
            completion: normalize_completion(self.progress),
            labels: LabelSet::from(self.tags),
            category: self.category.filter(|value| !value.is_empty()),
        })
    }
}

/// Text fields of the `torrents/add` form, excluding the content part.
///
/// Both `paused` (v4) and `stopped` (v5) are sent so either API generation honours the
/// request.
pub(crate) fn add_form_fields(
    request: &AddTorrent<'_>,
    include_labels: bool,
) -> Vec<(&'static str, String)> {
    let flag = |value: bool| if value { "true" } else { "false" }.to_string();
    let mut fields = vec![
        ("savepath", request.location.to_string()),
        ("paused", flag(request.start_paused)),
        ("stopped", flag(request.start_paused)),
        ("skip_checking", flag(request.skip_verification)),
    ];
    if include_labels && !request.labels.is_empty() {
        fields.push(("tags", request.labels.to_delimited()));
    }
    if let Some(category) = request.category.filter(|value| !value.is_empty()) {
        fields.push(("category", category.to_string()));
    }
    fields
}
