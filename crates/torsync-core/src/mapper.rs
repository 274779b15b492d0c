//! Pure translation between client metadata vocabularies.

use serde::Deserialize;

use crate::model::{LabelSet, MigrationTarget, TorrentRecord};

/// Completion fraction at which a torrent counts as fully downloaded.
const COMPLETE_THRESHOLD: f64 = 1.0;

/// Tag-like field as delivered on the wire: either one delimited string
/// (qBittorrent `tags`) or a native list (Transmission `labels`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TagField {
    /// Comma-delimited string.
    Delimited(String),
    /// Native list of labels.
    List(Vec<String>),
}

impl Default for TagField {
    fn default() -> Self {
        Self::List(Vec::new())
    }
}

impl From<TagField> for LabelSet {
    fn from(field: TagField) -> Self {
        match field {
            TagField::Delimited(value) => Self::from_delimited(&value),
            TagField::List(values) => values.into_iter().collect(),
        }
    }
}

/// Clamp a reported progress value into `0.0..=1.0`; `NaN` becomes `0.0`.
#[must_use]
pub fn normalize_completion(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Whether a completion fraction means the payload is fully on disk.
#[must_use]
pub fn is_complete(completion: f64) -> bool {
    completion >= COMPLETE_THRESHOLD
}

/// Derive the destination-side target for a source record.
///
/// Location and labels are carried verbatim; nothing absent from the record is invented.
#[must_use]
pub fn map_to_target(record: &TorrentRecord) -> MigrationTarget {
    MigrationTarget {
        content_hash: record.content_hash.clone(),
        source_id: record.id.clone(),
        name: record.name.clone(),
        location: record.location.clone(),
        labels: record.labels.clone(),
        category: record.category.clone().filter(|value| !value.is_empty()),
        is_complete: is_complete(record.completion),
        start_paused: true,
    }
}
