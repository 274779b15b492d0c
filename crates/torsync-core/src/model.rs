//! Client-agnostic torrent records and identifiers.

use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::error::InvalidContentHash;

const CONTENT_HASH_LEN: usize = 40;

/// Which daemon implementation an adapter talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientKind {
    /// Transmission daemon over JSON-RPC.
    Transmission,
    /// qBittorrent over the WebUI API.
    Qbittorrent,
}

impl ClientKind {
    /// Human-readable product name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Transmission => "Transmission",
            Self::Qbittorrent => "qBittorrent",
        }
    }
}

impl Display for ClientKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.display_name())
    }
}

/// Infohash identifying torrent content across clients.
///
/// Always stored lowercase so that hashes reported by different daemons compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Borrow the lowercase hex representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ContentHash {
    type Err = InvalidContentHash;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.len() != CONTENT_HASH_LEN || !trimmed.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(InvalidContentHash {
                value: value.to_string(),
            });
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }
}

impl Display for ContentHash {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Client-local torrent identifier (Transmission numeric id, qBittorrent hash).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TorrentId(String);

impl TorrentId {
    /// Wrap a client-local identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TorrentId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Ordered set of free-form classification strings ("tags" or "labels").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LabelSet(BTreeSet<String>);

impl LabelSet {
    /// Empty label set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Split a comma-delimited tag string, trimming whitespace and dropping empty parts.
    #[must_use]
    pub fn from_delimited(value: &str) -> Self {
        value.split(',').collect()
    }

    /// Join the labels back into a comma-delimited string.
    #[must_use]
    pub fn to_delimited(&self) -> String {
        self.0.iter().map(String::as_str).collect::<Vec<_>>().join(",")
    }

    /// Whether no labels are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set contains the given label.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.0.contains(label)
    }

    /// Iterate labels in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for LabelSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|label| label.as_ref().trim().to_string())
                .filter(|label| !label.is_empty())
                .collect(),
        )
    }
}

/// Snapshot of one torrent as reported by a daemon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TorrentRecord {
    /// Client-local identifier used for pause calls.
    pub id: TorrentId,
    /// Cross-client content identifier.
    pub content_hash: ContentHash,
    /// Display name.
    pub name: String,
    /// Directory the daemon stores the payload in.
    pub location: String,
    /// Completion fraction in `0.0..=1.0`.
    pub completion: f64,
    /// Tags or labels attached to the torrent.
    pub labels: LabelSet,
    /// Richer single-valued classification, where the client has one.
    pub category: Option<String>,
}

/// Where the transferable torrent content for a hash lives on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum ContentLocator {
    /// A bencoded `.torrent` metainfo file.
    TorrentFile(PathBuf),
    /// A text file holding a magnet link.
    MagnetFile(PathBuf),
}

impl ContentLocator {
    /// Path of the underlying file.
    #[must_use]
    pub const fn path(&self) -> &PathBuf {
        match self {
            Self::TorrentFile(path) | Self::MagnetFile(path) => path,
        }
    }
}

/// What to create on the destination for one source torrent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationTarget {
    /// Content identifier shared by both clients.
    pub content_hash: ContentHash,
    /// Source-local identifier, used to pause the original.
    pub source_id: TorrentId,
    /// Display name carried for reporting.
    pub name: String,
    /// Save directory on the destination.
    pub location: String,
    /// Labels to attach on the destination.
    pub labels: LabelSet,
    /// Category to attach where the destination supports one.
    pub category: Option<String>,
    /// Whether the source reported the payload fully downloaded.
    pub is_complete: bool,
    /// Destination torrents are always created paused.
    pub start_paused: bool,
}
