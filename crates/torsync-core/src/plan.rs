//! One-directional reconciliation of a source listing against a destination listing.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::adapter::ClientAdapter;
use crate::error::{MigrateError, MigrateResult};
use crate::mapper::map_to_target;
use crate::model::{ContentHash, MigrationTarget, TorrentRecord};

/// Reason recorded for torrents the destination already tracks.
pub const ALREADY_EXISTS: &str = "Already exists";

/// A single step of the sync plan, in source listing order.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanEntry {
    /// Create this torrent on the destination.
    Migrate(MigrationTarget),
    /// Leave this torrent alone.
    Skip {
        /// Content identifier of the skipped torrent.
        content_hash: ContentHash,
        /// Display name of the skipped torrent.
        name: String,
        /// Why it was skipped.
        reason: String,
    },
}

impl PlanEntry {
    /// Content identifier regardless of variant.
    #[must_use]
    pub const fn content_hash(&self) -> &ContentHash {
        match self {
            Self::Migrate(target) => &target.content_hash,
            Self::Skip { content_hash, .. } => content_hash,
        }
    }

    /// Display name regardless of variant.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Migrate(target) => &target.name,
            Self::Skip { name, .. } => name,
        }
    }
}

/// Ordered plan produced by [`reconcile`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncPlan {
    entries: Vec<PlanEntry>,
}

impl SyncPlan {
    /// Plan entries in source listing order.
    #[must_use]
    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    /// Number of source torrents considered.
    #[must_use]
    pub fn total_considered(&self) -> usize {
        self.entries.len()
    }

    /// Number of entries that will be migrated.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry, PlanEntry::Migrate(_)))
            .count()
    }

    /// Consume the plan, yielding its entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<PlanEntry> {
        self.entries
    }
}

/// Compute the plan for copying `source` into a destination holding `destination`.
///
/// Source order is preserved and nothing is sorted, so identical snapshots always produce
/// identical plans.
#[must_use]
pub fn reconcile(source: &[TorrentRecord], destination: &[TorrentRecord]) -> SyncPlan {
    let existing: HashSet<&ContentHash> = destination
        .iter()
        .map(|record| &record.content_hash)
        .collect();

    let entries = source
        .iter()
        .map(|record| {
            if existing.contains(&record.content_hash) {
                PlanEntry::Skip {
                    content_hash: record.content_hash.clone(),
                    name: record.name.clone(),
                    reason: ALREADY_EXISTS.to_string(),
                }
            } else {
                PlanEntry::Migrate(map_to_target(record))
            }
        })
        .collect();

    SyncPlan { entries }
}

/// Fetches both listings and reconciles them.
pub struct ReconciliationEngine<'a> {
    source: &'a dyn ClientAdapter,
    destination: &'a dyn ClientAdapter,
}

impl<'a> ReconciliationEngine<'a> {
    /// Build an engine over connected adapters.
    #[must_use]
    pub fn new(source: &'a dyn ClientAdapter, destination: &'a dyn ClientAdapter) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Fetch the source listing, then the destination listing, and reconcile them.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Listing`] when either daemon cannot be listed.
    pub async fn plan(&self) -> MigrateResult<SyncPlan> {
        let source_kind = self.source.kind();
        let destination_kind = self.destination.kind();

        info!(client = %source_kind, "fetching source torrents");
        let source = self
            .source
            .list_torrents()
            .await
            .map_err(|source| MigrateError::Listing {
                client: source_kind,
                source,
            })?;
        info!(client = %source_kind, count = source.len(), "source listing fetched");

        let destination =
            self.destination
                .list_torrents()
                .await
                .map_err(|source| MigrateError::Listing {
                    client: destination_kind,
                    source,
                })?;
        debug!(
            client = %destination_kind,
            count = destination.len(),
            "destination listing fetched"
        );

        let plan = reconcile(&source, &destination);
        info!(
            total = plan.total_considered(),
            pending = plan.pending(),
            "sync plan computed"
        );
        Ok(plan)
    }
}
