//! Sequential execution of a sync plan against two connected adapters.
//!
//! # Design
//! - Items run strictly one after another; a fixed sleep after each successful add is the
//!   only backpressure.
//! - Every fault raised while handling an item becomes a `Failed` outcome; only planning
//!   failures abort the run.
//! - An interrupt is observed between items; completed adds are never rolled back.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::adapter::{AddTorrent, ClientAdapter, ContentAccess};
use crate::error::{AdapterResult, MigrateResult, describe_error};
use crate::model::{ContentHash, ContentLocator, LabelSet, MigrationTarget};
use crate::plan::{PlanEntry, ReconciliationEngine, SyncPlan};
use crate::report::{MigrationOutcome, MigrationReport};

const MAX_NAME_DISPLAY: usize = 50;

/// Behaviour switches for a run, resolved from configuration and CLI flags.
#[derive(Debug, Clone)]
pub struct MigrationSettings {
    /// Preview only: no pause, no add, no sleep.
    pub dry_run: bool,
    /// Pause each source torrent before it is copied.
    pub pause_source: bool,
    /// Ask the destination to skip hash verification for complete torrents.
    pub skip_checking_complete: bool,
    /// Delay after each successful add.
    pub rate_limit_sleep: Duration,
    /// Directory exported `.torrent` files are written to.
    pub scratch_dir: PathBuf,
}

enum ItemResult {
    Migrated(ContentLocator),
    Rejected,
}

/// Drives reconciliation and then executes the plan item by item.
pub struct MigrationRunner<'a> {
    source: &'a dyn ClientAdapter,
    destination: &'a dyn ClientAdapter,
    settings: MigrationSettings,
    shutdown: Option<watch::Receiver<bool>>,
}

impl<'a> MigrationRunner<'a> {
    /// Build a runner over two connected adapters.
    #[must_use]
    pub fn new(
        source: &'a dyn ClientAdapter,
        destination: &'a dyn ClientAdapter,
        settings: MigrationSettings,
    ) -> Self {
        Self {
            source,
            destination,
            settings,
            shutdown: None,
        }
    }

    /// Stop before the next item once the receiver observes `true`.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Reconcile and execute in one call.
    ///
    /// # Errors
    ///
    /// Returns an error only when a listing cannot be fetched; per-item faults are captured
    /// in the report.
    pub async fn run(&self) -> MigrateResult<MigrationReport> {
        let plan = ReconciliationEngine::new(self.source, self.destination)
            .plan()
            .await?;
        Ok(self.execute(plan).await)
    }

    /// Execute a previously computed plan.
    pub async fn execute(&self, plan: SyncPlan) -> MigrationReport {
        let total = plan.total_considered();
        let mut report = MigrationReport::begin(
            self.source.kind(),
            self.destination.kind(),
            self.settings.dry_run,
            total,
        );

        if self.settings.dry_run {
            info!("dry run: no changes will be made");
        }

        let carry_labels = self.destination.capabilities().supports_labels;
        if !carry_labels {
            warn!(
                client = %self.destination.kind(),
                "destination does not support labels; labels will not be copied"
            );
        }

        for (index, entry) in plan.into_entries().into_iter().enumerate() {
            if self.shutdown_requested() {
                warn!(
                    remaining = total - index,
                    "interrupt received; abandoning remaining items"
                );
                report.mark_interrupted();
                break;
            }

            info!("{}", progress_line(index + 1, total, entry.name()));
            let outcome = match entry {
                PlanEntry::Skip {
                    content_hash,
                    name,
                    reason,
                } => {
                    info!(hash = %content_hash, %reason, "skipping");
                    MigrationOutcome::Skipped {
                        content_hash,
                        name,
                        reason,
                    }
                }
                PlanEntry::Migrate(target) => self.process(target, carry_labels).await,
            };
            report.record(outcome);
        }

        report.finish()
    }

    async fn process(&self, target: MigrationTarget, carry_labels: bool) -> MigrationOutcome {
        match self.migrate_one(&target, carry_labels).await {
            Ok(ItemResult::Migrated(locator)) => MigrationOutcome::Migrated { target, locator },
            Ok(ItemResult::Rejected) => {
                let error = format!("Failed to add to {}", self.destination.kind());
                warn!(hash = %target.content_hash, %error, "add rejected");
                MigrationOutcome::Failed {
                    content_hash: target.content_hash,
                    name: target.name,
                    error,
                }
            }
            Err(err) => {
                let error = describe_error(&err);
                warn!(hash = %target.content_hash, %error, "migration failed");
                MigrationOutcome::Failed {
                    content_hash: target.content_hash,
                    name: target.name,
                    error,
                }
            }
        }
    }

    async fn migrate_one(
        &self,
        target: &MigrationTarget,
        carry_labels: bool,
    ) -> AdapterResult<ItemResult> {
        let dry_run = self.settings.dry_run;

        if !dry_run && self.settings.pause_source {
            match self.source.pause_torrent(&target.source_id).await {
                Ok(()) => debug!(client = %self.source.kind(), id = %target.source_id, "paused source torrent"),
                Err(err) => warn!(
                    client = %self.source.kind(),
                    id = %target.source_id,
                    error = %describe_error(&err),
                    "failed to pause source torrent; continuing"
                ),
            }
        }

        let locator = self.resolve_locator(&target.content_hash).await?;
        info!(
            path = %target.location,
            complete = target.is_complete,
            labels = %target.labels.to_delimited(),
            "mapped metadata"
        );

        if dry_run {
            info!(client = %self.destination.kind(), "would be added");
            return Ok(ItemResult::Migrated(locator));
        }

        let no_labels = LabelSet::new();
        let request = AddTorrent {
            content_hash: &target.content_hash,
            name: &target.name,
            locator: &locator,
            location: &target.location,
            labels: if carry_labels {
                &target.labels
            } else {
                &no_labels
            },
            category: target.category.as_deref(),
            skip_verification: target.is_complete && self.settings.skip_checking_complete,
            start_paused: target.start_paused,
        };

        if !self.destination.add_torrent(&request).await? {
            return Ok(ItemResult::Rejected);
        }

        info!(client = %self.destination.kind(), hash = %target.content_hash, "added");
        if !self.settings.rate_limit_sleep.is_zero() {
            tokio::time::sleep(self.settings.rate_limit_sleep).await;
        }
        Ok(ItemResult::Migrated(locator))
    }

    async fn resolve_locator(&self, hash: &ContentHash) -> AdapterResult<ContentLocator> {
        match self.source.capabilities().content_access {
            ContentAccess::Stored => self.source.locate_content(hash).await,
            ContentAccess::Export if self.settings.dry_run => Ok(ContentLocator::TorrentFile(
                self.settings.scratch_dir.join(format!("{hash}.torrent")),
            )),
            ContentAccess::Export => self
                .source
                .export_content(hash, &self.settings.scratch_dir)
                .await
                .map(ContentLocator::TorrentFile),
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(|shutdown| *shutdown.borrow())
    }
}

fn progress_line(current: usize, total: usize, name: &str) -> String {
    let display = if name.chars().count() > MAX_NAME_DISPLAY {
        let truncated: String = name.chars().take(MAX_NAME_DISPLAY - 3).collect();
        format!("{truncated}...")
    } else {
        name.to_string()
    };
    #[allow(clippy::cast_precision_loss)]
    let percent = if total == 0 {
        0.0
    } else {
        current as f64 / total as f64 * 100.0
    };
    format!("[{current}/{total}] ({percent:.1}%) {display}")
}
