//! Per-item outcomes, the run report, and its text rendering.

use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{ClientKind, ContentHash, ContentLocator, MigrationTarget};

const RULE_WIDTH: usize = 60;

/// Terminal state of one planned item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MigrationOutcome {
    /// Added to the destination (or would be, in a dry run).
    Migrated {
        /// What was created.
        target: MigrationTarget,
        /// Content that was uploaded.
        locator: ContentLocator,
    },
    /// Intentionally left alone.
    Skipped {
        /// Content identifier.
        content_hash: ContentHash,
        /// Display name.
        name: String,
        /// Why the item was skipped.
        reason: String,
    },
    /// Attempted and failed; retried naturally by the next run.
    Failed {
        /// Content identifier.
        content_hash: ContentHash,
        /// Display name.
        name: String,
        /// Error description including its source chain.
        error: String,
    },
}

/// Result of one migration run. Built by the runner; read-only afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    source: ClientKind,
    destination: ClientKind,
    dry_run: bool,
    total_considered: usize,
    outcomes: Vec<MigrationOutcome>,
    interrupted: bool,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
}

impl MigrationReport {
    pub(crate) fn begin(
        source: ClientKind,
        destination: ClientKind,
        dry_run: bool,
        total_considered: usize,
    ) -> Self {
        let now = Utc::now();
        Self {
            source,
            destination,
            dry_run,
            total_considered,
            outcomes: Vec::with_capacity(total_considered),
            interrupted: false,
            started_at: now,
            finished_at: now,
        }
    }

    pub(crate) fn record(&mut self, outcome: MigrationOutcome) {
        self.outcomes.push(outcome);
    }

    pub(crate) const fn mark_interrupted(&mut self) {
        self.interrupted = true;
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }

    /// Client torrents were copied from.
    #[must_use]
    pub const fn source(&self) -> ClientKind {
        self.source
    }

    /// Client torrents were copied to.
    #[must_use]
    pub const fn destination(&self) -> ClientKind {
        self.destination
    }

    /// Whether this run only previewed the migration.
    #[must_use]
    pub const fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Number of source torrents considered.
    #[must_use]
    pub const fn total_considered(&self) -> usize {
        self.total_considered
    }

    /// Outcomes in the order they occurred.
    #[must_use]
    pub fn outcomes(&self) -> &[MigrationOutcome] {
        &self.outcomes
    }

    /// Whether an interrupt stopped the run before every item was attempted.
    #[must_use]
    pub const fn interrupted(&self) -> bool {
        self.interrupted
    }

    /// When the run started.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// When the run finished.
    #[must_use]
    pub const fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    /// Number of migrated items.
    #[must_use]
    pub fn migrated_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, MigrationOutcome::Migrated { .. }))
    }

    /// Number of skipped items.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, MigrationOutcome::Skipped { .. }))
    }

    /// Number of failed items.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, MigrationOutcome::Failed { .. }))
    }

    /// Items never attempted because the run was interrupted.
    #[must_use]
    pub const fn not_attempted(&self) -> usize {
        self.total_considered.saturating_sub(self.outcomes.len())
    }

    /// Process exit code for this run: `1` when anything failed or was cut short.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        i32::from(self.failed_count() > 0 || self.interrupted)
    }

    fn count(&self, predicate: impl Fn(&MigrationOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|outcome| predicate(outcome)).count()
    }
}

/// Render the human-readable summary for a finished run.
#[must_use]
pub fn render_report(report: &MigrationReport) -> String {
    ReportText(report).to_string()
}

struct ReportText<'a>(&'a MigrationReport);

impl Display for ReportText<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let rule = "=".repeat(RULE_WIDTH);

        writeln!(f, "\n{rule}")?;
        writeln!(
            f,
            "Migration Report: {} → {}",
            report.source(),
            report.destination()
        )?;
        writeln!(f, "{rule}\n")?;
        if report.dry_run() {
            writeln!(f, "DRY RUN - no changes were made\n")?;
        }

        writeln!(f, "Total torrents: {}", report.total_considered())?;
        let migrated_label = if report.dry_run() {
            "Would be migrated"
        } else {
            "Successfully migrated"
        };
        writeln!(f, "{migrated_label}: {}", report.migrated_count())?;
        writeln!(f, "Skipped (already exist): {}", report.skipped_count())?;
        writeln!(f, "Failed: {}", report.failed_count())?;
        if report.interrupted() {
            writeln!(f, "Not attempted (interrupted): {}", report.not_attempted())?;
        }
        writeln!(f)?;

        if report.failed_count() > 0 {
            writeln!(f, "Failed torrents:")?;
            for outcome in report.outcomes() {
                if let MigrationOutcome::Failed {
                    content_hash,
                    name,
                    error,
                } = outcome
                {
                    writeln!(f, "  - {name} ({content_hash})")?;
                    writeln!(f, "    Error: {error}")?;
                }
            }
            writeln!(f)?;
        }

        let migrated = report.migrated_count();
        if migrated > 0 {
            writeln!(f, "Migration completed successfully for {migrated} torrents.")?;
        } else {
            writeln!(f, "No torrents were migrated.")?;
        }
        writeln!(f, "{rule}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LabelSet, TorrentId};
    use std::path::PathBuf;

    fn hash(ch: char) -> ContentHash {
        ch.to_string().repeat(40).parse().expect("valid hash")
    }

    fn migrated(ch: char, name: &str) -> MigrationOutcome {
        MigrationOutcome::Migrated {
            target: MigrationTarget {
                content_hash: hash(ch),
                source_id: TorrentId::new("1"),
                name: name.to_string(),
                location: "/data".to_string(),
                labels: LabelSet::new(),
                category: None,
                is_complete: true,
                start_paused: true,
            },
            locator: ContentLocator::TorrentFile(PathBuf::from("/tmp/a.torrent")),
        }
    }

    fn sample_report() -> MigrationReport {
        let mut report =
            MigrationReport::begin(ClientKind::Transmission, ClientKind::Qbittorrent, false, 3);
        report.record(migrated('a', "Alpha"));
        report.record(MigrationOutcome::Skipped {
            content_hash: hash('b'),
            name: "Beta".to_string(),
            reason: "Already exists".to_string(),
        });
        report.record(MigrationOutcome::Failed {
            content_hash: hash('c'),
            name: "Gamma".to_string(),
            error: "add rejected".to_string(),
        });
        report.finish()
    }

    #[test]
    fn counts_sum_to_total() {
        let report = sample_report();
        assert_eq!(report.migrated_count(), 1);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(
            report.migrated_count() + report.skipped_count() + report.failed_count(),
            report.total_considered()
        );
        assert_eq!(report.not_attempted(), 0);
        assert_eq!(report.exit_code(), 1);
        assert!(report.finished_at() >= report.started_at());
    }

    #[test]
    fn render_lists_failures_in_order() {
        let text = render_report(&sample_report());
        assert!(text.contains("Migration Report: Transmission → qBittorrent"));
        assert!(text.contains("Total torrents: 3"));
        assert!(text.contains("Successfully migrated: 1"));
        assert!(text.contains("Skipped (already exist): 1"));
        assert!(text.contains("Failed: 1"));
        assert!(text.contains(&format!("  - Gamma ({})", hash('c'))));
        assert!(text.contains("    Error: add rejected"));
        assert!(text.contains("Migration completed successfully for 1 torrents."));
    }

    #[test]
    fn render_frames_the_summary_with_rules() {
        let report =
            MigrationReport::begin(ClientKind::Qbittorrent, ClientKind::Transmission, true, 0)
                .finish();
        let rule = "=".repeat(RULE_WIDTH);
        let rendered = render_report(&report);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(
            lines,
            vec![
                "",
                rule.as_str(),
                "Migration Report: qBittorrent → Transmission",
                rule.as_str(),
                "",
                "DRY RUN - no changes were made",
                "",
                "Total torrents: 0",
                "Would be migrated: 0",
                "Skipped (already exist): 0",
                "Failed: 0",
                "",
                "No torrents were migrated.",
                rule.as_str(),
            ]
        );
    }

    #[test]
    fn empty_run_succeeds_with_no_migrations() {
        let report =
            MigrationReport::begin(ClientKind::Qbittorrent, ClientKind::Transmission, true, 0)
                .finish();
        assert_eq!(report.exit_code(), 0);
        let text = render_report(&report);
        assert!(text.contains("qBittorrent → Transmission"));
        assert!(text.contains("DRY RUN"));
        assert!(text.contains("No torrents were migrated."));
        assert!(!text.contains("Failed torrents:"));
    }

    #[test]
    fn interrupted_run_reports_remaining_items() {
        let mut report =
            MigrationReport::begin(ClientKind::Transmission, ClientKind::Qbittorrent, false, 4);
        report.record(migrated('a', "Alpha"));
        report.mark_interrupted();
        let report = report.finish();
        assert_eq!(report.not_attempted(), 3);
        assert_eq!(report.exit_code(), 1);
        assert!(render_report(&report).contains("Not attempted (interrupted): 3"));
    }
}
