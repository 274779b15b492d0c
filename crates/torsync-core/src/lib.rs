#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Client-agnostic torrent migration: domain model, adapter contract, and the
//! reconcile → execute → report pipeline.
//!
//! Layout: `model.rs` (records and identifiers), `adapter.rs` (`ClientAdapter`),
//! `mapper.rs` (metadata translation), `plan.rs` (reconciliation), `runner.rs`
//! (sequential execution), `report.rs` (outcomes and rendering).

pub mod adapter;
pub mod error;
pub mod mapper;
pub mod model;
pub mod plan;
pub mod report;
pub mod runner;

pub use adapter::{AddTorrent, Capabilities, ClientAdapter, ClientVersion, ContentAccess};
pub use error::{
    AdapterError, AdapterResult, InvalidContentHash, MigrateError, MigrateResult, describe_error,
};
pub use mapper::{TagField, is_complete, map_to_target, normalize_completion};
pub use model::{
    ClientKind, ContentHash, ContentLocator, LabelSet, MigrationTarget, TorrentId, TorrentRecord,
};
pub use plan::{PlanEntry, ReconciliationEngine, SyncPlan, reconcile};
pub use report::{MigrationOutcome, MigrationReport, render_report};
pub use runner::{MigrationRunner, MigrationSettings};
