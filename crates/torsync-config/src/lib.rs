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

//! File-backed configuration for the migration tool.
//!
//! Layout: `model.rs` (typed connection and behaviour blocks), `defaults.rs` (default
//! values applied once at load), `validate.rs` (required-field and range checks),
//! `loader.rs` (read, validate, and deserialise the JSON document).

mod defaults;
pub mod error;
pub mod loader;
pub mod model;
mod validate;

pub use defaults::DEFAULT_CONFIG_PATH;
pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, parse_config};
pub use model::{
    MigrationBehavior, MigrationConfig, Protocol, QbittorrentConfig, Secret, TransmissionConfig,
};
