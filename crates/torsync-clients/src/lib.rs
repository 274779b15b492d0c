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

//! `ClientAdapter` implementations for the qBittorrent WebUI API v2 and the
//! Transmission JSON-RPC endpoint.

mod content;
pub mod qbittorrent;
pub mod transmission;

pub use qbittorrent::QbittorrentAdapter;
pub use transmission::TransmissionAdapter;
