//! Typed configuration blocks for both daemons and the migration behaviour.

use std::fmt::{self, Debug, Formatter};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use crate::defaults;
use crate::error::{ConfigError, ConfigResult};

/// URL scheme used to reach a daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Plain HTTP.
    #[default]
    Http,
    /// HTTP over TLS.
    Https,
}

impl Protocol {
    /// Scheme string for URL construction.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

/// Credential string that never appears in debug output.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wrap a plaintext secret.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Plaintext value, for handing to an HTTP client.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the secret is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Debug for Secret {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("Secret(**redacted**)")
    }
}

/// Connection parameters for the qBittorrent WebUI.
#[derive(Debug, Clone, Deserialize)]
pub struct QbittorrentConfig {
    /// Scheme used when `host` carries none.
    #[serde(default)]
    pub protocol: Protocol,
    /// Hostname, optionally with a scheme prefix.
    pub host: String,
    /// WebUI port.
    pub port: u16,
    /// WebUI username.
    pub username: String,
    /// WebUI password.
    pub password: Secret,
    /// Per-request timeout in seconds.
    #[serde(default = "defaults::request_timeout_secs")]
    pub timeout_secs: u64,
}

impl QbittorrentConfig {
    /// Base URL of the WebUI, e.g. `http://localhost:8080/`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when the host cannot form a URL.
    pub fn base_url(&self) -> ConfigResult<Url> {
        let host = self.host.trim().trim_end_matches('/');
        let raw = if host.contains("://") {
            format!("{host}:{}/", self.port)
        } else {
            format!("{}://{host}:{}/", self.protocol.as_str(), self.port)
        };
        Url::parse(&raw).map_err(|_| {
            ConfigError::invalid(
                "qbittorrent",
                "host",
                Some(self.host.clone()),
                "must form a valid URL",
            )
        })
    }

    /// Request timeout as a duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Connection parameters for the Transmission RPC endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TransmissionConfig {
    /// RPC scheme.
    pub protocol: Protocol,
    /// RPC host.
    pub host: String,
    /// RPC port.
    pub port: u16,
    /// RPC path, e.g. `/transmission/rpc`.
    pub path: String,
    /// Optional RPC username; empty means no authentication.
    #[serde(default)]
    pub username: Option<String>,
    /// Optional RPC password.
    #[serde(default)]
    pub password: Option<Secret>,
    /// Directory holding `<hash>.torrent` / `<hash>.magnet` files; `~` is expanded at load.
    pub torrent_dir: PathBuf,
    /// Per-request timeout in seconds.
    #[serde(default = "defaults::request_timeout_secs")]
    pub timeout_secs: u64,
}

impl TransmissionConfig {
    /// Full RPC endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] when the parts cannot form a URL.
    pub fn rpc_url(&self) -> ConfigResult<Url> {
        let raw = format!(
            "{}://{}:{}{}",
            self.protocol.as_str(),
            self.host.trim(),
            self.port,
            self.path
        );
        Url::parse(&raw).map_err(|_| {
            ConfigError::invalid(
                "transmission",
                "host",
                Some(self.host.clone()),
                "must form a valid URL",
            )
        })
    }

    /// Username/password pair when both are configured and non-empty.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let username = self.username.as_deref().filter(|value| !value.is_empty())?;
        let password = self.password.as_ref().map_or("", Secret::expose);
        Some((username, password))
    }

    /// Request timeout as a duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Behaviour switches for the migration run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MigrationBehavior {
    /// Ask the destination to skip hash verification for complete torrents.
    #[serde(default = "defaults::enabled")]
    pub skip_checking_complete: bool,
    /// Pause each source torrent before copying it.
    #[serde(default = "defaults::enabled")]
    pub pause_source: bool,
    /// Reserved; parsed but not acted upon.
    #[serde(default)]
    pub resume_destination: bool,
    /// Wait after each successful add, given in seconds in the document.
    #[serde(
        default = "defaults::rate_limit_sleep",
        deserialize_with = "seconds_to_duration"
    )]
    pub rate_limit_sleep: Duration,
}

impl Default for MigrationBehavior {
    fn default() -> Self {
        Self {
            skip_checking_complete: defaults::enabled(),
            pause_source: defaults::enabled(),
            resume_destination: false,
            rate_limit_sleep: defaults::rate_limit_sleep(),
        }
    }
}

impl MigrationBehavior {
    /// Inter-item delay applied by the runner.
    #[must_use]
    pub const fn rate_limit_delay(&self) -> Duration {
        self.rate_limit_sleep
    }
}

fn seconds_to_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let seconds = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(seconds).map_err(serde::de::Error::custom)
}

/// Full configuration document.
#[derive(Debug, Clone, Deserialize)]
pub struct MigrationConfig {
    /// qBittorrent connection block.
    pub qbittorrent: QbittorrentConfig,
    /// Transmission connection block.
    pub transmission: TransmissionConfig,
    /// Migration behaviour block.
    #[serde(default)]
    pub migration: MigrationBehavior,
}
