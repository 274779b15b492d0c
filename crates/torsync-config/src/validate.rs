//! Validation helpers run before and after deserialisation.

use std::time::Duration;

use serde_json::Value;

use crate::error::{ConfigError, ConfigResult};
use crate::model::MigrationConfig;

const QBITTORRENT_REQUIRED: [&str; 4] = ["host", "port", "username", "password"];
const TRANSMISSION_REQUIRED: [&str; 5] = ["protocol", "host", "port", "path", "torrent_dir"];

/// Reject documents missing any required connection field.
pub(crate) fn require_fields(document: &Value) -> ConfigResult<()> {
    require_section(document, "qbittorrent", &QBITTORRENT_REQUIRED)?;
    require_section(document, "transmission", &TRANSMISSION_REQUIRED)
}

fn require_section(
    document: &Value,
    section: &'static str,
    fields: &[&'static str],
) -> ConfigResult<()> {
    let block = document.get(section);
    for &field in fields {
        if block.and_then(|value| value.get(field)).is_none() {
            return Err(ConfigError::MissingField { section, field });
        }
    }
    Ok(())
}

/// Check port ranges on the raw document so the error names the field.
pub(crate) fn validate_ports(document: &Value) -> ConfigResult<()> {
    for section in ["qbittorrent", "transmission"] {
        if let Some(value) = document.get(section).and_then(|block| block.get("port")) {
            parse_port(value, section)?;
        }
    }
    Ok(())
}

/// Check the inter-item delay on the raw document; it must fit a [`Duration`].
pub(crate) fn validate_rate_limit(document: &Value) -> ConfigResult<()> {
    let Some(value) = document
        .get("migration")
        .and_then(|block| block.get("rate_limit_sleep"))
    else {
        return Ok(());
    };
    let invalid = || {
        ConfigError::invalid(
            "migration",
            "rate_limit_sleep",
            Some(value.to_string()),
            "must be a non-negative number of seconds within range",
        )
    };
    let seconds = value.as_f64().ok_or_else(invalid)?;
    Duration::try_from_secs_f64(seconds).map_err(|_| invalid())?;
    Ok(())
}

fn parse_port(value: &Value, section: &'static str) -> ConfigResult<u16> {
    let port = value.as_i64().ok_or_else(|| {
        ConfigError::invalid(
            section,
            "port",
            Some(value.to_string()),
            "must be an integer",
        )
    })?;

    if !(1..=65_535).contains(&port) {
        return Err(ConfigError::invalid(
            section,
            "port",
            Some(port.to_string()),
            "must be between 1 and 65535",
        ));
    }

    u16::try_from(port).map_err(|_| {
        ConfigError::invalid(section, "port", Some(port.to_string()), "must fit in 16 bits")
    })
}

/// Semantic checks on the typed document.
pub(crate) fn validate_config(config: &MigrationConfig) -> ConfigResult<()> {
    if config.qbittorrent.host.trim().is_empty() {
        return Err(ConfigError::invalid(
            "qbittorrent",
            "host",
            None,
            "must not be empty",
        ));
    }
    config.qbittorrent.base_url()?;

    let transmission = &config.transmission;
    if transmission.host.trim().is_empty() {
        return Err(ConfigError::invalid(
            "transmission",
            "host",
            None,
            "must not be empty",
        ));
    }
    if !transmission.path.starts_with('/') {
        return Err(ConfigError::invalid(
            "transmission",
            "path",
            Some(transmission.path.clone()),
            "must start with '/'",
        ));
    }
    if transmission.torrent_dir.as_os_str().is_empty() {
        return Err(ConfigError::invalid(
            "transmission",
            "torrent_dir",
            None,
            "must not be empty",
        ));
    }
    transmission.rpc_url()?;

    for (section, timeout) in [
        ("qbittorrent", config.qbittorrent.timeout_secs),
        ("transmission", transmission.timeout_secs),
    ] {
        if timeout == 0 {
            return Err(ConfigError::invalid(
                section,
                "timeout_secs",
                Some(timeout.to_string()),
                "must be at least one second",
            ));
        }
    }

    Ok(())
}
