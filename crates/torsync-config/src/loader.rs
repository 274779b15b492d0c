//! Reads the JSON configuration document from disk.
//!
//! # Design
//! - Required-field, port, and delay checks run on the raw JSON so errors name the exact field.
//! - Defaults come from serde; `~` in `torrent_dir` is expanded once here.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::model::MigrationConfig;
use crate::validate::{require_fields, validate_config, validate_ports, validate_rate_limit};

/// Load and validate the configuration file at `path`.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file is missing, unreadable, malformed, or fails
/// validation.
pub fn load_config(path: &Path) -> ConfigResult<MigrationConfig> {
    let contents = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    let config = parse_config(&contents, path)?;
    debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

/// Parse and validate a configuration document already read into memory.
///
/// `origin` is only used to label errors.
///
/// # Errors
///
/// Returns [`ConfigError`] when the document is malformed or fails validation.
pub fn parse_config(contents: &str, origin: &Path) -> ConfigResult<MigrationConfig> {
    let parse_error = |source| ConfigError::Parse {
        path: origin.to_path_buf(),
        source,
    };

    let document: Value = serde_json::from_str(contents).map_err(parse_error)?;
    require_fields(&document)?;
    validate_ports(&document)?;
    validate_rate_limit(&document)?;

    let mut config: MigrationConfig = serde_json::from_value(document).map_err(parse_error)?;
    config.transmission.torrent_dir =
        expand_home(&config.transmission.torrent_dir, env::var_os("HOME").map(PathBuf::from));
    validate_config(&config)?;
    Ok(config)
}

fn expand_home(path: &Path, home: Option<PathBuf>) -> PathBuf {
    let Some(home) = home else {
        return path.to_path_buf();
    };
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}
