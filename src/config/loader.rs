//! Event snapshot loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::certificates::TlsError;
use crate::config::schema::EventSnapshot;

/// Error type for snapshot loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid certificate material in {path}: {source}")]
    Certificate {
        path: PathBuf,
        #[source]
        source: TlsError,
    },
}

/// Load an event snapshot from a TOML file.
pub fn load_snapshot(path: &Path) -> Result<EventSnapshot, ConfigError> {
    let content = read_to_string(path)?;
    parse_snapshot(&content)
}

pub fn parse_snapshot(content: &str) -> Result<EventSnapshot, ConfigError> {
    Ok(toml::from_str(content)?)
}

pub(crate) fn read_to_string(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
