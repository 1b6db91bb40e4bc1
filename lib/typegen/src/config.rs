//! Run configuration, deserialized from a JSON file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::schema::SchemaSource;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Where the schema comes from.
    pub schema: SchemaSource,
    /// Directories scanned recursively for `.graphql` documents.
    pub documents: Vec<PathBuf>,
    /// Validate every operation against the schema before resolving.
    #[serde(default)]
    pub validation: bool,
    #[serde(default)]
    pub persisted_operations: PersistedOperationsMode,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistedOperationsMode {
    #[default]
    Disabled,
    /// Operations are registered with the server ahead of time; a manifest of
    /// hash → operation text is written next to the generated output.
    Registered { manifest_path: PathBuf },
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }
}
