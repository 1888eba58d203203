//! Archiver configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ArchiveError;
use crate::schema::SchemaVersion;

/// Default destination, relative to the node's working directory.
pub const DEFAULT_ARCHIVE_PATH: &str = "archive.log";

/// Configuration for a [`BlockArchiver`](crate::BlockArchiver).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Destination file. Its directory must already exist.
    pub path: PathBuf,
    /// Line layout to write.
    pub schema_version: SchemaVersion,
    /// Emit a one-line `info` summary per archived block.
    pub console_summary: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_ARCHIVE_PATH),
            schema_version: SchemaVersion::CURRENT,
            console_summary: true,
        }
    }
}

impl ArchiveConfig {
    /// Default configuration writing to `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn schema_version(mut self, version: SchemaVersion) -> Self {
        self.schema_version = version;
        self
    }

    pub fn console_summary(mut self, enabled: bool) -> Self {
        self.console_summary = enabled;
        self
    }

    /// Load a JSON config file. Missing keys take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the destination names a file.
    pub fn validate(&self) -> Result<(), ArchiveError> {
        if self.path.as_os_str().is_empty() {
            return Err(ArchiveError::Config("archive path is empty".into()));
        }
        if self.path.file_name().is_none() {
            return Err(ArchiveError::Config(format!(
                "archive path '{}' does not name a file",
                self.path.display()
            )));
        }
        Ok(())
    }
}
