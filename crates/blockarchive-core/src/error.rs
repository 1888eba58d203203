//! Error types for the archival pipeline.
//!
//! None of these ever reach the host's block-acceptance path: the archiver
//! maps every variant to a sentinel value and carries on.

use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

/// Errors that can occur while building, encoding or appending a record.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Block codec error: {0}")]
    Codec(String),

    #[error("Alt-chain snapshot error: {0}")]
    Snapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unsupported schema version {version}")]
    UnsupportedSchema { version: u64 },

    #[error("Host callback panicked in {component}")]
    Panicked { component: &'static str },
}

impl ArchiveError {
    /// Returns `true` if the error came from the filesystem.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }

    /// Returns `true` if the archiver substitutes a sentinel for this error
    /// instead of dropping the record.
    pub fn is_fallback_safe(&self) -> bool {
        matches!(
            self,
            Self::Codec(_) | Self::Snapshot(_) | Self::Serde(_) | Self::Panicked { .. }
        )
    }
}

/// Run a host callback, turning a panic into [`ArchiveError::Panicked`].
pub(crate) fn contain<T>(
    component: &'static str,
    f: impl FnOnce() -> Result<T, ArchiveError>,
) -> Result<T, ArchiveError> {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or(Err(ArchiveError::Panicked { component }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contain_maps_panic() {
        let err = contain::<u64>("codec", || panic!("boom")).unwrap_err();
        assert!(matches!(err, ArchiveError::Panicked { component: "codec" }));
        assert!(err.is_fallback_safe());
    }

    #[test]
    fn contain_passes_through_results() {
        assert_eq!(contain("codec", || Ok(7u64)).unwrap(), 7);
        let err = contain::<u64>("snapshot", || Err(ArchiveError::Snapshot("gone".into())));
        assert!(matches!(err, Err(ArchiveError::Snapshot(_))));
    }

    #[test]
    fn io_is_not_fallback_safe() {
        let err = ArchiveError::from(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(err.is_io());
        assert!(!err.is_fallback_safe());
    }
}
