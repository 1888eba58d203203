//! Append-only archive writer.
//!
//! Owns the single destination file for the life of the process. Each call
//! appends one complete line at end-of-file; the writer never rotates,
//! truncates, deletes, or creates directories.
//!
//! ```text
//! Closed ──open()──▶ Open ──append()*──▶ Open ──close()/drop──▶ Closed
//! ```

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::ArchiveError;

/// Lifecycle state of an [`ArchiveWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    Closed,
    Open,
}

impl std::fmt::Display for WriterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
        }
    }
}

/// Appends encoded lines to one file.
#[derive(Debug)]
pub struct ArchiveWriter {
    path: PathBuf,
    file: Option<File>,
}

impl ArchiveWriter {
    /// Create a writer for `path`. Nothing touches the filesystem until
    /// [`open`](Self::open).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> WriterState {
        if self.file.is_some() {
            WriterState::Open
        } else {
            WriterState::Closed
        }
    }

    /// Open the destination in append mode, creating the file if needed.
    ///
    /// The parent directory must already exist. Opening an already open
    /// writer is a no-op.
    pub fn open(&mut self) -> Result<(), ArchiveError> {
        if self.file.is_some() {
            return Ok(());
        }
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        tracing::debug!(path = %self.path.display(), "Archive destination opened");
        self.file = Some(file);
        Ok(())
    }

    /// Append one line. Returns `false` on any failure; the error is logged
    /// and the writer stays in its current state.
    ///
    /// A closed writer makes a single open attempt before writing.
    pub fn append(&mut self, line: &str) -> bool {
        match self.try_append(line) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    state = %self.state(),
                    error = %e,
                    "Archive append failed, record dropped"
                );
                false
            }
        }
    }

    fn try_append(&mut self, line: &str) -> Result<(), ArchiveError> {
        self.open()?;
        match self.file.as_mut() {
            Some(file) => Ok(file.write_all(line.as_bytes())?),
            None => Err(ArchiveError::Io(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "archive destination not open",
            ))),
        }
    }

    /// Flush and release the destination handle.
    pub fn close(&mut self) {
        if let Some(mut file) = self.file.take() {
            if let Err(e) = file.flush() {
                tracing::warn!(path = %self.path.display(), error = %e, "Archive flush on close failed");
            }
            tracing::debug!(path = %self.path.display(), "Archive destination closed");
        }
    }
}
