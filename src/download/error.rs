//! Error types for the download module.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::http::FetchError;

/// Errors that can occur while saving a file.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The stream request failed (after the client's own retries).
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The body stream broke mid-transfer.
    #[error("download interrupted for {url}: {source}")]
    Interrupted {
        /// The stream URL.
        url: String,
        /// What broke the stream.
        #[source]
        source: FetchError,
    },

    /// The destination file could not be created.
    #[error("cannot open file {path}: {source}")]
    FileOpen {
        /// The destination path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The disk ran out of space while writing.
    #[error("no space left on device writing {path}")]
    DeviceFull {
        /// The destination path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Any other write failure.
    #[error("IO error writing to {path}: {source}")]
    Write {
        /// The destination path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl DownloadError {
    /// Creates a file-open error.
    pub fn file_open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::FileOpen {
            path: path.into(),
            source,
        }
    }

    /// Classifies a write/flush failure: out-of-space conditions become
    /// [`DownloadError::DeviceFull`], everything else [`DownloadError::Write`].
    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if is_device_full(&source) {
            Self::DeviceFull { path, source }
        } else {
            Self::Write { path, source }
        }
    }

    /// Creates an interrupted-stream error.
    pub fn interrupted(url: impl Into<String>, source: FetchError) -> Self {
        Self::Interrupted {
            url: url.into(),
            source,
        }
    }

    /// True if the run must stop because the disk is full.
    #[must_use]
    pub fn is_device_full(&self) -> bool {
        matches!(self, Self::DeviceFull { .. })
    }
}

/// True for IO errors that mean "no space left".
#[must_use]
pub fn is_device_full(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::StorageFull | io::ErrorKind::QuotaExceeded
    )
}

// Note on From trait implementations:
// `From<std::io::Error>` is not implemented because every IO variant needs the
// destination path. `From<FetchError>` is fine: fetch errors carry their URL.
