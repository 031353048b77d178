//! Error types for the traversal engine.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::DownloadCounter;
use crate::crawler::{DispatchError, ScrapeError};
use crate::download::DownloadError;

/// Failure of a single task (one URL or one file).
#[derive(Debug, Error)]
pub enum TaskError {
    /// No crawler for the URL's host.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The crawler could not resolve the URL.
    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    /// The file could not be saved.
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// No album directory could be created, fallbacks included.
    #[error("cannot create album directory {path}: {source}")]
    Directory {
        /// The last directory tried.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl TaskError {
    /// True if the whole run must stop.
    ///
    /// Device-full aborts because every later write would fail too. A
    /// directory failure that survives every fallback is unclassified and
    /// aborts as well.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Download(error) => error.is_device_full(),
            Self::Directory { .. } => true,
            Self::Dispatch(_) | Self::Scrape(_) => false,
        }
    }
}

/// A run stopped by a fatal task error, with the counters accumulated so far.
#[derive(Debug, Error)]
#[error("run aborted after {} attempts: {source}", counter.attempts())]
pub struct RunError {
    /// Counters at the moment of the abort.
    pub counter: DownloadCounter,
    /// The fatal error.
    #[source]
    pub source: TaskError,
}
