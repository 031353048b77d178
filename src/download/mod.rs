//! Download module for saving resolved files to disk.
//!
//! This module provides the [`Downloader`], which streams a file's bytes
//! through the shared HTTP client into the destination directory, plus the
//! [`FileSystem`] seam it writes through and the [`DownloadProgress`]
//! callbacks it reports to.

mod error;
mod fs;
mod progress;
mod saver;

pub use error::{DownloadError, is_device_full};
pub use fs::{FileSystem, FileWriter, TokioFileSystem};
pub use progress::{DownloadProgress, NoProgress};
pub use saver::{DEFAULT_CHUNK_SIZE, Downloader, DownloaderConfig};
