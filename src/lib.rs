//! Simple Downloader Library
//!
//! Retrieves single files and albums from file-sharing hosts and saves them
//! to local storage, surviving flaky servers, rate limits, interrupted
//! transfers and full disks.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`http`] - Shared HTTP client with pre-request delay, retry and backoff
//! - [`crawler`] - Host dispatch and site-specific scraping (cyberdrop, bunkr, pixeldrain)
//! - [`media`] - Files, albums, filenames and supported extensions
//! - [`download`] - Streaming writer with disk-full detection
//! - [`traversal`] - Recursive album expansion and attempt/success counting
//! - [`failure`] - One-line user-facing failure messages
//! - [`sanitize`] - Filesystem-safe names

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod crawler;
pub mod download;
pub mod failure;
pub mod http;
pub mod media;
pub mod sanitize;
pub mod traversal;
mod user_agent;

// Re-export commonly used types
pub use crawler::{Crawler, DispatchError, Dispatcher, ScrapeError};
pub use download::{DownloadError, DownloadProgress, Downloader, DownloaderConfig, NoProgress};
pub use http::{ClientConfig, FetchError, HttpClient, RetryPolicy};
pub use media::{Media, MediaAlbum, MediaFile};
pub use traversal::{DownloadCounter, RunError, RunObserver, TaskError, Traversal};
