//! Host-specific crawlers and the dispatcher that selects them.
//!
//! A [`Crawler`] turns a page URL into [`Media`]: either a single file with a
//! ready-to-fetch stream URL, or an album with a lazy sequence of child URLs.
//! The [`Dispatcher`] picks the crawler for a URL by host pattern.
//!
//! # Object Safety
//!
//! This trait uses `async_trait` to support dynamic dispatch via
//! `Box<dyn Crawler>`. Rust 2024 native async traits are not object-safe,
//! so `async_trait` is required for the dispatcher table.

use async_trait::async_trait;
use url::Url;

mod bunkr;
mod cyberdrop;
mod dispatcher;
mod error;
pub mod parsing;
mod pixeldrain;

pub use bunkr::Bunkr;
pub use cyberdrop::{CYBERDROP_API, Cyberdrop};
pub use dispatcher::{CrawlerFactory, Dispatcher};
pub use error::{DispatchError, ScrapeError};
pub use pixeldrain::{PIXELDRAIN_API, Pixeldrain};

use crate::media::Media;

/// Capability contract every host variant implements.
#[async_trait]
pub trait Crawler: Send + Sync {
    /// Returns the crawler's name (e.g., "cyberdrop", "bunkr").
    fn name(&self) -> &'static str;

    /// Resolves `url` into a file or an album.
    ///
    /// # Errors
    ///
    /// Fetch failures, unrecognized URL shapes, missing page structure, and
    /// unsupported filenames are reported as [`ScrapeError`].
    async fn get_media(&self, url: &Url) -> Result<Media, ScrapeError>;
}
