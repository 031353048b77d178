//! Cyberdrop crawler.
//!
//! - `/a/<id>`: HTML album page; title from `<h1>`, files from `#table .image`.
//! - `/f/<id>`: file, resolved through the JSON API (`<api>/f/<id>`), whose
//!   `url` field is already the stream URL.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use scraper::Selector;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::parsing::{compile_static_selector, media_path, origin_of, parse_listing, parse_title};
use super::{Crawler, ScrapeError};
use crate::http::HttpClient;
use crate::media::{ChildUrls, Media, MediaAlbum, MediaFile, parse_filename};

/// Public Cyberdrop API root.
pub const CYBERDROP_API: &str = "https://cyberdrop.me/api/";

static LISTING_SELECTOR: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("#table"));
static ITEM_SELECTOR: LazyLock<Selector> = LazyLock::new(|| compile_static_selector(".image"));

#[derive(Debug, Deserialize)]
struct FileInfo {
    name: String,
    url: String,
}

/// Crawler for cyberdrop hosts.
#[derive(Debug)]
pub struct Cyberdrop {
    client: Arc<HttpClient>,
    api_base: Url,
}

impl Cyberdrop {
    /// Creates a crawler using the public API.
    #[must_use]
    pub fn new(client: Arc<HttpClient>) -> Self {
        let api_base = Url::parse(CYBERDROP_API)
            .unwrap_or_else(|e| panic!("invalid static URL '{CYBERDROP_API}': {e}"));
        Self { client, api_base }
    }

    /// Creates a crawler against another API root (must end with `/`).
    #[must_use]
    pub fn with_api_base(client: Arc<HttpClient>, api_base: Url) -> Self {
        Self { client, api_base }
    }

    async fn album(&self, url: &Url) -> Result<Media, ScrapeError> {
        let page = self.client.fetch_text(url).await?;
        let title = parse_title(&page.body, &page.url)?;
        let children = parse_listing(
            &page.body,
            &page.url,
            &LISTING_SELECTOR,
            &ITEM_SELECTOR,
            &origin_of(&page.url),
        )?;
        debug!(title = %title, children = children.len(), "album parsed");
        Ok(Media::Album(MediaAlbum::new(
            title,
            url.clone(),
            ChildUrls::from_urls(children),
        )))
    }

    async fn file(&self, url: &Url, id: &str) -> Result<Media, ScrapeError> {
        let api_url = self
            .api_base
            .join(&format!("f/{id}"))
            .map_err(|e| ScrapeError::payload(url.as_str(), e))?;
        let page = self.client.fetch_text(&api_url).await?;
        let info: FileInfo = serde_json::from_str(&page.body)
            .map_err(|e| ScrapeError::payload(api_url.as_str(), e))?;
        let stream_url =
            Url::parse(&info.url).map_err(|e| ScrapeError::payload(api_url.as_str(), e))?;
        let filename = parse_filename(&info.name)?;
        Ok(Media::File(MediaFile::new(
            info.name,
            filename,
            url.clone(),
            stream_url,
        )))
    }
}

#[async_trait]
impl Crawler for Cyberdrop {
    fn name(&self) -> &'static str {
        "cyberdrop"
    }

    #[instrument(skip(self), fields(crawler = "cyberdrop", url = %url))]
    async fn get_media(&self, url: &Url) -> Result<Media, ScrapeError> {
        let path = media_path(url);
        match (path.kind.as_str(), path.id.as_deref()) {
            ("a", Some(_)) => self.album(url).await,
            ("f", Some(id)) => self.file(url, id).await,
            (kind, _) => Err(ScrapeError::undefined_media_type(url.as_str(), kind)),
        }
    }
}
