//! Bunkr crawler.
//!
//! The media type is read from the page URL after redirects, since bunkr
//! mirrors rewrite paths between domains.
//!
//! - `/a/<id>`: album; title from `<h1>`, files from `.grid-images a`.
//! - `/i/`, `/v/`, `/d/`: file; the stream URL takes two hops (file page →
//!   download page → direct link).

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use scraper::Selector;
use tracing::{debug, instrument};
use url::Url;

use super::parsing::{
    compile_static_selector, media_path, origin_of, parse_download_hyperlink, parse_listing,
    parse_title,
};
use super::{Crawler, ScrapeError};
use crate::http::{HttpClient, Page};
use crate::media::{ChildUrls, Media, MediaAlbum, MediaFile, parse_filename};

static LISTING_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| compile_static_selector(".grid-images"));
static ITEM_SELECTOR: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("a"));

/// Crawler for bunkr hosts.
#[derive(Debug)]
pub struct Bunkr {
    client: Arc<HttpClient>,
}

impl Bunkr {
    /// Creates a crawler bound to the shared client.
    #[must_use]
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self { client }
    }

    fn album(url: &Url, page: &Page) -> Result<Media, ScrapeError> {
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

    async fn file(&self, url: &Url, page: &Page) -> Result<Media, ScrapeError> {
        let title = parse_title(&page.body, &page.url)?;
        let filename = parse_filename(&title)?;
        let stream_url = self.resolve_stream_url(page).await?;
        Ok(Media::File(MediaFile::new(
            title,
            filename,
            url.clone(),
            stream_url,
        )))
    }

    /// File page → download page → direct link.
    async fn resolve_stream_url(&self, page: &Page) -> Result<Url, ScrapeError> {
        let download_page_url = parse_download_hyperlink(&page.body, &page.url)?;
        debug!(url = %download_page_url, "following download page");
        let download_page = self.client.fetch_text(&download_page_url).await?;
        parse_download_hyperlink(&download_page.body, &download_page.url)
    }
}

#[async_trait]
impl Crawler for Bunkr {
    fn name(&self) -> &'static str {
        "bunkr"
    }

    #[instrument(skip(self), fields(crawler = "bunkr", url = %url))]
    async fn get_media(&self, url: &Url) -> Result<Media, ScrapeError> {
        let page = self.client.fetch_text(url).await?;
        let path = media_path(&page.url);
        match path.kind.as_str() {
            "a" => Self::album(url, &page),
            "i" | "v" | "d" => self.file(url, &page).await,
            kind => Err(ScrapeError::undefined_media_type(page.url.as_str(), kind)),
        }
    }
}
