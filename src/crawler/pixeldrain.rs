//! Pixeldrain crawler.
//!
//! Everything goes through the JSON API:
//! - `/l/<id>`: list `<api>/list/<id>` → `{title, files: [{id}]}`; children
//!   are `/u/<file id>` on the list's host.
//! - `/u/<id>`: file info `<api>/file/<id>/info` → `{name}`; stream URL is
//!   `<api>/file/<id>`.
//! - `/l/<id>#item=<n>`: the n-th file of the list, resolved as a file.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::parsing::{compile_static_regex, media_path};
use super::{Crawler, ScrapeError};
use crate::http::HttpClient;
use crate::media::{ChildUrls, Media, MediaAlbum, MediaFile, parse_filename};

/// Public Pixeldrain API root.
pub const PIXELDRAIN_API: &str = "https://pixeldrain.com/api/";

/// Fragment selecting one file of a list: `item=<n>`.
static ITEM_FRAGMENT_RE: LazyLock<Regex> = LazyLock::new(|| compile_static_regex(r"^item=(\d+)$"));

#[derive(Debug, Deserialize)]
struct ListInfo {
    title: String,
    files: Vec<ListEntry>,
}

#[derive(Debug, Deserialize)]
struct ListEntry {
    id: String,
}

#[derive(Debug, Deserialize)]
struct FileInfo {
    name: String,
}

/// Crawler for pixeldrain hosts.
#[derive(Debug)]
pub struct Pixeldrain {
    client: Arc<HttpClient>,
    api_base: Url,
}

impl Pixeldrain {
    /// Creates a crawler using the public API.
    #[must_use]
    pub fn new(client: Arc<HttpClient>) -> Self {
        let api_base = Url::parse(PIXELDRAIN_API)
            .unwrap_or_else(|e| panic!("invalid static URL '{PIXELDRAIN_API}': {e}"));
        Self { client, api_base }
    }

    /// Creates a crawler against another API root (must end with `/`).
    #[must_use]
    pub fn with_api_base(client: Arc<HttpClient>, api_base: Url) -> Self {
        Self { client, api_base }
    }

    fn api(&self, source: &Url, path: &str) -> Result<Url, ScrapeError> {
        self.api_base
            .join(path)
            .map_err(|e| ScrapeError::payload(source.as_str(), e))
    }

    async fn list_info(&self, url: &Url, id: &str) -> Result<ListInfo, ScrapeError> {
        let api_url = self.api(url, &format!("list/{id}"))?;
        let page = self.client.fetch_text(&api_url).await?;
        serde_json::from_str(&page.body).map_err(|e| ScrapeError::payload(api_url.as_str(), e))
    }

    async fn album(&self, url: &Url, id: &str) -> Result<Media, ScrapeError> {
        let info = self.list_info(url, id).await?;
        let children = info
            .files
            .iter()
            .map(|entry| file_page_url(url, &entry.id))
            .collect();
        debug!(title = %info.title, children = info.files.len(), "list parsed");
        Ok(Media::Album(MediaAlbum::new(
            info.title,
            url.clone(),
            ChildUrls::from_urls(children),
        )))
    }

    async fn album_item(&self, url: &Url, id: &str, index: usize) -> Result<Media, ScrapeError> {
        let info = self.list_info(url, id).await?;
        let entry = info.files.get(index).ok_or_else(|| {
            ScrapeError::payload(
                url.as_str(),
                format!("list has {} files, item {index} requested", info.files.len()),
            )
        })?;
        let file_url = file_page_url(url, &entry.id);
        debug!(index, file = %file_url, "resolved list item");
        self.file(&file_url, &entry.id).await
    }

    async fn file(&self, url: &Url, id: &str) -> Result<Media, ScrapeError> {
        let info_url = self.api(url, &format!("file/{id}/info"))?;
        let page = self.client.fetch_text(&info_url).await?;
        let info: FileInfo = serde_json::from_str(&page.body)
            .map_err(|e| ScrapeError::payload(info_url.as_str(), e))?;
        let stream_url = self.api(url, &format!("file/{id}"))?;
        let filename = parse_filename(&info.name)?;
        Ok(Media::File(MediaFile::new(
            info.name,
            filename,
            url.clone(),
            stream_url,
        )))
    }
}

/// `/u/<id>` on the same host as `url`.
fn file_page_url(url: &Url, id: &str) -> Url {
    let mut file_url = url.clone();
    file_url.set_path(&format!("u/{id}"));
    file_url.set_query(None);
    file_url.set_fragment(None);
    file_url
}

/// Index selected by an `item=<n>` fragment.
fn item_index(url: &Url) -> Option<usize> {
    let fragment = url.fragment()?;
    ITEM_FRAGMENT_RE
        .captures(fragment)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[async_trait]
impl Crawler for Pixeldrain {
    fn name(&self) -> &'static str {
        "pixeldrain"
    }

    #[instrument(skip(self), fields(crawler = "pixeldrain", url = %url))]
    async fn get_media(&self, url: &Url) -> Result<Media, ScrapeError> {
        let path = media_path(url);
        match (path.kind.as_str(), path.id.as_deref()) {
            ("l", Some(id)) => match item_index(url) {
                Some(index) => self.album_item(url, id, index).await,
                None => self.album(url, id).await,
            },
            ("u", Some(id)) => self.file(url, id).await,
            (kind, _) => Err(ScrapeError::undefined_media_type(url.as_str(), kind)),
        }
    }
}
