//! Shared parsing helpers for crawler modules: URL shape, titles, listings
//! and download hyperlinks.
//!
//! `scraper::Html` is not `Send`, so everything here is synchronous and
//! takes the page body as a string. Crawlers call these between awaits and
//! keep only owned results.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::ScrapeError;

/// Compiles a regex at static init; panics on invalid pattern.
pub fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

/// Compiles a CSS selector at static init; panics on invalid selector.
pub fn compile_static_selector(selector: &str) -> Selector {
    Selector::parse(selector).unwrap_or_else(|e| panic!("invalid static selector '{selector}': {e}"))
}

/// `/<kind>/<id>` at the start of a URL path.
static MEDIA_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"^/([^/]+)(?:/([^/]+))?"));

static H1_SELECTOR: LazyLock<Selector> = LazyLock::new(|| compile_static_selector("h1"));

/// Download buttons: explicit `download` anchors first, then styled buttons.
static DOWNLOAD_LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    compile_static_selector("a[download][href], a.download[href], a#download-btn[href]")
});

/// Attribute carrying the hex-obfuscated e-mail in protected titles.
const CF_EMAIL_ATTR: &str = "data-cfemail";

/// The media-type discriminator and identifier of a host URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPath {
    /// First path segment (`a`, `f`, `l`, ...); empty for a bare host.
    pub kind: String,
    /// Second path segment, when present.
    pub id: Option<String>,
}

/// Splits `url` into its media-type discriminator and identifier.
#[must_use]
pub fn media_path(url: &Url) -> MediaPath {
    MEDIA_PATH_RE.captures(url.path()).map_or_else(
        || MediaPath {
            kind: String::new(),
            id: None,
        },
        |caps| MediaPath {
            kind: caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default(),
            id: caps.get(2).map(|m| m.as_str().to_string()),
        },
    )
}

/// Resolves a possibly relative URL string against a base URL.
///
/// Normalizes `//...` to `https:...`; otherwise joins with `base_url`.
#[must_use]
pub fn absolutize_url(value: &str, base_url: &Url) -> Option<Url> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if value.starts_with("//") {
        return Url::parse(&format!("https:{value}")).ok();
    }
    base_url.join(value).ok()
}

/// Decodes a hex-obfuscated e-mail: the first byte is an XOR mask applied
/// to every following byte.
#[must_use]
pub fn decode_cf_email(encoded: &str) -> Option<String> {
    let encoded = encoded.trim();
    if encoded.len() < 2 || encoded.len() % 2 != 0 || !encoded.is_ascii() {
        return None;
    }
    let mask = u8::from_str_radix(&encoded[..2], 16).ok()?;
    let bytes = (2..encoded.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&encoded[i..i + 2], 16).map(|b| b ^ mask))
        .collect::<Result<Vec<u8>, _>>()
        .ok()?;
    String::from_utf8(bytes).ok()
}

/// Text of the first `<h1>`, with obfuscated e-mail fragments decoded and
/// surrounding whitespace trimmed.
///
/// # Errors
///
/// Returns [`ScrapeError::TitleNotFound`] when there is no `<h1>` or it is blank.
pub fn parse_title(body: &str, page_url: &Url) -> Result<String, ScrapeError> {
    let document = Html::parse_document(body);
    let heading = document
        .select(&H1_SELECTOR)
        .next()
        .ok_or_else(|| ScrapeError::title_not_found(page_url.as_str()))?;

    let mut title = String::new();
    collect_text(heading, &mut title);
    let title = title.trim();
    if title.is_empty() {
        return Err(ScrapeError::title_not_found(page_url.as_str()));
    }
    Ok(title.to_string())
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            let decoded = child_element
                .value()
                .attr(CF_EMAIL_ATTR)
                .and_then(decode_cf_email);
            match decoded {
                Some(email) => out.push_str(&email),
                None => collect_text(child_element, out),
            }
        }
    }
}

/// First download hyperlink on the page, absolutized against `page_url`.
///
/// # Errors
///
/// Returns [`ScrapeError::HyperlinkNotFound`] when the page has none.
pub fn parse_download_hyperlink(body: &str, page_url: &Url) -> Result<Url, ScrapeError> {
    let document = Html::parse_document(body);
    document
        .select(&DOWNLOAD_LINK_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| absolutize_url(href, page_url))
        .ok_or_else(|| ScrapeError::hyperlink_not_found(page_url.as_str()))
}

/// Hrefs of `items` inside the first `container`, absolutized against `base_url`.
///
/// An existing container with no items yields an empty list; anchors
/// without a usable href are skipped.
///
/// # Errors
///
/// Returns [`ScrapeError::ListingNotFound`] when the container is absent.
pub fn parse_listing(
    body: &str,
    page_url: &Url,
    container: &Selector,
    items: &Selector,
    base_url: &Url,
) -> Result<Vec<Url>, ScrapeError> {
    let document = Html::parse_document(body);
    let listing = document
        .select(container)
        .next()
        .ok_or_else(|| ScrapeError::listing_not_found(page_url.as_str()))?;

    Ok(listing
        .select(items)
        .filter_map(|item| item.value().attr("href"))
        .filter_map(|href| absolutize_url(href, base_url))
        .collect())
}

/// Scheme, host and port of `url` as a base for joining absolute paths.
#[must_use]
pub fn origin_of(url: &Url) -> Url {
    let mut origin = url.clone();
    origin.set_path("/");
    origin.set_query(None);
    origin.set_fragment(None);
    origin
}
