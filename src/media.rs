//! Media descriptors produced by crawlers and consumed by the traversal.
//!
//! A crawler turns a page URL into either a [`MediaFile`] (one downloadable
//! file) or a [`MediaAlbum`] (a title plus a lazy, single-pass sequence of
//! child URLs). File names are validated against [`SUPPORTED_EXTENSIONS`]
//! when the [`Filename`] is constructed, so a `MediaFile` always carries a
//! supported extension.

use std::fmt;

use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use thiserror::Error;
use url::Url;

use crate::crawler::ScrapeError;
use crate::sanitize::sanitize;

/// Directory name used when an album has no usable title.
pub const DEFAULT_ALBUM_NAME: &str = "unknown album";

/// File extensions accepted for download (lowercase, with leading dot).
#[rustfmt::skip]
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    // video
    ".mp4", ".mov", ".m4v", ".ts", ".mkv", ".avi", ".wmv", ".webm", ".vob", ".gifv", ".mpg", ".mpeg",
    // audio
    ".mp3", ".flac", ".wav",
    // image
    ".png", ".jpeg", ".jpg", ".gif", ".bmp", ".webp", ".heif", ".heic", ".tiff", ".svf", ".svg",
    ".ico", ".psd", ".ai",
    // documents
    ".pdf", ".txt", ".log", ".csv", ".xml", ".cbr",
    // archives and misc
    ".zip", ".rar", ".7z", ".tar", ".gz", ".xz", ".iso", ".torrent", ".kdbx",
];

/// Returns true if `extension` (including the leading dot) is supported.
#[must_use]
pub fn is_supported_extension(extension: &str) -> bool {
    SUPPORTED_EXTENSIONS.contains(&extension)
}

/// Errors raised while deriving a [`Filename`] from a title.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FilenameError {
    /// The title has no `.ext` suffix.
    #[error("file \"{title}\" has no extension")]
    ExtensionNotFound {
        /// The title that was parsed.
        title: String,
    },

    /// The extension is outside the supported set.
    #[error("file extension \"{extension}\" is not supported")]
    ExtensionNotSupported {
        /// The rejected extension.
        extension: String,
    },
}

/// A validated `(stem, extension)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filename {
    stem: String,
    extension: String,
}

impl Filename {
    /// Creates a filename, rejecting extensions outside [`SUPPORTED_EXTENSIONS`].
    ///
    /// # Errors
    ///
    /// Returns [`FilenameError::ExtensionNotSupported`] for unknown extensions.
    pub fn new(stem: impl Into<String>, extension: impl Into<String>) -> Result<Self, FilenameError> {
        let extension = extension.into();
        if !is_supported_extension(&extension) {
            return Err(FilenameError::ExtensionNotSupported { extension });
        }
        Ok(Self {
            stem: stem.into(),
            extension,
        })
    }

    /// The part before the extension.
    #[must_use]
    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// The extension, with leading dot.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }
}

impl fmt::Display for Filename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.stem, self.extension)
    }
}

/// Derives a [`Filename`] from a human-readable title.
///
/// The title is split at its last dot. The extension is lowercased and the
/// stem sanitized for the filesystem.
///
/// # Errors
///
/// Returns [`FilenameError::ExtensionNotFound`] when the title has no
/// extension, and [`FilenameError::ExtensionNotSupported`] when the
/// extension is unknown.
pub fn parse_filename(title: &str) -> Result<Filename, FilenameError> {
    let trimmed = title.trim();
    let Some((stem, extension)) = trimmed.rsplit_once('.') else {
        return Err(FilenameError::ExtensionNotFound {
            title: title.to_string(),
        });
    };
    if extension.is_empty() || extension.contains(char::is_whitespace) {
        return Err(FilenameError::ExtensionNotFound {
            title: title.to_string(),
        });
    }

    let extension = format!(".{}", extension.to_lowercase());
    Filename::new(sanitize(stem), extension)
}

/// A single downloadable file.
#[derive(Debug, Clone)]
pub struct MediaFile {
    /// Title shown by the host.
    pub title: String,
    /// Name the file is saved under.
    pub filename: Filename,
    /// Page the file was discovered on.
    pub source_url: Url,
    /// Direct location of the file bytes.
    pub stream_url: Url,
    downloaded: bool,
}

impl MediaFile {
    /// Creates a file descriptor that has not been downloaded yet.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        filename: Filename,
        source_url: Url,
        stream_url: Url,
    ) -> Self {
        Self {
            title: title.into(),
            filename,
            source_url,
            stream_url,
            downloaded: false,
        }
    }

    /// True once the downloader confirmed a complete write.
    #[must_use]
    pub fn is_downloaded(&self) -> bool {
        self.downloaded
    }

    pub(crate) fn mark_downloaded(&mut self) {
        self.downloaded = true;
    }
}

/// Lazy, single-pass sequence of child URLs of an album.
///
/// Elements may be produced on demand; an element may itself be an error
/// (e.g. a malformed link) without ending the sequence.
pub struct ChildUrls {
    inner: BoxStream<'static, Result<Url, ScrapeError>>,
}

impl ChildUrls {
    /// Wraps an arbitrary stream of child URLs.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Url, ScrapeError>> + Send + 'static,
    {
        Self {
            inner: stream.boxed(),
        }
    }

    /// Child sequence over URLs that are already known.
    #[must_use]
    pub fn from_urls(urls: Vec<Url>) -> Self {
        Self::from_stream(stream::iter(urls.into_iter().map(Ok)))
    }

    /// Child sequence with no elements.
    #[must_use]
    pub fn empty() -> Self {
        Self::from_stream(stream::empty())
    }

    /// Yields the next child, or `None` once the sequence is exhausted.
    pub async fn next(&mut self) -> Option<Result<Url, ScrapeError>> {
        self.inner.next().await
    }
}

impl fmt::Debug for ChildUrls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildUrls").finish_non_exhaustive()
    }
}

/// A titled collection of files or nested albums.
#[derive(Debug)]
pub struct MediaAlbum {
    /// Title shown by the host (unsanitized).
    pub title: String,
    /// Listing page of the album.
    pub source_url: Url,
    /// Child URLs, consumed exactly once in order.
    pub children: ChildUrls,
}

impl MediaAlbum {
    /// Creates an album descriptor.
    #[must_use]
    pub fn new(title: impl Into<String>, source_url: Url, children: ChildUrls) -> Self {
        Self {
            title: title.into(),
            source_url,
            children,
        }
    }
}

/// What a crawler resolved a URL to.
#[derive(Debug)]
pub enum Media {
    /// A single file.
    File(MediaFile),
    /// An album to expand.
    Album(MediaAlbum),
}
