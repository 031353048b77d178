//! Error types for crawlers and dispatch.

use thiserror::Error;

use crate::http::FetchError;
use crate::media::FilenameError;

/// Errors a crawler can raise while resolving a URL.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The page or API request failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The URL shape does not map to a file or album for this host.
    #[error("undefined media type \"{discriminator}\" in {url}")]
    UndefinedMediaType {
        /// The offending URL.
        url: String,
        /// The path component used to pick the media type.
        discriminator: String,
    },

    /// The album page has no listing container.
    #[error("album listing not found on {url}")]
    ListingNotFound {
        /// The album page.
        url: String,
    },

    /// The page has no usable title.
    #[error("title not found on {url}")]
    TitleNotFound {
        /// The page.
        url: String,
    },

    /// The page has no download hyperlink.
    #[error("download hyperlink not found on {url}")]
    HyperlinkNotFound {
        /// The page.
        url: String,
    },

    /// The title does not yield a supported filename.
    #[error(transparent)]
    Filename(#[from] FilenameError),

    /// A JSON API answered with an unexpected shape.
    #[error("unexpected payload from {url}: {reason}")]
    Payload {
        /// The API URL.
        url: String,
        /// What was wrong with it.
        reason: String,
    },
}

impl ScrapeError {
    /// Creates an undefined media type error.
    pub fn undefined_media_type(url: impl Into<String>, discriminator: impl Into<String>) -> Self {
        Self::UndefinedMediaType {
            url: url.into(),
            discriminator: discriminator.into(),
        }
    }

    /// Creates a listing-not-found error.
    pub fn listing_not_found(url: impl Into<String>) -> Self {
        Self::ListingNotFound { url: url.into() }
    }

    /// Creates a title-not-found error.
    pub fn title_not_found(url: impl Into<String>) -> Self {
        Self::TitleNotFound { url: url.into() }
    }

    /// Creates a hyperlink-not-found error.
    pub fn hyperlink_not_found(url: impl Into<String>) -> Self {
        Self::HyperlinkNotFound { url: url.into() }
    }

    /// Creates a payload error.
    pub fn payload(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Payload {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors raised when selecting a crawler for a URL.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No registered host pattern matches the URL.
    #[error("hosting is not supported: {url}")]
    HostNotSupported {
        /// The exact URL that could not be dispatched.
        url: String,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_undefined_media_type_display() {
        let error = ScrapeError::undefined_media_type("https://bunkr.example/x/1", "x");
        let msg = error.to_string();
        assert!(msg.contains("\"x\""), "Expected discriminator in: {msg}");
        assert!(msg.contains("https://bunkr.example/x/1"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_filename_error_is_transparent() {
        let error = ScrapeError::from(FilenameError::ExtensionNotFound {
            title: "README".to_string(),
        });
        assert_eq!(error.to_string(), "file \"README\" has no extension");
    }

    #[test]
    fn test_host_not_supported_carries_url() {
        let error = DispatchError::HostNotSupported {
            url: "https://unknown.example/a/1".to_string(),
        };
        assert!(error.to_string().ends_with("https://unknown.example/a/1"));
    }
}
