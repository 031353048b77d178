//! Error types for the HTTP client.
//!
//! Each variant keeps the URL that failed so callers can report it without
//! carrying extra context around.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while fetching a URL.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The TCP/TLS connection could not be established in time.
    #[error("connect timeout ({} seconds) requesting {url}", timeout.as_secs_f64())]
    ConnectTimeout {
        /// The URL that timed out.
        url: String,
        /// The configured connect timeout.
        timeout: Duration,
    },

    /// The server stopped sending data for longer than the read timeout.
    #[error("read timeout ({} seconds) requesting {url}", timeout.as_secs_f64())]
    ReadTimeout {
        /// The URL that timed out.
        url: String,
        /// The configured read timeout.
        timeout: Duration,
    },

    /// The redirect chain was longer than allowed.
    #[error("too many redirects (max {max}) requesting {url}")]
    TooManyRedirects {
        /// The URL whose redirect chain was cut.
        url: String,
        /// The configured redirect limit.
        max: usize,
    },

    /// Connection-level failure (refused, reset, DNS, broken body stream).
    #[error("connection error requesting {url}: {source}")]
    Connection {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Non-success HTTP status.
    #[error("HTTP {status} requesting {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// The Retry-After header value, if present.
        retry_after: Option<String>,
    },

    /// A successful response without a content-type (blocked or interstitial page).
    #[error("empty content-type in response from {url}")]
    EmptyContentType {
        /// The URL that answered without a content-type.
        url: String,
    },

    /// Any other request failure reported by the HTTP stack.
    #[error("request to {url} failed: {source}")]
    Request {
        /// The URL that failed.
        url: String,
        /// The underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client itself could not be built.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            retry_after: None,
        }
    }

    /// Creates an HTTP status error with a Retry-After header value.
    pub fn http_status_with_retry_after(
        url: impl Into<String>,
        status: u16,
        retry_after: Option<String>,
    ) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            retry_after,
        }
    }

    /// Creates an empty content-type error.
    pub fn empty_content_type(url: impl Into<String>) -> Self {
        Self::EmptyContentType { url: url.into() }
    }

    /// Creates a connection error.
    pub fn connection(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Connection {
            url: url.into(),
            source,
        }
    }

    /// The URL the error refers to, if any.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::ConnectTimeout { url, .. }
            | Self::ReadTimeout { url, .. }
            | Self::TooManyRedirects { url, .. }
            | Self::Connection { url, .. }
            | Self::HttpStatus { url, .. }
            | Self::EmptyContentType { url }
            | Self::Request { url, .. } => Some(url),
            Self::ClientBuild { .. } => None,
        }
    }

    /// The Retry-After header carried by a status error.
    #[must_use]
    pub fn retry_after(&self) -> Option<&str> {
        match self {
            Self::HttpStatus { retry_after, .. } => retry_after.as_deref(),
            _ => None,
        }
    }
}
