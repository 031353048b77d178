//! Failure classification and user-facing one-line messages.
//!
//! Every task failure maps to a [`FailureDescriptor`]: a [`Marker`] and a
//! short headline. The CLI prints `"{marker} {headline}: {url}"`, or just
//! `"{marker} {headline}"` for run-level failures.

use std::fmt;

use reqwest::StatusCode;

use crate::crawler::{DispatchError, ScrapeError};
use crate::download::DownloadError;
use crate::http::FetchError;
use crate::media::FilenameError;
use crate::traversal::TaskError;

/// Line prefix for console output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// `[+]` success.
    Success,
    /// `[-]` a task failed, the run continues.
    Failure,
    /// `[!]` informational.
    Info,
    /// `[?]` something unclassified.
    Unknown,
}

impl Marker {
    /// The bracketed prefix printed before a line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "[+]",
            Self::Failure => "[-]",
            Self::Info => "[!]",
            Self::Unknown => "[?]",
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Marker plus headline for one failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureDescriptor {
    /// Prefix for the line.
    pub marker: Marker,
    /// Short description of what went wrong.
    pub headline: String,
    /// Whether the URL belongs on the line.
    pub with_url: bool,
}

impl FailureDescriptor {
    fn task(headline: impl Into<String>) -> Self {
        Self {
            marker: Marker::Failure,
            headline: headline.into(),
            with_url: true,
        }
    }

    /// Renders the console line for `url`.
    #[must_use]
    pub fn line(&self, url: &str) -> String {
        if self.with_url {
            format!("{} {}: {url}", self.marker, self.headline)
        } else {
            format!("{} {}", self.marker, self.headline)
        }
    }
}

/// Headline for an HTTP status: the canonical reason phrase and the code.
#[must_use]
pub fn status_headline(status: u16) -> String {
    let phrase = StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("HTTP Error");
    format!("{phrase} ({status} code)")
}

/// `3.03` or `42`; `f64` display drops a zero fraction.
fn seconds(duration: std::time::Duration) -> String {
    duration.as_secs_f64().to_string()
}

/// Describes a fetch failure.
#[must_use]
pub fn describe_fetch(error: &FetchError) -> FailureDescriptor {
    match error {
        FetchError::HttpStatus { status, .. } => FailureDescriptor::task(status_headline(*status)),
        FetchError::TooManyRedirects { max, .. } => {
            FailureDescriptor::task(format!("Too Many Redirects (max {max})"))
        }
        FetchError::ConnectTimeout { timeout, .. } => {
            FailureDescriptor::task(format!("Connect Timeout ({} seconds)", seconds(*timeout)))
        }
        FetchError::ReadTimeout { timeout, .. } => {
            FailureDescriptor::task(format!("Read Timeout ({} seconds)", seconds(*timeout)))
        }
        FetchError::Connection { .. } | FetchError::EmptyContentType { .. } => {
            FailureDescriptor::task("Unknown Server Error")
        }
        FetchError::Request { .. } | FetchError::ClientBuild { .. } => {
            FailureDescriptor::task("Download Error")
        }
    }
}

fn describe_scrape(error: &ScrapeError) -> FailureDescriptor {
    match error {
        ScrapeError::Fetch(fetch) => describe_fetch(fetch),
        ScrapeError::Filename(FilenameError::ExtensionNotFound { title }) => {
            FailureDescriptor::task(format!("File \"{title}\" has no extension"))
        }
        ScrapeError::Filename(FilenameError::ExtensionNotSupported { extension }) => {
            FailureDescriptor::task(format!("File extension \"{extension}\" is not supported"))
        }
        ScrapeError::UndefinedMediaType { discriminator, .. } => {
            FailureDescriptor::task(format!("Undefined media type \"{discriminator}\""))
        }
        ScrapeError::ListingNotFound { .. }
        | ScrapeError::TitleNotFound { .. }
        | ScrapeError::HyperlinkNotFound { .. }
        | ScrapeError::Payload { .. } => FailureDescriptor::task("Parsing Error"),
    }
}

fn describe_download(error: &DownloadError) -> FailureDescriptor {
    match error {
        DownloadError::Fetch(fetch) | DownloadError::Interrupted { source: fetch, .. } => {
            describe_fetch(fetch)
        }
        DownloadError::FileOpen { .. } | DownloadError::Write { .. } => {
            FailureDescriptor::task("Save Error")
        }
        DownloadError::DeviceFull { .. } => FailureDescriptor {
            marker: Marker::Failure,
            headline: "Save Error: Probably not enough free space".to_string(),
            with_url: false,
        },
    }
}

/// Describes a task failure.
#[must_use]
pub fn describe(error: &TaskError) -> FailureDescriptor {
    match error {
        TaskError::Dispatch(DispatchError::HostNotSupported { .. }) => {
            FailureDescriptor::task("Hosting is not supported")
        }
        TaskError::Scrape(scrape) => describe_scrape(scrape),
        TaskError::Download(download) => describe_download(download),
        TaskError::Directory { .. } => FailureDescriptor {
            marker: Marker::Unknown,
            headline: "Unknown Error: Please report it to the developer".to_string(),
            with_url: false,
        },
    }
}
