//! Recursive expansion of albums into file downloads.
//!
//! The [`Traversal`] engine dispatches the root URL once, then walks albums
//! depth-first in listing order. Files go to the [`Downloader`]; nested
//! albums get their own sanitized sub-directory. Children on the same host
//! reuse the parent's crawler, other hosts are dispatched afresh.
//!
//! Every visit counts one attempt before resolution. A URL that turns out to
//! be an album gives its attempt back, so only file tasks (and tasks that
//! failed before their type was known) are counted. Failures are reported
//! to the [`RunObserver`] and the walk continues, except for fatal ones
//! (see [`TaskError::is_fatal`]) which abort the run.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use url::Url;

mod error;

pub use error::{RunError, TaskError};

use crate::crawler::{Crawler, Dispatcher};
use crate::download::{DownloadProgress, Downloader, NoProgress};
use crate::http::HttpClient;
use crate::media::{DEFAULT_ALBUM_NAME, Media, MediaFile};
use crate::sanitize::album_dir_name;

/// Numbered `unknown album (n)` fallbacks tried after the plain default name.
const MAX_NUMBERED_ALBUM_DIRS: usize = 16;

/// Per-run attempt/success counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadCounter {
    attempts: usize,
    successes: usize,
}

impl DownloadCounter {
    /// Creates a counter with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks attempted (file tasks and tasks that failed before resolving).
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Files saved.
    #[must_use]
    pub fn successes(&self) -> usize {
        self.successes
    }

    /// `attempts - successes`.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.attempts.saturating_sub(self.successes)
    }

    fn increment_attempts(&mut self) {
        self.attempts += 1;
    }

    fn decrement_attempts(&mut self) {
        self.attempts = self.attempts.saturating_sub(1);
    }

    fn increment_successes(&mut self) {
        self.successes += 1;
    }
}

/// Receives traversal events in addition to per-file progress.
///
/// All methods have default no-op implementations.
pub trait RunObserver: DownloadProgress {
    /// An album resolved and its directory is ready.
    fn on_album(&self, _title: &str, _dir: &Path) {}

    /// A file was saved completely.
    fn on_file_saved(&self, _file: &MediaFile, _path: &Path, _bytes: u64) {}

    /// A task failed; the run continues unless the error is fatal.
    fn on_failure(&self, _url: &Url, _error: &TaskError) {}
}

impl RunObserver for NoProgress {}

/// The crawler an album was resolved with, offered to its children.
struct Scope<'a> {
    route: &'static str,
    crawler: &'a dyn Crawler,
}

/// Drives dispatch, crawling and downloading for one invocation.
pub struct Traversal {
    client: Arc<HttpClient>,
    dispatcher: Dispatcher,
    downloader: Downloader,
    observer: Arc<dyn RunObserver>,
}

impl std::fmt::Debug for Traversal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Traversal")
            .field("dispatcher", &self.dispatcher)
            .field("downloader", &self.downloader)
            .finish_non_exhaustive()
    }
}

impl Traversal {
    /// Creates an engine with a silent observer.
    #[must_use]
    pub fn new(client: Arc<HttpClient>, dispatcher: Dispatcher, downloader: Downloader) -> Self {
        Self {
            client,
            dispatcher,
            downloader,
            observer: Arc::new(NoProgress),
        }
    }

    /// Replaces the observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Downloads everything reachable from `root` into `save_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] (with the counters so far) when a fatal task
    /// error aborts the run. Non-fatal failures are reported to the observer
    /// and reflected in the counters only.
    #[instrument(skip(self), fields(root = %root, save_dir = %save_dir.display()))]
    pub async fn run(&self, root: &Url, save_dir: &Path) -> Result<DownloadCounter, RunError> {
        let mut counter = DownloadCounter::new();
        match self.visit(root, None, save_dir, &mut counter).await {
            Ok(()) => {
                info!(
                    attempts = counter.attempts(),
                    successes = counter.successes(),
                    failures = counter.failures(),
                    "run complete"
                );
                Ok(counter)
            }
            Err(source) => {
                warn!(error = %source, attempts = counter.attempts(), "run aborted");
                Err(RunError { counter, source })
            }
        }
    }

    /// Counts the attempt, resolves and processes `url`, and absorbs
    /// non-fatal failures.
    async fn visit(
        &self,
        url: &Url,
        scope: Option<&Scope<'_>>,
        dir: &Path,
        counter: &mut DownloadCounter,
    ) -> Result<(), TaskError> {
        counter.increment_attempts();
        match self.process(url, scope, dir, counter).await {
            Ok(()) => Ok(()),
            Err(error) if error.is_fatal() => Err(error),
            Err(error) => {
                self.report(url, &error);
                Ok(())
            }
        }
    }

    async fn process(
        &self,
        url: &Url,
        scope: Option<&Scope<'_>>,
        dir: &Path,
        counter: &mut DownloadCounter,
    ) -> Result<(), TaskError> {
        let route = self.dispatcher.route_name(url);
        let owned;
        let (route, crawler): (&'static str, &dyn Crawler) = match scope {
            Some(scope) if route == Some(scope.route) => (scope.route, scope.crawler),
            _ => {
                owned = self.dispatcher.resolve(url, &self.client)?;
                (route.unwrap_or_else(|| owned.name()), owned.as_ref())
            }
        };

        match crawler.get_media(url).await? {
            Media::File(mut file) => {
                let bytes = self
                    .downloader
                    .save(&self.client, &mut file, dir, self.observer.as_ref())
                    .await?;
                counter.increment_successes();
                let path = dir.join(file.filename.to_string());
                self.observer.on_file_saved(&file, &path, bytes);
            }
            Media::Album(mut album) => {
                counter.decrement_attempts();
                let album_dir = self.album_dir(dir, &album.title).await?;
                info!(title = %album.title, dir = %album_dir.display(), "album resolved");
                self.observer.on_album(&album.title, &album_dir);

                let child_scope = Scope { route, crawler };
                while let Some(child) = album.children.next().await {
                    match child {
                        Ok(child_url) => {
                            Box::pin(self.visit(&child_url, Some(&child_scope), &album_dir, counter))
                                .await?;
                        }
                        Err(error) => {
                            counter.increment_attempts();
                            let error = TaskError::from(error);
                            if error.is_fatal() {
                                return Err(error);
                            }
                            self.report(&album.source_url, &error);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Creates the album directory: sanitized title, then the default name,
    /// then numbered default names.
    async fn album_dir(&self, parent: &Path, title: &str) -> Result<PathBuf, TaskError> {
        let fs = self.downloader.file_system();
        let preferred = album_dir_name(title);
        let fallbacks = std::iter::once(DEFAULT_ALBUM_NAME.to_string())
            .chain((2..=MAX_NUMBERED_ALBUM_DIRS + 1).map(|n| format!("{DEFAULT_ALBUM_NAME} ({n})")))
            .filter(|name| *name != preferred);

        let mut candidates = std::iter::once(preferred.clone()).chain(fallbacks);
        let mut last_path = parent.join(&preferred);
        let mut last_error = None;
        for name in &mut candidates {
            let path = parent.join(&name);
            match fs.create_dir_all(&path).await {
                Ok(()) => {
                    debug!(path = %path.display(), "updated save path");
                    return Ok(path);
                }
                Err(error) => {
                    debug!(path = %path.display(), error = %error, "cannot create album directory, trying fallback");
                    last_path = path;
                    last_error = Some(error);
                }
            }
        }

        Err(TaskError::Directory {
            path: last_path,
            source: last_error
                .unwrap_or_else(|| std::io::Error::other("no album directory candidates")),
        })
    }

    fn report(&self, url: &Url, error: &TaskError) {
        warn!(url = %url, error = %error, "task failed");
        self.observer.on_failure(url, error);
    }
}
