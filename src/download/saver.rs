//! Streaming file downloader.
//!
//! Opens a streaming GET on the file's stream URL and writes the body in
//! fixed-size chunks. Out-of-space conditions are reported as
//! [`DownloadError::DeviceFull`]. A broken body stream restarts the file
//! under the client's retry policy. Partial files are removed when a save
//! fails.

use std::path::Path;
use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};

use super::error::DownloadError;
use super::fs::{FileSystem, FileWriter, TokioFileSystem};
use super::progress::DownloadProgress;
use crate::http::{FetchError, HttpClient, RetryDecision, classify_error};
use crate::media::MediaFile;

/// Size of one write (8 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 8;

/// Settings for a [`Downloader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloaderConfig {
    /// Bytes per write; zero is treated as one.
    pub chunk_size: usize,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Saves resolved files to disk.
pub struct Downloader {
    chunk_size: usize,
    fs: Arc<dyn FileSystem>,
}

impl std::fmt::Debug for Downloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Downloader")
            .field("chunk_size", &self.chunk_size)
            .finish_non_exhaustive()
    }
}

impl Default for Downloader {
    fn default() -> Self {
        Self::new(DownloaderConfig::default(), Arc::new(TokioFileSystem::new()))
    }
}

impl Downloader {
    /// Creates a downloader writing through `fs`.
    #[must_use]
    pub fn new(config: DownloaderConfig, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            chunk_size: config.chunk_size.max(1),
            fs,
        }
    }

    /// Returns the configured chunk size.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the file system this downloader writes through.
    #[must_use]
    pub fn file_system(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    /// Downloads `file` into `dir` as `<stem><ext>`, returning bytes written.
    ///
    /// On success `file` is marked downloaded.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::Fetch`] when the stream request fails
    /// - [`DownloadError::FileOpen`] when the destination cannot be created
    /// - [`DownloadError::DeviceFull`] when the disk runs out of space
    /// - [`DownloadError::Write`] for other write failures
    /// - [`DownloadError::Interrupted`] when the body keeps breaking
    #[instrument(skip(self, client, file, progress), fields(url = %file.stream_url))]
    pub async fn save<P>(
        &self,
        client: &HttpClient,
        file: &mut MediaFile,
        dir: &Path,
        progress: &P,
    ) -> Result<u64, DownloadError>
    where
        P: DownloadProgress + ?Sized,
    {
        let path = dir.join(file.filename.to_string());
        let name = file.filename.to_string();
        let policy = client.retry_policy();
        let mut attempt = 1;

        loop {
            let error = match self.save_once(client, file, &path, &name, progress).await {
                Ok(bytes) => {
                    file.mark_downloaded();
                    info!(path = %path.display(), bytes, "download complete");
                    progress.on_file_complete(&name, bytes);
                    return Ok(bytes);
                }
                Err(error) => error,
            };
            progress.on_error(&name, &error.to_string());

            let DownloadError::Interrupted { source, .. } = &error else {
                return Err(error);
            };
            match policy.should_retry(classify_error(source), attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next_attempt,
                } => {
                    warn!(
                        path = %path.display(),
                        next_attempt,
                        delay_secs = delay.as_secs(),
                        error = %error,
                        "download interrupted, restarting"
                    );
                    client.sleep(delay).await;
                    attempt = next_attempt;
                }
                RetryDecision::DoNotRetry { reason } => {
                    warn!(path = %path.display(), reason = %reason, "giving up on download");
                    return Err(error);
                }
            }
        }
    }

    async fn save_once<P>(
        &self,
        client: &HttpClient,
        file: &MediaFile,
        path: &Path,
        name: &str,
        progress: &P,
    ) -> Result<u64, DownloadError>
    where
        P: DownloadProgress + ?Sized,
    {
        let response = client.fetch(&file.stream_url).await?;
        let total = response.content_length();
        debug!(path = %path.display(), ?total, "response received");

        let mut writer = self
            .fs
            .create_file(path)
            .await
            .map_err(|e| DownloadError::file_open(path, e))?;
        progress.on_file_start(name, total);

        let url = file.stream_url.clone();
        let stream = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| client.map_reqwest_error(&url, e))
        });
        let result = write_chunks(
            stream,
            &mut writer,
            self.chunk_size,
            path,
            file.stream_url.as_str(),
            |delta| progress.on_progress(name, delta),
        )
        .await;
        drop(writer);

        if result.is_err() {
            debug!(path = %path.display(), "cleaning up partial file after error");
            let _ = self.fs.remove_file(path).await;
        }
        result
    }
}

/// Re-chunks `stream` into writes of exactly `chunk_size` bytes (the last
/// one may be shorter), flushing at the end.
async fn write_chunks<S, B, F>(
    stream: S,
    writer: &mut FileWriter,
    chunk_size: usize,
    path: &Path,
    url: &str,
    mut on_chunk: F,
) -> Result<u64, DownloadError>
where
    S: Stream<Item = Result<B, FetchError>>,
    B: AsRef<[u8]>,
    F: FnMut(u64),
{
    let mut stream = std::pin::pin!(stream);
    let mut pending: Vec<u8> = Vec::with_capacity(chunk_size);
    let mut written: u64 = 0;

    while let Some(next) = stream.next().await {
        let bytes = next.map_err(|e| DownloadError::interrupted(url, e))?;
        let mut data = bytes.as_ref();
        while !data.is_empty() {
            let take = (chunk_size - pending.len()).min(data.len());
            pending.extend_from_slice(&data[..take]);
            data = &data[take..];
            if pending.len() == chunk_size {
                writer
                    .write_all(&pending)
                    .await
                    .map_err(|e| DownloadError::write(path, e))?;
                written += pending.len() as u64;
                on_chunk(pending.len() as u64);
                pending.clear();
            }
        }
    }

    if !pending.is_empty() {
        writer
            .write_all(&pending)
            .await
            .map_err(|e| DownloadError::write(path, e))?;
        written += pending.len() as u64;
        on_chunk(pending.len() as u64);
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::write(path, e))?;

    Ok(written)
}
