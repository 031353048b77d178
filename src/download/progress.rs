//! Progress callbacks for file downloads.

/// Trait for receiving download progress updates.
///
/// All methods have default no-op implementations for convenience.
pub trait DownloadProgress: Send + Sync {
    /// Called when the response arrived; `total` is the advisory content-length.
    fn on_file_start(&self, _name: &str, _total: Option<u64>) {}

    /// Called after each chunk is written.
    fn on_progress(&self, _name: &str, _bytes_delta: u64) {}

    /// Called when a file was written completely.
    fn on_file_complete(&self, _name: &str, _bytes: u64) {}

    /// Called when a transfer attempt fails (including ones that will be retried).
    fn on_error(&self, _name: &str, _error: &str) {}
}

/// A null progress implementation that ignores all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl DownloadProgress for NoProgress {}
