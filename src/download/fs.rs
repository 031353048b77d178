//! File system abstraction for testability.

use std::io;
use std::path::Path;

use async_trait::async_trait;
use tokio::io::AsyncWrite;

/// Writable handle returned by [`FileSystem::create_file`].
pub type FileWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Abstraction over file system operations for testability.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Creates all directories in the given path.
    async fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Creates (or truncates) a file for writing.
    async fn create_file(&self, path: &Path) -> io::Result<FileWriter>;

    /// Removes a file.
    async fn remove_file(&self, path: &Path) -> io::Result<()>;
}

/// Default file system implementation using `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileSystem;

impl TokioFileSystem {
    /// Creates a new `TokioFileSystem` instance.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileSystem for TokioFileSystem {
    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(path).await
    }

    async fn create_file(&self, path: &Path) -> io::Result<FileWriter> {
        let file = tokio::fs::File::create(path).await?;
        Ok(Box::new(file))
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_file(path).await
    }
}
