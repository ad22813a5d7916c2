//! Raw storage primitive
//!
//! Persistence depends only on this narrow contract: append a line, read a
//! file's lines, ensure a directory, list a directory. Keeping it behind a
//! trait lets tests substitute a failing or instrumented implementation.

use std::io;
use std::path::Path;

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Append text to a file, creating it if needed.
    async fn append(&self, path: &Path, text: &str) -> io::Result<()>;

    /// Read all lines of a file.
    async fn read_lines(&self, path: &Path) -> io::Result<Vec<String>>;

    /// Create a directory (and parents) if missing. Returns whether anything
    /// was created. Safe to call concurrently for the same path.
    async fn ensure_dir(&self, path: &Path) -> io::Result<bool>;

    /// File and directory names directly under a path.
    async fn list_dir(&self, path: &Path) -> io::Result<Vec<String>>;
}

/// Filesystem-backed storage
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

#[async_trait]
impl Storage for FsStorage {
    async fn append(&self, path: &Path, text: &str) -> io::Result<()> {
        tracing::debug!(path = %path.display(), "appending to log file");
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn read_lines(&self, path: &Path) -> io::Result<Vec<String>> {
        let contents = fs::read_to_string(path).await?;
        Ok(contents.lines().map(str::to_string).collect())
    }

    async fn ensure_dir(&self, path: &Path) -> io::Result<bool> {
        if fs::try_exists(path).await? {
            return Ok(false);
        }
        // create_dir_all tolerates the directory appearing between the
        // existence check and the create
        fs::create_dir_all(path).await?;
        Ok(true)
    }

    async fn list_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(path).await?;
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}
