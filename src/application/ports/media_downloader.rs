use async_trait::async_trait;

use crate::domain::StoragePath;

/// Fetches a remote media URL into the shared store. Not retried here:
/// retrying the whole stage-1 job is the queue's responsibility.
#[async_trait]
pub trait MediaDownloader: Send + Sync {
    async fn download(&self, url: &str, dest: &StoragePath) -> Result<u64, DownloadError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("download request failed: {0}")]
    Request(String),
    #[error("downloaded file is empty: {0}")]
    EmptyFile(String),
    #[error("storing download failed: {0}")]
    Store(String),
}
