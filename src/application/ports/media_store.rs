use std::io;
use std::path::PathBuf;

use bytes::Bytes;
use futures::stream::BoxStream;

use crate::domain::StoragePath;

/// Filesystem namespace shared by the extraction writer and the
/// transcription reader. `resolve` is the single path-translation point
/// between a relative `StoragePath` and this process's view of the
/// namespace; on a single host both stages see the same prefix and the
/// translation is the identity.
#[async_trait::async_trait]
pub trait MediaStore: Send + Sync {
    async fn store(
        &self,
        path: &StoragePath,
        stream: BoxStream<'_, Result<Bytes, io::Error>>,
    ) -> Result<u64, MediaStoreError>;

    async fn delete(&self, path: &StoragePath) -> Result<(), MediaStoreError>;

    async fn head(&self, path: &StoragePath) -> Result<u64, MediaStoreError>;

    fn resolve(&self, path: &StoragePath) -> PathBuf;
}

#[derive(Debug, thiserror::Error)]
pub enum MediaStoreError {
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("delete failed: {0}")]
    DeleteFailed(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
