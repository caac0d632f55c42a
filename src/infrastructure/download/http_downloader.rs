use std::io;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use crate::application::ports::{DownloadError, MediaDownloader, MediaStore};
use crate::domain::StoragePath;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/91.0.4472.114 Safari/537.36";

/// Streams a media URL into the shared store without buffering the whole
/// file in memory.
pub struct HttpMediaDownloader {
    client: reqwest::Client,
    store: Arc<dyn MediaStore>,
}

impl HttpMediaDownloader {
    pub fn new(store: Arc<dyn MediaStore>) -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(|e| DownloadError::Request(e.to_string()))?;
        Ok(Self { client, store })
    }
}

#[async_trait]
impl MediaDownloader for HttpMediaDownloader {
    async fn download(&self, url: &str, dest: &StoragePath) -> Result<u64, DownloadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::Request(e.to_string()))?
            .error_for_status()
            .map_err(|e| DownloadError::Request(e.to_string()))?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !content_type.is_empty()
            && !content_type.starts_with("audio/")
            && !content_type.starts_with("video/")
            && !content_type.starts_with("application/octet-stream")
        {
            tracing::warn!(content_type, url, "Downloaded content may not be media");
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| io::Error::other(e.to_string())));

        let bytes = self
            .store
            .store(dest, Box::pin(stream))
            .await
            .map_err(|e| DownloadError::Store(e.to_string()))?;

        if bytes == 0 {
            let _ = self.store.delete(dest).await;
            return Err(DownloadError::EmptyFile(url.to_string()));
        }

        Ok(bytes)
    }
}
