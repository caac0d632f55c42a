use async_trait::async_trait;

use crate::domain::{MediaMetadata, NormalizedUrl};

/// One source platform's API/scraping quirks, hidden behind normalized
/// metadata. Retry policy is the adapter's own business.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    async fn fetch(
        &self,
        url: &NormalizedUrl,
        want_comments: bool,
    ) -> Result<MediaMetadata, PlatformError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("unsupported platform for url: {0}")]
    Unsupported(String),
    #[error("platform fetch timed out: {0}")]
    Timeout(String),
    #[error("content not found: {0}")]
    NotFound(String),
    #[error("platform fetch failed: {0}")]
    Upstream(String),
}
