use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{NormalizedContent, NormalizedUrl};

/// Short-TTL store keyed by normalized source URL. This is what turns the
/// queue's at-least-once delivery into at-most-once work for duplicate
/// submissions: both stage entry points consult it before doing anything
/// expensive.
#[async_trait]
pub trait ResultCache: Send + Sync {
    async fn get(&self, url: &NormalizedUrl) -> Result<Option<NormalizedContent>, CacheError>;

    async fn put(
        &self,
        url: &NormalizedUrl,
        content: &NormalizedContent,
        ttl: Duration,
    ) -> Result<(), CacheError>;
}

/// Cache failures never fail a request; callers log and fall back to doing
/// the real work.
#[derive(Debug, thiserror::Error)]
#[error("cache error: {0}")]
pub struct CacheError(pub String);
