use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::ports::{CacheError, ResultCache};
use crate::domain::{NormalizedContent, NormalizedUrl};

struct Entry {
    content: NormalizedContent,
    expires_at: Instant,
}

/// In-process TTL cache keyed by normalized URL. Expired entries are swept
/// lazily on access; writes are idempotent by key.
pub struct MemoryResultCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryResultCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryResultCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultCache for MemoryResultCache {
    async fn get(&self, url: &NormalizedUrl) -> Result<Option<NormalizedContent>, CacheError> {
        let now = Instant::now();

        {
            let entries = self.entries.read().await;
            match entries.get(url.as_str()) {
                Some(entry) if entry.expires_at > now => {
                    return Ok(Some(entry.content.clone()));
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Entry was present but expired: drop it under the write lock.
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(url.as_str()) {
            if entry.expires_at <= now {
                entries.remove(url.as_str());
            } else {
                return Ok(Some(entry.content.clone()));
            }
        }
        Ok(None)
    }

    async fn put(
        &self,
        url: &NormalizedUrl,
        content: &NormalizedContent,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        entries.insert(
            url.as_str().to_string(),
            Entry {
                content: content.clone(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }
}
