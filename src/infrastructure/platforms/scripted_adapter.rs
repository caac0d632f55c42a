use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::ports::{PlatformAdapter, PlatformError};
use crate::domain::{MediaMetadata, NormalizedUrl};

/// Platform adapter answering from a scripted URL → metadata table. The
/// real scrapers live outside this service; this stands in for them in
/// development wiring and in tests, and counts its calls so dedup
/// properties can be asserted.
pub struct ScriptedPlatformAdapter {
    responses: Mutex<HashMap<String, MediaMetadata>>,
    calls: AtomicUsize,
}

impl ScriptedPlatformAdapter {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub async fn script(&self, url: &NormalizedUrl, metadata: MediaMetadata) {
        self.responses
            .lock()
            .await
            .insert(url.as_str().to_string(), metadata);
    }

    pub fn fetch_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedPlatformAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlatformAdapter for ScriptedPlatformAdapter {
    async fn fetch(
        &self,
        url: &NormalizedUrl,
        _want_comments: bool,
    ) -> Result<MediaMetadata, PlatformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let responses = self.responses.lock().await;
        responses
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(url.to_string()))
    }
}
