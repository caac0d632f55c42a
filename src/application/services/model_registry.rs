use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::application::ports::{DeviceKind, ModelError, ModelKey, SpeechModel, SpeechModelLoader};

/// Explicit, injected cache of loaded speech models, keyed by
/// (size, device, precision). The first acquire for a key loads the model
/// under the registry mutex and keeps it for the life of the worker
/// process; a GPU out-of-memory load falls back once to the CPU/f32 key
/// and caches that instead. Teardown happens with the owning process, not
/// per job.
pub struct ModelRegistry {
    loader: Box<dyn SpeechModelLoader>,
    models: Mutex<HashMap<ModelKey, Arc<dyn SpeechModel>>>,
}

impl ModelRegistry {
    pub fn new(loader: Box<dyn SpeechModelLoader>) -> Self {
        Self {
            loader,
            models: Mutex::new(HashMap::new()),
        }
    }

    pub async fn acquire(&self, key: ModelKey) -> Result<Arc<dyn SpeechModel>, ModelError> {
        // Loading happens while the lock is held so each key loads at most
        // once per process.
        let mut models = self.models.lock().await;

        if let Some(model) = models.get(&key) {
            return Ok(Arc::clone(model));
        }

        match self.loader.load(&key) {
            Ok(model) => {
                tracing::info!(model = %key, "Speech model loaded");
                models.insert(key, Arc::clone(&model));
                Ok(model)
            }
            Err(ModelError::OutOfMemory(msg)) if key.device == DeviceKind::Cuda => {
                tracing::warn!(
                    model = %key,
                    error = %msg,
                    "GPU out of memory, falling back to CPU"
                );

                let fallback = key.cpu_fallback();
                let model = match models.get(&fallback) {
                    Some(model) => Arc::clone(model),
                    None => {
                        let model = self.loader.load(&fallback)?;
                        tracing::info!(model = %fallback, "Fallback speech model loaded");
                        models.insert(fallback, Arc::clone(&model));
                        model
                    }
                };

                // Alias the requested key so later acquires skip the OOM
                // retry.
                models.insert(key, Arc::clone(&model));
                Ok(model)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn loaded_keys(&self) -> Vec<ModelKey> {
        self.models.lock().await.keys().copied().collect()
    }

    /// Drop every cached model. Called when the worker process shuts down.
    pub async fn shutdown(&self) {
        self.models.lock().await.clear();
    }
}
