use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

/// A loaded speech-to-text model. Implementations that are not safe for
/// concurrent inference must serialize calls internally; callers treat the
/// instance as shared and read-only.
#[async_trait]
pub trait SpeechModel: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> Result<String, ModelError>;
}

impl fmt::Debug for dyn SpeechModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SpeechModel")
    }
}

/// Loads a model for a key. Heavy; the registry calls this under its load
/// mutex so each key is loaded at most once per process.
pub trait SpeechModelLoader: Send + Sync {
    fn load(&self, key: &ModelKey) -> Result<std::sync::Arc<dyn SpeechModel>, ModelError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSize {
    Tiny,
    Base,
    Small,
    Medium,
}

impl ModelSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSize::Tiny => "tiny",
            ModelSize::Base => "base",
            ModelSize::Small => "small",
            ModelSize::Medium => "medium",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Cuda,
    Cpu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    F16,
    F32,
}

/// Identity of one model instance in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelKey {
    pub size: ModelSize,
    pub device: DeviceKind,
    pub precision: Precision,
}

impl ModelKey {
    /// The key used when a GPU load runs out of memory: same size, CPU
    /// device, full precision.
    pub fn cpu_fallback(&self) -> Self {
        Self {
            size: self.size,
            device: DeviceKind::Cpu,
            precision: Precision::F32,
        }
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{:?}/{:?}",
            self.size.as_str(),
            self.device,
            self.precision
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model loading failed: {0}")]
    LoadFailed(String),
    #[error("device out of memory: {0}")]
    OutOfMemory(String),
    #[error("audio decoding failed: {0}")]
    DecodingFailed(String),
    #[error("transcription failed: {0}")]
    TranscriptionFailed(String),
}
