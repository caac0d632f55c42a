use std::path::{Path, PathBuf};

use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioProbe {
    pub duration_seconds: f64,
    pub sample_rate: u32,
}

/// One time-bounded span of the source audio, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkSpan {
    pub index: usize,
    pub start: f64,
    pub end: f64,
}

/// A span exported to its own file. Spans whose exported slice falls under
/// the noise floor are not returned at all.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedChunk {
    pub index: usize,
    pub path: PathBuf,
    pub duration_seconds: f64,
}

/// Duration probing and time-bounded slice export for downloaded media.
#[async_trait]
pub trait AudioSlicer: Send + Sync {
    async fn probe(&self, audio: &Path) -> Result<AudioProbe, AudioError>;

    async fn export_slices(
        &self,
        audio: &Path,
        spans: &[ChunkSpan],
        dest_dir: &Path,
    ) -> Result<Vec<ExportedChunk>, AudioError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("audio decoding failed: {0}")]
    DecodingFailed(String),
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
    #[error("slice export failed: {0}")]
    ExportFailed(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
