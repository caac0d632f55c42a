use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::application::ports::{
    AudioError, AudioProbe, AudioSlicer, ChunkSpan, ModelError, ModelKey, SpeechModel,
};
use crate::application::services::{JobBudget, ModelRegistry};

/// Audio at or under this duration is transcribed in one call.
const SHORT_THRESHOLD_SECS: f64 = 300.0;
/// Bounds for the dynamically chosen chunk duration.
const MIN_CHUNK_SECS: f64 = 100.0;
const MAX_CHUNK_SECS: f64 = 180.0;
/// Target chunk count the dynamic duration aims for on long audio.
const CHUNK_TARGET_DIVISOR: f64 = 40.0;
/// Floors for the whole-file and per-chunk timeouts.
const WHOLE_MIN_TIMEOUT: Duration = Duration::from_secs(300);
const CHUNK_MIN_TIMEOUT: Duration = Duration::from_secs(180);
/// Timeouts scale with the duration of the audio they cover.
const TIMEOUT_FACTOR: f64 = 2.0;

/// How one file will be transcribed, decided purely from its duration.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkPlan {
    Whole {
        timeout: Duration,
    },
    Chunked {
        chunk_seconds: f64,
        spans: Vec<ChunkSpan>,
    },
}

/// Decide the chunking for `duration_seconds` of audio. Long audio is cut
/// into `ceil(duration / chunk)` spans where `chunk` is chosen so files
/// land near forty chunks without producing slivers.
pub fn plan_chunks(duration_seconds: f64) -> ChunkPlan {
    if duration_seconds <= SHORT_THRESHOLD_SECS {
        let wanted = Duration::from_secs_f64((duration_seconds * TIMEOUT_FACTOR).max(0.0));
        return ChunkPlan::Whole {
            timeout: wanted.max(WHOLE_MIN_TIMEOUT),
        };
    }

    let chunk_seconds = (duration_seconds / CHUNK_TARGET_DIVISOR).clamp(MIN_CHUNK_SECS, MAX_CHUNK_SECS);
    let count = (duration_seconds / chunk_seconds).ceil() as usize;

    let spans = (0..count)
        .map(|index| ChunkSpan {
            index,
            start: index as f64 * chunk_seconds,
            end: ((index + 1) as f64 * chunk_seconds).min(duration_seconds),
        })
        .collect();

    ChunkPlan::Chunked {
        chunk_seconds,
        spans,
    }
}

fn per_chunk_timeout(chunk_duration: f64, budget: &JobBudget) -> Duration {
    let wanted = Duration::from_secs_f64((chunk_duration * TIMEOUT_FACTOR).max(0.0));
    budget.clamp_timeout(wanted.max(CHUNK_MIN_TIMEOUT))
}

/// Chunked, failure-tolerant transcription over a bounded worker pool. A
/// single chunk failing or timing out contributes an empty slot; the job
/// as a whole fails only when every chunk does. Output is reassembled in
/// chunk index order regardless of completion order.
pub struct TranscriptionEngine {
    registry: Arc<ModelRegistry>,
    slicer: Arc<dyn AudioSlicer>,
    model_key: ModelKey,
    max_parallel_chunks: usize,
    work_dir: PathBuf,
}

impl TranscriptionEngine {
    pub fn new(
        registry: Arc<ModelRegistry>,
        slicer: Arc<dyn AudioSlicer>,
        model_key: ModelKey,
        max_parallel_chunks: usize,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            registry,
            slicer,
            model_key,
            max_parallel_chunks,
            work_dir,
        }
    }

    pub async fn probe(&self, audio: &Path) -> Result<AudioProbe, AudioError> {
        self.slicer.probe(audio).await
    }

    /// Transcribe `audio` and remove it (and any chunk files) on every exit
    /// path.
    pub async fn transcribe(
        &self,
        audio: &Path,
        duration_seconds: f64,
        budget: &JobBudget,
    ) -> Result<String, EngineError> {
        let model = match self.registry.acquire(self.model_key).await {
            Ok(model) => model,
            Err(e) => {
                remove_file_quiet(audio);
                remove_parent_if_empty(audio);
                return Err(EngineError::Model(e));
            }
        };

        let outcome = match plan_chunks(duration_seconds) {
            ChunkPlan::Whole { timeout } => {
                self.transcribe_whole(model, audio, budget.clamp_timeout(timeout))
                    .await
            }
            ChunkPlan::Chunked { spans, .. } => {
                self.transcribe_chunked(model, audio, spans, budget).await
            }
        };

        remove_file_quiet(audio);
        remove_parent_if_empty(audio);

        outcome
    }

    async fn transcribe_whole(
        &self,
        model: Arc<dyn SpeechModel>,
        audio: &Path,
        timeout: Duration,
    ) -> Result<String, EngineError> {
        match tokio::time::timeout(timeout, model.transcribe(audio)).await {
            Ok(Ok(text)) => Ok(text.trim().to_string()),
            Ok(Err(e)) => Err(EngineError::Model(e)),
            Err(_) => Err(EngineError::Timeout { limit: timeout }),
        }
    }

    async fn transcribe_chunked(
        &self,
        model: Arc<dyn SpeechModel>,
        audio: &Path,
        spans: Vec<ChunkSpan>,
        budget: &JobBudget,
    ) -> Result<String, EngineError> {
        let chunk_dir = self.work_dir.join(format!("chunks_{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&chunk_dir)
            .await
            .map_err(|e| EngineError::Io(e.to_string()))?;

        let total = spans.len();
        let exported = match self.slicer.export_slices(audio, &spans, &chunk_dir).await {
            Ok(chunks) => chunks,
            Err(e) => {
                cleanup_chunk_dir(&chunk_dir, audio);
                return Err(EngineError::Audio(e));
            }
        };

        let workers = pool_size(self.max_parallel_chunks, exported.len());
        tracing::info!(
            chunks = total,
            exported = exported.len(),
            workers,
            "Transcribing audio in parallel chunks"
        );

        let semaphore = Arc::new(Semaphore::new(workers));
        let mut handles = Vec::with_capacity(exported.len());

        for chunk in exported {
            let model = Arc::clone(&model);
            let semaphore = Arc::clone(&semaphore);
            let timeout = per_chunk_timeout(chunk.duration_seconds, budget);
            let index = chunk.index;
            let path = chunk.path.clone();
            let budget = *budget;

            handles.push((
                index,
                tokio::spawn(async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => return String::new(),
                    };

                    // Cooperative soft-timeout check: a chunk whose turn
                    // comes after the soft limit yields its slot instead of
                    // racing the hard kill.
                    if budget.soft_expired() {
                        tracing::warn!(chunk = index, "Soft time limit reached, skipping chunk");
                        return String::new();
                    }

                    match tokio::time::timeout(timeout, model.transcribe(&path)).await {
                        Ok(Ok(text)) => text.trim().to_string(),
                        Ok(Err(e)) => {
                            tracing::warn!(chunk = index, error = %e, "Chunk transcription failed");
                            String::new()
                        }
                        Err(_) => {
                            tracing::warn!(chunk = index, limit = ?timeout, "Chunk transcription timed out");
                            String::new()
                        }
                    }
                }),
            ));
        }

        // Collect by original chunk index; the pool finishes chunks in
        // whatever order it likes.
        let mut slots = vec![String::new(); total];
        for (index, handle) in handles {
            match handle.await {
                Ok(text) => slots[index] = text,
                Err(e) => {
                    tracing::error!(chunk = index, error = %e, "Chunk task panicked");
                }
            }
        }

        cleanup_chunk_dir(&chunk_dir, audio);

        let parts: Vec<&str> = slots
            .iter()
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
            .collect();

        if parts.is_empty() {
            return Err(EngineError::AllChunksFailed { chunks: total });
        }

        tracing::info!(chunks = total, succeeded = parts.len(), "All audio chunks processed");
        Ok(parts.join("\n"))
    }
}

fn pool_size(configured_max: usize, chunk_count: usize) -> usize {
    let core_ceiling = std::thread::available_parallelism()
        .map(|n| (n.get() / 2).max(2))
        .unwrap_or(2);
    configured_max.min(chunk_count).min(core_ceiling).max(1)
}

/// Remove the chunk directory and everything in it. When the source file
/// itself sits inside the directory it goes with it, and the caller's own
/// removal finds nothing left to delete.
fn cleanup_chunk_dir(chunk_dir: &Path, source: &Path) {
    if source.starts_with(chunk_dir) {
        tracing::debug!(path = %source.display(), "Source file lives in chunk dir, removed with it");
    }
    if let Err(e) = std::fs::remove_dir_all(chunk_dir) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %chunk_dir.display(), error = %e, "Failed to clean chunk dir");
        }
    }
}

fn remove_file_quiet(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "Failed to delete file");
        }
    }
}

fn remove_parent_if_empty(path: &Path) {
    let Some(parent) = path.parent() else {
        return;
    };
    match std::fs::read_dir(parent) {
        Ok(mut entries) => {
            if entries.next().is_none() {
                let _ = std::fs::remove_dir(parent);
            }
        }
        Err(_) => {}
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("audio: {0}")]
    Audio(AudioError),
    #[error("model: {0}")]
    Model(ModelError),
    #[error("transcription timed out after {limit:?}")]
    Timeout { limit: Duration },
    #[error("all {chunks} chunks failed to transcribe")]
    AllChunksFailed { chunks: usize },
    #[error("io: {0}")]
    Io(String),
}
