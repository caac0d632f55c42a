use async_trait::async_trait;

use crate::domain::{JobHandle, TranscriptionJobSpec};

/// Hands a transcription job to the queue. Stage-1 calls this exactly once
/// per `Pending` result.
#[async_trait]
pub trait TranscriptionDispatcher: Send + Sync {
    async fn dispatch(&self, spec: TranscriptionJobSpec) -> Result<JobHandle, DispatchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("transcription queue full or worker unavailable")]
    QueueUnavailable,
    #[error("recording transcription job failed: {0}")]
    Store(String),
}
