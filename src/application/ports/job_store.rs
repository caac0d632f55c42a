use async_trait::async_trait;

use crate::domain::{
    ExtractionJob, JobId, NormalizedUrl, QueueState, StageOneResult, StageTwoResult,
    TranscriptionJob,
};

/// Durable record of both job kinds: queue state, the stage result written
/// exactly once, and the settlement flag. A stage result must be recorded
/// before the state moves to `Completed`, so readers never observe a
/// half-written outcome.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create_extraction(&self, job: &ExtractionJob) -> Result<(), JobStoreError>;

    async fn get_extraction(&self, id: JobId) -> Result<Option<ExtractionJob>, JobStoreError>;

    /// A live (non-terminal) extraction job for the same normalized URL, if
    /// any. Lets submission collapse concurrent duplicates onto one handle.
    async fn find_active_extraction(
        &self,
        url: &NormalizedUrl,
    ) -> Result<Option<ExtractionJob>, JobStoreError>;

    async fn set_extraction_state(
        &self,
        id: JobId,
        state: QueueState,
        error: Option<&str>,
    ) -> Result<(), JobStoreError>;

    async fn record_stage_one(
        &self,
        id: JobId,
        result: &StageOneResult,
    ) -> Result<(), JobStoreError>;

    /// Compare-and-set the settlement flag. Returns `true` exactly once per
    /// job; the caller performs the base-cost reconciliation only on `true`.
    async fn try_settle(&self, id: JobId) -> Result<bool, JobStoreError>;

    async fn create_transcription(&self, job: &TranscriptionJob) -> Result<(), JobStoreError>;

    async fn get_transcription(&self, id: JobId)
        -> Result<Option<TranscriptionJob>, JobStoreError>;

    async fn set_transcription_state(
        &self,
        id: JobId,
        state: QueueState,
        error: Option<&str>,
    ) -> Result<(), JobStoreError>;

    async fn record_stage_two(
        &self,
        id: JobId,
        result: &StageTwoResult,
    ) -> Result<(), JobStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum JobStoreError {
    #[error("job not found: {0}")]
    NotFound(String),
    #[error("query failed: {0}")]
    QueryFailed(String),
}
