use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::application::ports::{JobStore, JobStoreError};
use crate::domain::{
    ExtractionJob, JobId, NormalizedUrl, QueueState, StageOneResult, StageTwoResult,
    TranscriptionJob,
};

/// In-process job store for development and tests. State transitions and
/// the settlement compare-and-set happen under one write lock, so readers
/// never observe a result-less COMPLETED job.
pub struct MemoryJobStore {
    extractions: RwLock<HashMap<JobId, ExtractionJob>>,
    transcriptions: RwLock<HashMap<JobId, TranscriptionJob>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self {
            extractions: RwLock::new(HashMap::new()),
            transcriptions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create_extraction(&self, job: &ExtractionJob) -> Result<(), JobStoreError> {
        self.extractions.write().await.insert(job.id, job.clone());
        Ok(())
    }

    async fn get_extraction(&self, id: JobId) -> Result<Option<ExtractionJob>, JobStoreError> {
        Ok(self.extractions.read().await.get(&id).cloned())
    }

    async fn find_active_extraction(
        &self,
        url: &NormalizedUrl,
    ) -> Result<Option<ExtractionJob>, JobStoreError> {
        let extractions = self.extractions.read().await;
        Ok(extractions
            .values()
            .find(|job| &job.normalized_url == url && !job.state.is_terminal())
            .cloned())
    }

    async fn set_extraction_state(
        &self,
        id: JobId,
        state: QueueState,
        error: Option<&str>,
    ) -> Result<(), JobStoreError> {
        let mut extractions = self.extractions.write().await;
        let job = extractions
            .get_mut(&id)
            .ok_or_else(|| JobStoreError::NotFound(id.to_string()))?;
        job.state = state;
        job.error = error.map(str::to_string);
        job.updated_at = Utc::now();
        Ok(())
    }

    async fn record_stage_one(
        &self,
        id: JobId,
        result: &StageOneResult,
    ) -> Result<(), JobStoreError> {
        let mut extractions = self.extractions.write().await;
        let job = extractions
            .get_mut(&id)
            .ok_or_else(|| JobStoreError::NotFound(id.to_string()))?;
        job.result = Some(result.clone());
        job.updated_at = Utc::now();
        Ok(())
    }

    async fn try_settle(&self, id: JobId) -> Result<bool, JobStoreError> {
        let mut extractions = self.extractions.write().await;
        let job = extractions
            .get_mut(&id)
            .ok_or_else(|| JobStoreError::NotFound(id.to_string()))?;
        if job.settled {
            return Ok(false);
        }
        job.settled = true;
        job.updated_at = Utc::now();
        Ok(true)
    }

    async fn create_transcription(&self, job: &TranscriptionJob) -> Result<(), JobStoreError> {
        self.transcriptions
            .write()
            .await
            .insert(job.id, job.clone());
        Ok(())
    }

    async fn get_transcription(
        &self,
        id: JobId,
    ) -> Result<Option<TranscriptionJob>, JobStoreError> {
        Ok(self.transcriptions.read().await.get(&id).cloned())
    }

    async fn set_transcription_state(
        &self,
        id: JobId,
        state: QueueState,
        error: Option<&str>,
    ) -> Result<(), JobStoreError> {
        let mut transcriptions = self.transcriptions.write().await;
        let job = transcriptions
            .get_mut(&id)
            .ok_or_else(|| JobStoreError::NotFound(id.to_string()))?;
        job.state = state;
        job.error = error.map(str::to_string);
        job.updated_at = Utc::now();
        Ok(())
    }

    async fn record_stage_two(
        &self,
        id: JobId,
        result: &StageTwoResult,
    ) -> Result<(), JobStoreError> {
        let mut transcriptions = self.transcriptions.write().await;
        let job = transcriptions
            .get_mut(&id)
            .ok_or_else(|| JobStoreError::NotFound(id.to_string()))?;
        job.result = Some(result.clone());
        job.updated_at = Utc::now();
        Ok(())
    }
}
