use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::Instrument;

use crate::application::ports::{JobStore, JobStoreError};
use crate::application::services::{ExtractionStage, JobBudget, TranscriptionStage};
use crate::domain::{JobId, QueueState};

/// Queue delivery of one job id. Workers re-read the job record on
/// receipt, so a redelivered message finds the current state instead of a
/// stale snapshot.
#[derive(Debug, Clone, Copy)]
pub struct JobMessage {
    pub job_id: JobId,
}

/// Drains the extraction lane. One message is one at-least-once delivery;
/// a job already in a terminal state is acknowledged without re-running.
pub struct ExtractionWorker {
    receiver: mpsc::Receiver<JobMessage>,
    job_store: Arc<dyn JobStore>,
    stage: Arc<ExtractionStage>,
    soft_timeout: Duration,
    hard_timeout: Duration,
}

impl ExtractionWorker {
    pub fn new(
        receiver: mpsc::Receiver<JobMessage>,
        job_store: Arc<dyn JobStore>,
        stage: Arc<ExtractionStage>,
        soft_timeout: Duration,
        hard_timeout: Duration,
    ) -> Self {
        Self {
            receiver,
            job_store,
            stage,
            soft_timeout,
            hard_timeout,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("Extraction worker started");
        while let Some(msg) = self.receiver.recv().await {
            let span = tracing::info_span!("extraction_job", job_id = %msg.job_id);

            if let Err(e) = self.process(msg.job_id).instrument(span).await {
                tracing::error!(error = %e, "Extraction job processing failed");
            }
        }
        tracing::info!("Extraction worker stopped: channel closed");
    }

    async fn process(&self, job_id: JobId) -> Result<(), JobStoreError> {
        let Some(job) = self.job_store.get_extraction(job_id).await? else {
            tracing::warn!(job_id = %job_id, "Extraction message for unknown job");
            return Ok(());
        };

        if job.state.is_terminal() {
            tracing::debug!(job_id = %job_id, state = %job.state, "Job already terminal, skipping");
            return Ok(());
        }

        self.job_store
            .set_extraction_state(job_id, QueueState::Running, None)
            .await?;

        let budget = JobBudget::new(self.soft_timeout, self.hard_timeout);
        match tokio::time::timeout(budget.hard_limit(), self.stage.run(&job)).await {
            Ok(result) => {
                // Result first, then the terminal state: a poll that sees
                // COMPLETED must find the result already recorded.
                self.job_store.record_stage_one(job_id, &result).await?;
                self.job_store
                    .set_extraction_state(job_id, QueueState::Completed, None)
                    .await?;
                tracing::info!(job_id = %job_id, "Extraction job completed");
            }
            Err(_) => {
                self.job_store
                    .set_extraction_state(
                        job_id,
                        QueueState::Failed,
                        Some("job exceeded hard time limit"),
                    )
                    .await?;
                tracing::error!(job_id = %job_id, "Extraction job hit hard time limit");
            }
        }

        Ok(())
    }
}

/// Drains the transcription lane.
pub struct TranscriptionWorker {
    receiver: mpsc::Receiver<JobMessage>,
    job_store: Arc<dyn JobStore>,
    stage: Arc<TranscriptionStage>,
    soft_timeout: Duration,
    hard_timeout: Duration,
}

impl TranscriptionWorker {
    pub fn new(
        receiver: mpsc::Receiver<JobMessage>,
        job_store: Arc<dyn JobStore>,
        stage: Arc<TranscriptionStage>,
        soft_timeout: Duration,
        hard_timeout: Duration,
    ) -> Self {
        Self {
            receiver,
            job_store,
            stage,
            soft_timeout,
            hard_timeout,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("Transcription worker started");
        while let Some(msg) = self.receiver.recv().await {
            let span = tracing::info_span!("transcription_job", job_id = %msg.job_id);

            if let Err(e) = self.process(msg.job_id).instrument(span).await {
                tracing::error!(error = %e, "Transcription job processing failed");
            }
        }
        tracing::info!("Transcription worker stopped: channel closed");
    }

    async fn process(&self, job_id: JobId) -> Result<(), JobStoreError> {
        let Some(job) = self.job_store.get_transcription(job_id).await? else {
            tracing::warn!(job_id = %job_id, "Transcription message for unknown job");
            return Ok(());
        };

        if job.state.is_terminal() {
            tracing::debug!(job_id = %job_id, state = %job.state, "Job already terminal, skipping");
            return Ok(());
        }

        self.job_store
            .set_transcription_state(job_id, QueueState::Running, None)
            .await?;

        let budget = JobBudget::new(self.soft_timeout, self.hard_timeout);
        match tokio::time::timeout(budget.hard_limit(), self.stage.run(&job, &budget)).await {
            Ok(result) => {
                self.job_store.record_stage_two(job_id, &result).await?;
                self.job_store
                    .set_transcription_state(job_id, QueueState::Completed, None)
                    .await?;
                tracing::info!(job_id = %job_id, "Transcription job completed");
            }
            Err(_) => {
                self.job_store
                    .set_transcription_state(
                        job_id,
                        QueueState::Failed,
                        Some("job exceeded hard time limit"),
                    )
                    .await?;
                tracing::error!(job_id = %job_id, "Transcription job hit hard time limit");
            }
        }

        Ok(())
    }
}
