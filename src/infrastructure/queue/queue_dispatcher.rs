use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::application::ports::{DispatchError, JobStore, TranscriptionDispatcher};
use crate::application::services::JobMessage;
use crate::domain::{JobHandle, TranscriptionJob, TranscriptionJobSpec};

/// Hands a transcription job to the in-process queue: record first, then
/// signal the worker lane. A job that is recorded but never signalled is
/// visible to operators; a signal without a record would be lost work.
pub struct QueueDispatcher {
    job_store: Arc<dyn JobStore>,
    sender: mpsc::Sender<JobMessage>,
}

impl QueueDispatcher {
    pub fn new(job_store: Arc<dyn JobStore>, sender: mpsc::Sender<JobMessage>) -> Self {
        Self { job_store, sender }
    }
}

#[async_trait]
impl TranscriptionDispatcher for QueueDispatcher {
    async fn dispatch(&self, spec: TranscriptionJobSpec) -> Result<JobHandle, DispatchError> {
        let job = TranscriptionJob::new(spec);
        let handle = job.handle();

        self.job_store
            .create_transcription(&job)
            .await
            .map_err(|e| DispatchError::Store(e.to_string()))?;

        self.sender
            .send(JobMessage { job_id: job.id })
            .await
            .map_err(|_| DispatchError::QueueUnavailable)?;

        Ok(handle)
    }
}
