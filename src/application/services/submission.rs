use std::sync::Arc;

use tokio::sync::mpsc;

use crate::application::ports::{JobStore, JobStoreError, ResultCache};
use crate::application::services::JobMessage;
use crate::domain::{
    AccountId, ExtractionJob, ExtractionRequest, JobHandle, NormalizedContent, NormalizedUrl,
    Platform, UrlError,
};

/// What a submission resolves to: either the cached payload, answered
/// inline with no job at all, or a queued stage-1 job to poll.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    CachedContent(NormalizedContent),
    Enqueued(JobHandle),
}

/// Front door of the pipeline: URL cleaning, platform check, cache
/// fast-path, duplicate collapse, job creation and enqueue.
pub struct SubmissionService {
    cache: Arc<dyn ResultCache>,
    job_store: Arc<dyn JobStore>,
    sender: mpsc::Sender<JobMessage>,
}

impl SubmissionService {
    pub fn new(
        cache: Arc<dyn ResultCache>,
        job_store: Arc<dyn JobStore>,
        sender: mpsc::Sender<JobMessage>,
    ) -> Self {
        Self {
            cache,
            job_store,
            sender,
        }
    }

    pub async fn submit(
        &self,
        raw_url: &str,
        want_transcript: bool,
        want_comments: bool,
        account_id: AccountId,
        trace_id: String,
    ) -> Result<SubmitOutcome, SubmitError> {
        let url = NormalizedUrl::parse(raw_url)?;

        if Platform::from_url(url.as_str()).is_none() {
            return Err(SubmitError::UnsupportedPlatform(url.to_string()));
        }

        match self.cache.get(&url).await {
            Ok(Some(content)) => {
                tracing::info!(url = %url, "Submission answered from result cache");
                return Ok(SubmitOutcome::CachedContent(content));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Result cache read failed on submit");
            }
        }

        // Concurrent duplicates of the same URL collapse onto the live job
        // instead of spawning a second adapter call and download.
        if let Some(existing) = self.job_store.find_active_extraction(&url).await? {
            tracing::info!(
                url = %url,
                job_id = %existing.id,
                "Duplicate submission collapsed onto running job"
            );
            return Ok(SubmitOutcome::Enqueued(existing.handle()));
        }

        let request = ExtractionRequest {
            source_url: raw_url.to_string(),
            want_transcript,
            want_comments,
            account_id,
            trace_id,
        };
        let job = ExtractionJob::new(request, url);
        let handle = job.handle();

        self.job_store.create_extraction(&job).await?;

        if self
            .sender
            .send(JobMessage { job_id: job.id })
            .await
            .is_err()
        {
            return Err(SubmitError::QueueUnavailable);
        }

        tracing::info!(job_id = %job.id, "Extraction job enqueued");
        Ok(SubmitOutcome::Enqueued(handle))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] UrlError),
    #[error("unsupported platform for url: {0}")]
    UnsupportedPlatform(String),
    #[error("job store: {0}")]
    Store(#[from] JobStoreError),
    #[error("extraction queue full or worker unavailable")]
    QueueUnavailable,
}
