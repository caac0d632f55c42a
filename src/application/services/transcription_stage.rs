use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{Ledger, MediaStore, ResultCache};
use crate::application::services::{
    AdmissionController, JobBudget, TranscriptionEngine,
};
use crate::domain::{
    estimate_cost, realized_cost, NormalizedContent, NormalizedUrl, StageTwoResult,
    TranscriptionJob,
};

/// Stage-2: re-validate admission against the real downloaded duration,
/// run the transcription engine, commit the realized cost, write the
/// result cache. On failure nothing is charged and nothing is cached, so a
/// retry or resubmission starts from scratch.
pub struct TranscriptionStage {
    cache: Arc<dyn ResultCache>,
    admission: Arc<AdmissionController>,
    ledger: Arc<dyn Ledger>,
    media_store: Arc<dyn MediaStore>,
    engine: Arc<TranscriptionEngine>,
    cache_ttl: Duration,
}

impl TranscriptionStage {
    pub fn new(
        cache: Arc<dyn ResultCache>,
        admission: Arc<AdmissionController>,
        ledger: Arc<dyn Ledger>,
        media_store: Arc<dyn MediaStore>,
        engine: Arc<TranscriptionEngine>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            cache,
            admission,
            ledger,
            media_store,
            engine,
            cache_ttl,
        }
    }

    pub async fn run(&self, job: &TranscriptionJob, budget: &JobBudget) -> StageTwoResult {
        let spec = &job.spec;

        // A redelivered job whose earlier attempt already completed must
        // not transcribe (or charge) again.
        match self.cache.get(&spec.normalized_url).await {
            Ok(Some(content)) => {
                tracing::info!(job_id = %job.id, url = %spec.normalized_url, "Result cache hit");
                self.discard_source(job).await;
                return StageTwoResult::Success {
                    content,
                    realized_cost: 0,
                };
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Result cache read failed, doing the real work");
            }
        }

        let audio = self.media_store.resolve(&spec.audio_path);

        let duration = match self.engine.probe(&audio).await {
            Ok(probe) => probe.duration_seconds,
            Err(e) => {
                self.discard_source(job).await;
                return StageTwoResult::Failed {
                    reason: e.to_string(),
                };
            }
        };
        tracing::info!(job_id = %job.id, duration, "Probed downloaded audio duration");

        // Re-admission with the real duration. The download already
        // happened; denial spends no further compute.
        let required = estimate_cost(duration);
        if let Err(e) = self
            .admission
            .require(spec.account_id, required)
            .await
        {
            tracing::warn!(job_id = %job.id, error = %e, "Transcription admission denied");
            self.discard_source(job).await;
            return StageTwoResult::Failed {
                reason: e.to_string(),
            };
        }

        // The engine removes the source file and its chunk files on every
        // exit path from here on.
        match self.engine.transcribe(&audio, duration, budget).await {
            Ok(transcript) => {
                let mut content: NormalizedContent =
                    spec.metadata.clone().with_transcript(transcript);
                content.media.duration_seconds = Some(duration);

                let realized = realized_cost(duration);
                self.commit_cost(job, realized).await;
                self.write_cache(&spec.normalized_url, &content).await;

                StageTwoResult::Success {
                    content,
                    realized_cost: realized,
                }
            }
            Err(e) => {
                tracing::warn!(job_id = %job.id, error = %e, "Transcription failed");
                StageTwoResult::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// A ledger failure after a successful transcription is an operational
    /// alert, not a user-facing error: the content is still returned and
    /// reconciliation happens out of band.
    async fn commit_cost(&self, job: &TranscriptionJob, realized: u32) {
        if realized == 0 {
            return;
        }
        let idempotency_key = format!("{}:transcription", job.id);
        match self
            .ledger
            .charge(job.spec.account_id, realized, &idempotency_key)
            .await
        {
            Ok(receipt) => {
                tracing::info!(
                    job_id = %job.id,
                    charged = receipt.charged,
                    new_balance = receipt.new_balance,
                    "Realized transcription cost committed"
                );
            }
            Err(e) => {
                tracing::error!(
                    job_id = %job.id,
                    credits = realized,
                    error = %e,
                    "Ledger commit failed after successful transcription, needs out-of-band reconciliation"
                );
            }
        }
    }

    async fn write_cache(&self, url: &NormalizedUrl, content: &NormalizedContent) {
        if let Err(e) = self.cache.put(url, content, self.cache_ttl).await {
            tracing::warn!(error = %e, url = %url, "Result cache write failed");
        }
    }

    async fn discard_source(&self, job: &TranscriptionJob) {
        if let Err(e) = self.media_store.delete(&job.spec.audio_path).await {
            tracing::warn!(
                job_id = %job.id,
                path = %job.spec.audio_path,
                error = %e,
                "Failed to delete downloaded media"
            );
        }
    }
}
