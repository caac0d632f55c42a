use std::sync::Arc;

use serde::Serialize;

use crate::application::ports::{JobStore, JobStoreError, Ledger};
use crate::domain::{
    ExtractionJob, JobHandle, JobId, NormalizedContent, QueueState, StageOneResult,
    StageTwoResult, BASE_COST,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    Running,
    Transcribing,
    Completed,
    Failed,
}

impl ClientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientStatus::Running => "running",
            ClientStatus::Transcribing => "transcribing",
            ClientStatus::Completed => "completed",
            ClientStatus::Failed => "failed",
        }
    }
}

/// What one poll of a job handle resolves to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub job_id: JobId,
    pub status: ClientStatus,
    pub data: Option<NormalizedContent>,
    pub error: Option<String>,
    pub consumed_credits: u32,
}

/// Presents two chained background jobs as one logical job: resolves the
/// client-visible handle, following a `Pending` stage-1 result into its
/// stage-2 job. Pure read on every poll except the one-time base-cost
/// reconciliation on first observation of a terminal state.
pub struct StatusAggregator {
    job_store: Arc<dyn JobStore>,
    ledger: Arc<dyn Ledger>,
}

impl StatusAggregator {
    pub fn new(job_store: Arc<dyn JobStore>, ledger: Arc<dyn Ledger>) -> Self {
        Self { job_store, ledger }
    }

    pub async fn resolve(&self, job_id: JobId) -> Result<Option<StatusReport>, JobStoreError> {
        let Some(job) = self.job_store.get_extraction(job_id).await? else {
            return Ok(None);
        };

        let report = match job.state {
            QueueState::Queued | QueueState::Running | QueueState::Retrying => StatusReport {
                job_id,
                status: ClientStatus::Running,
                data: None,
                error: None,
                consumed_credits: 0,
            },
            QueueState::Failed => StatusReport {
                job_id,
                status: ClientStatus::Failed,
                data: None,
                error: Some(
                    job.error
                        .clone()
                        .unwrap_or_else(|| "extraction job failed".to_string()),
                ),
                consumed_credits: 0,
            },
            QueueState::Completed => match job.result.clone() {
                Some(StageOneResult::Success { content }) => {
                    self.settle_base(&job).await;
                    StatusReport {
                        job_id,
                        status: ClientStatus::Completed,
                        data: Some(content),
                        error: None,
                        consumed_credits: BASE_COST,
                    }
                }
                Some(StageOneResult::Failed { reason }) => StatusReport {
                    job_id,
                    status: ClientStatus::Failed,
                    data: None,
                    error: Some(reason),
                    consumed_credits: 0,
                },
                Some(StageOneResult::Pending {
                    stage_two,
                    partial_metadata,
                    base_cost,
                }) => {
                    self.resolve_stage_two(&job, stage_two, partial_metadata, base_cost)
                        .await?
                }
                // A completed job with no recorded result is a coordination
                // bug; never surface it as success.
                None => {
                    tracing::error!(job_id = %job_id, "Completed extraction job has no result");
                    internal_failure(job_id)
                }
            },
        };

        Ok(Some(report))
    }

    async fn resolve_stage_two(
        &self,
        job: &ExtractionJob,
        stage_two: JobHandle,
        partial_metadata: NormalizedContent,
        base_cost: u32,
    ) -> Result<StatusReport, JobStoreError> {
        let job_id = job.id;

        let Some(transcription) = self.job_store.get_transcription(stage_two.job_id).await? else {
            tracing::error!(
                job_id = %job_id,
                stage_two = %stage_two.job_id,
                "Pending extraction points at a missing transcription job"
            );
            return Ok(internal_failure(job_id));
        };

        let report = match transcription.state {
            QueueState::Queued | QueueState::Running | QueueState::Retrying => StatusReport {
                job_id,
                status: ClientStatus::Transcribing,
                data: None,
                error: None,
                consumed_credits: 0,
            },
            QueueState::Failed => {
                self.settle_base(job).await;
                StatusReport {
                    job_id,
                    status: ClientStatus::Failed,
                    data: Some(partial_metadata),
                    error: Some(
                        transcription
                            .error
                            .clone()
                            .unwrap_or_else(|| "transcription job failed".to_string()),
                    ),
                    consumed_credits: base_cost,
                }
            }
            QueueState::Completed => match transcription.result.clone() {
                Some(StageTwoResult::Success {
                    content,
                    realized_cost,
                }) => {
                    self.settle_base(job).await;
                    StatusReport {
                        job_id,
                        status: ClientStatus::Completed,
                        data: Some(content),
                        error: None,
                        consumed_credits: base_cost + realized_cost,
                    }
                }
                Some(StageTwoResult::Failed { reason }) => {
                    self.settle_base(job).await;
                    StatusReport {
                        job_id,
                        status: ClientStatus::Failed,
                        data: Some(partial_metadata),
                        error: Some(reason),
                        consumed_credits: base_cost,
                    }
                }
                None => {
                    tracing::error!(
                        stage_two = %stage_two.job_id,
                        "Completed transcription job has no result"
                    );
                    self.settle_base(job).await;
                    internal_failure(job_id)
                }
            },
        };

        Ok(report)
    }

    /// Charge the base (metadata) cost exactly once per job. The store's
    /// compare-and-set keeps repeated polls side-effect-free; the ledger's
    /// idempotency key is the backstop. A failed charge here is an
    /// operational alert, never a failed poll.
    async fn settle_base(&self, job: &ExtractionJob) {
        match self.job_store.try_settle(job.id).await {
            Ok(true) => {
                let idempotency_key = format!("{}:base", job.id);
                if let Err(e) = self
                    .ledger
                    .charge(job.request.account_id, BASE_COST, &idempotency_key)
                    .await
                {
                    tracing::error!(
                        job_id = %job.id,
                        error = %e,
                        "Base-cost reconciliation failed, needs out-of-band review"
                    );
                }
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(job_id = %job.id, error = %e, "Settlement flag update failed");
            }
        }
    }
}

fn internal_failure(job_id: JobId) -> StatusReport {
    StatusReport {
        job_id,
        status: ClientStatus::Failed,
        data: None,
        error: Some("internal error: job state could not be resolved".to_string()),
        consumed_credits: 0,
    }
}
