use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use crate::application::ports::{JobStore, JobStoreError};
use crate::domain::{
    ExtractionJob, ExtractionRequest, JobId, NormalizedUrl, QueueState, StageOneResult,
    StageTwoResult, TranscriptionJob, TranscriptionJobSpec,
};

/// Postgres job store. Requests, specs, and stage results are stored as
/// JSONB payloads next to the queue-state columns, so the tagged result
/// unions round-trip without a bespoke schema per variant.
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn query_failed(e: impl std::fmt::Display) -> JobStoreError {
    JobStoreError::QueryFailed(e.to_string())
}

fn extraction_from_row(row: &PgRow) -> Result<ExtractionJob, JobStoreError> {
    let request: serde_json::Value = row.try_get("request").map_err(query_failed)?;
    let request: ExtractionRequest = serde_json::from_value(request).map_err(query_failed)?;

    let result: Option<serde_json::Value> = row.try_get("result").map_err(query_failed)?;
    let result: Option<StageOneResult> = result
        .map(serde_json::from_value)
        .transpose()
        .map_err(query_failed)?;

    let state: String = row.try_get("state").map_err(query_failed)?;
    let state = state.parse::<QueueState>().map_err(JobStoreError::QueryFailed)?;

    let id: uuid::Uuid = row.try_get("id").map_err(query_failed)?;
    let normalized_url: String = row.try_get("normalized_url").map_err(query_failed)?;
    let error: Option<String> = row.try_get("error").map_err(query_failed)?;
    let settled: bool = row.try_get("settled").map_err(query_failed)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(query_failed)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(query_failed)?;

    Ok(ExtractionJob {
        id: JobId::from_uuid(id),
        request,
        normalized_url: NormalizedUrl::from_raw(normalized_url),
        state,
        result,
        error,
        settled,
        created_at,
        updated_at,
    })
}

fn transcription_from_row(row: &PgRow) -> Result<TranscriptionJob, JobStoreError> {
    let spec: serde_json::Value = row.try_get("spec").map_err(query_failed)?;
    let spec: TranscriptionJobSpec = serde_json::from_value(spec).map_err(query_failed)?;

    let result: Option<serde_json::Value> = row.try_get("result").map_err(query_failed)?;
    let result: Option<StageTwoResult> = result
        .map(serde_json::from_value)
        .transpose()
        .map_err(query_failed)?;

    let state: String = row.try_get("state").map_err(query_failed)?;
    let state = state.parse::<QueueState>().map_err(JobStoreError::QueryFailed)?;

    let id: uuid::Uuid = row.try_get("id").map_err(query_failed)?;
    let error: Option<String> = row.try_get("error").map_err(query_failed)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(query_failed)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(query_failed)?;

    Ok(TranscriptionJob {
        id: JobId::from_uuid(id),
        spec,
        state,
        result,
        error,
        created_at,
        updated_at,
    })
}

#[async_trait]
impl JobStore for PgJobStore {
    #[instrument(skip(self, job), fields(job_id = %job.id))]
    async fn create_extraction(&self, job: &ExtractionJob) -> Result<(), JobStoreError> {
        let request = serde_json::to_value(&job.request).map_err(query_failed)?;

        sqlx::query(
            "INSERT INTO extraction_jobs \
             (id, normalized_url, request, state, error, settled, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(job.id.as_uuid())
        .bind(job.normalized_url.as_str())
        .bind(request)
        .bind(job.state.as_str())
        .bind(&job.error)
        .bind(job.settled)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(())
    }

    #[instrument(skip(self), fields(job_id = %id))]
    async fn get_extraction(&self, id: JobId) -> Result<Option<ExtractionJob>, JobStoreError> {
        let row = sqlx::query("SELECT * FROM extraction_jobs WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed)?;

        row.as_ref().map(extraction_from_row).transpose()
    }

    async fn find_active_extraction(
        &self,
        url: &NormalizedUrl,
    ) -> Result<Option<ExtractionJob>, JobStoreError> {
        let row = sqlx::query(
            "SELECT * FROM extraction_jobs \
             WHERE normalized_url = $1 AND state IN ('QUEUED', 'RUNNING', 'RETRYING') \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(url.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(query_failed)?;

        row.as_ref().map(extraction_from_row).transpose()
    }

    #[instrument(skip(self, error), fields(job_id = %id, state = %state))]
    async fn set_extraction_state(
        &self,
        id: JobId,
        state: QueueState,
        error: Option<&str>,
    ) -> Result<(), JobStoreError> {
        sqlx::query(
            "UPDATE extraction_jobs SET state = $1, error = $2, updated_at = $3 WHERE id = $4",
        )
        .bind(state.as_str())
        .bind(error)
        .bind(Utc::now())
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(())
    }

    #[instrument(skip(self, result), fields(job_id = %id))]
    async fn record_stage_one(
        &self,
        id: JobId,
        result: &StageOneResult,
    ) -> Result<(), JobStoreError> {
        let result = serde_json::to_value(result).map_err(query_failed)?;

        sqlx::query("UPDATE extraction_jobs SET result = $1, updated_at = $2 WHERE id = $3")
            .bind(result)
            .bind(Utc::now())
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(query_failed)?;

        Ok(())
    }

    async fn try_settle(&self, id: JobId) -> Result<bool, JobStoreError> {
        let updated = sqlx::query(
            "UPDATE extraction_jobs SET settled = TRUE, updated_at = $1 \
             WHERE id = $2 AND settled = FALSE",
        )
        .bind(Utc::now())
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(updated.rows_affected() == 1)
    }

    #[instrument(skip(self, job), fields(job_id = %job.id))]
    async fn create_transcription(&self, job: &TranscriptionJob) -> Result<(), JobStoreError> {
        let spec = serde_json::to_value(&job.spec).map_err(query_failed)?;

        sqlx::query(
            "INSERT INTO transcription_jobs \
             (id, spec, state, error, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(job.id.as_uuid())
        .bind(spec)
        .bind(job.state.as_str())
        .bind(&job.error)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(())
    }

    #[instrument(skip(self), fields(job_id = %id))]
    async fn get_transcription(
        &self,
        id: JobId,
    ) -> Result<Option<TranscriptionJob>, JobStoreError> {
        let row = sqlx::query("SELECT * FROM transcription_jobs WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_failed)?;

        row.as_ref().map(transcription_from_row).transpose()
    }

    #[instrument(skip(self, error), fields(job_id = %id, state = %state))]
    async fn set_transcription_state(
        &self,
        id: JobId,
        state: QueueState,
        error: Option<&str>,
    ) -> Result<(), JobStoreError> {
        sqlx::query(
            "UPDATE transcription_jobs SET state = $1, error = $2, updated_at = $3 WHERE id = $4",
        )
        .bind(state.as_str())
        .bind(error)
        .bind(Utc::now())
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(query_failed)?;

        Ok(())
    }

    #[instrument(skip(self, result), fields(job_id = %id))]
    async fn record_stage_two(
        &self,
        id: JobId,
        result: &StageTwoResult,
    ) -> Result<(), JobStoreError> {
        let result = serde_json::to_value(result).map_err(query_failed)?;

        sqlx::query("UPDATE transcription_jobs SET result = $1, updated_at = $2 WHERE id = $3")
            .bind(result)
            .bind(Utc::now())
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(query_failed)?;

        Ok(())
    }
}
