use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::application::services::ClientStatus;
use crate::domain::{JobId, NormalizedContent};
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct StatusResponse {
    pub code: u16,
    pub message: String,
    pub job_id: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<NormalizedContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub consumed_credits: u32,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Poll one client-visible job handle. Non-terminal states answer 202 with
/// no payload; terminal states answer 200 whether the job succeeded or
/// failed.
#[tracing::instrument(skip(state))]
pub async fn status_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> impl IntoResponse {
    let uuid = match Uuid::parse_str(&job_id) {
        Ok(u) => u,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("Invalid job ID: {}", job_id),
                }),
            )
                .into_response();
        }
    };

    let report = match state.aggregator.resolve(JobId::from_uuid(uuid)).await {
        Ok(Some(report)) => report,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("Job not found: {}", job_id),
                }),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to resolve job status");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to resolve job: {}", e),
                }),
            )
                .into_response();
        }
    };

    let (http_status, code, message) = match report.status {
        ClientStatus::Running => (StatusCode::ACCEPTED, 202, "job is running".to_string()),
        ClientStatus::Transcribing => (
            StatusCode::ACCEPTED,
            202,
            "speech transcription in progress".to_string(),
        ),
        ClientStatus::Completed => (StatusCode::OK, 200, "extraction completed".to_string()),
        ClientStatus::Failed => (
            StatusCode::OK,
            500,
            report
                .error
                .clone()
                .unwrap_or_else(|| "job failed".to_string()),
        ),
    };

    let body = StatusResponse {
        code,
        message,
        job_id: report.job_id.to_string(),
        status: report.status.as_str(),
        // In-flight polls stay payload-free; the client keeps polling.
        data: if report.status == ClientStatus::Running
            || report.status == ClientStatus::Transcribing
        {
            None
        } else {
            report.data
        },
        error: report.error,
        consumed_credits: report.consumed_credits,
    };

    (http_status, Json(body)).into_response()
}
