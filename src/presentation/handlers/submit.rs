use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::services::{SubmitError, SubmitOutcome};
use crate::domain::{AccountId, NormalizedContent};
use crate::infrastructure::observability::RequestId;
use crate::presentation::state::AppState;

#[derive(Deserialize)]
pub struct SubmitRequest {
    pub url: String,
    #[serde(default)]
    pub extract_transcript: bool,
    #[serde(default)]
    pub include_comments: bool,
    pub account_id: Uuid,
}

#[derive(Serialize)]
pub struct SubmitResponse {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<NormalizedContent>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Submit a URL for extraction. A cache hit is answered inline with 200;
/// everything else gets a 202 and a job id to poll.
#[tracing::instrument(skip(state, body, request_id), fields(request_id = %request_id.0))]
pub async fn submit_handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<SubmitRequest>,
) -> impl IntoResponse {
    let outcome = state
        .submission
        .submit(
            &body.url,
            body.extract_transcript,
            body.include_comments,
            AccountId::from_uuid(body.account_id),
            request_id.0.clone(),
        )
        .await;

    match outcome {
        Ok(SubmitOutcome::CachedContent(content)) => (
            StatusCode::OK,
            Json(SubmitResponse {
                code: 200,
                message: "content served from cache".to_string(),
                job_id: None,
                data: Some(content),
            }),
        )
            .into_response(),
        Ok(SubmitOutcome::Enqueued(handle)) => (
            StatusCode::ACCEPTED,
            Json(SubmitResponse {
                code: 202,
                message: "extraction job accepted".to_string(),
                job_id: Some(handle.job_id.to_string()),
                data: None,
            }),
        )
            .into_response(),
        Err(e @ (SubmitError::InvalidUrl(_) | SubmitError::UnsupportedPlatform(_))) => {
            tracing::warn!(error = %e, "Rejected submission");
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
        Err(e @ SubmitError::QueueUnavailable) => {
            tracing::error!(error = %e, "Extraction queue unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Submission failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
