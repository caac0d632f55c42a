use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    AccountId, ExtractionRequest, NormalizedContent, NormalizedUrl, QueueState, StageOneResult,
    StageTwoResult, StoragePath,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The client-visible name of a background job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JobHandle {
    pub job_id: JobId,
    pub created_at: DateTime<Utc>,
}

impl JobHandle {
    pub fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            created_at: Utc::now(),
        }
    }
}

/// Record of one extraction (stage-1) job. `settled` guards the one-time
/// base-cost reconciliation performed on first observation of a terminal
/// state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionJob {
    pub id: JobId,
    pub request: ExtractionRequest,
    pub normalized_url: NormalizedUrl,
    pub state: QueueState,
    pub result: Option<StageOneResult>,
    pub error: Option<String>,
    pub settled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExtractionJob {
    pub fn new(request: ExtractionRequest, normalized_url: NormalizedUrl) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            request,
            normalized_url,
            state: QueueState::Queued,
            result: None,
            error: None,
            settled: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn handle(&self) -> JobHandle {
        JobHandle {
            job_id: self.id,
            created_at: self.created_at,
        }
    }
}

/// Everything the transcription stage needs, assembled by stage-1 at
/// dispatch time. `audio_path` lives in the storage namespace shared by
/// both stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionJobSpec {
    pub audio_path: StoragePath,
    pub metadata: NormalizedContent,
    pub normalized_url: NormalizedUrl,
    pub account_id: AccountId,
    pub trace_id: String,
}

/// Record of one transcription (stage-2) job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionJob {
    pub id: JobId,
    pub spec: TranscriptionJobSpec,
    pub state: QueueState,
    pub result: Option<StageTwoResult>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TranscriptionJob {
    pub fn new(spec: TranscriptionJobSpec) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            spec,
            state: QueueState::Queued,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn handle(&self) -> JobHandle {
        JobHandle {
            job_id: self.id,
            created_at: self.created_at,
        }
    }
}
