use serde::{Deserialize, Serialize};

use super::{JobHandle, NormalizedContent};

/// Outcome of the extraction stage, written exactly once by the worker that
/// executed it. `Pending` hands off to exactly one transcription job; the
/// status aggregator follows the embedded handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StageOneResult {
    Success {
        content: NormalizedContent,
    },
    Pending {
        stage_two: JobHandle,
        partial_metadata: NormalizedContent,
        base_cost: u32,
    },
    Failed {
        reason: String,
    },
}

/// Outcome of the transcription stage, written exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StageTwoResult {
    Success {
        content: NormalizedContent,
        realized_cost: u32,
    },
    Failed {
        reason: String,
    },
}
