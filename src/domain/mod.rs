mod content;
mod cost;
mod job;
mod media_metadata;
mod normalized_url;
mod platform;
mod queue_state;
mod request;
mod stage_result;
mod storage_path;

pub use content::{hashtags_from, AuthorInfo, ContentStats, MediaInfo, NormalizedContent};
pub use cost::{estimate_cost, realized_cost, BASE_COST};
pub use job::{ExtractionJob, JobHandle, JobId, TranscriptionJob, TranscriptionJobSpec};
pub use media_metadata::{published_at_from_epoch, MediaMetadata, MediaType};
pub use normalized_url::{NormalizedUrl, UrlError};
pub use platform::Platform;
pub use queue_state::QueueState;
pub use request::{AccountId, ExtractionRequest};
pub use stage_result::{StageOneResult, StageTwoResult};
pub use storage_path::StoragePath;
